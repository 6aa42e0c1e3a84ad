//! Credential store adapter
//!
//! Pairs an injected `CredentialStore` with the password digester so the
//! engine never handles digests or storage records directly.

use std::sync::Arc;

use crate::auth::password::PasswordDigester;
use crate::auth::role::{Role, RoleSet};
use crate::error::Result;
use crate::storage::traits::{CredentialStore, Identity, NewIdentity};

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: Option<String>,
}

pub struct CredentialAdapter {
    store: Arc<dyn CredentialStore>,
    digester: PasswordDigester,
    // Verified against when a username misses, so lookups of unknown users
    // cost the same as a wrong password
    decoy_digest: String,
}

impl CredentialAdapter {
    pub fn new(store: Arc<dyn CredentialStore>, digester: PasswordDigester) -> Result<Self> {
        let decoy_digest = digester.digest(&uuid::Uuid::new_v4().to_string())?;
        Ok(Self {
            store,
            digester,
            decoy_digest,
        })
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Identity>> {
        self.store.find_by_username(username).await
    }

    pub fn verify_password(&self, identity: &Identity, plaintext: &str) -> bool {
        self.digester.verify(plaintext, &identity.password_digest)
    }

    /// Burn one verification against a throwaway digest
    pub fn verify_decoy(&self, plaintext: &str) {
        let _ = self.digester.verify(plaintext, &self.decoy_digest);
    }

    pub async fn roles_of(&self, identity: &Identity) -> Result<RoleSet> {
        self.store.roles_of(identity.id).await
    }

    /// Digest the password and persist the identity with its role.
    ///
    /// Uniqueness is left to the store so concurrent creates of one username
    /// cannot both succeed.
    pub async fn create(&self, account: NewAccount, role: Role) -> Result<Identity> {
        let password_digest = self.digester.digest(&account.password)?;
        let identity = NewIdentity {
            username: account.username,
            password_digest,
            display_name: account.display_name,
            email: account.email,
        };
        self.store.create(identity, role).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.store.username_exists(username).await
    }

    pub async fn identity_count(&self) -> Result<usize> {
        self.store.identity_count().await
    }
}

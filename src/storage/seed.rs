//! Demo account seeding for fresh stores

use crate::auth::credentials::{CredentialAdapter, NewAccount};
use crate::auth::role::Role;
use crate::error::Result;

/// Username, display name and role of each demo account
pub const DEMO_ACCOUNTS: [(&str, &str, Role); 3] = [
    ("s001", "Demo Student", Role::Student),
    ("t001", "Demo Teacher", Role::Teacher),
    ("admin", "Administrator", Role::Admin),
];

/// Create the demo accounts if the store holds no identities yet.
///
/// Returns how many accounts were created.
pub async fn seed_demo_accounts(credentials: &CredentialAdapter, password: &str) -> Result<usize> {
    if credentials.identity_count().await? > 0 {
        log::debug!("Identity store not empty, skipping demo seed");
        return Ok(0);
    }

    let mut created = 0;
    for (username, display_name, role) in DEMO_ACCOUNTS {
        let account = NewAccount {
            username: username.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            email: None,
        };
        credentials.create(account, role).await?;
        created += 1;
    }

    log::info!("Seeded {} demo accounts", created);
    Ok(created)
}

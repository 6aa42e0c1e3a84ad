//! Session and authorization engine
//!
//! Turns verified credentials into signed session principals and answers
//! access questions for the routing layer. Never touches HTTP: callers get a
//! signed token back and decide how to hand it to the client.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::credentials::{CredentialAdapter, NewAccount};
use crate::auth::password::PasswordDigester;
use crate::auth::role::{Role, RoleSet};
use crate::auth::session::{self, Principal, Session};
use crate::auth::token::SessionTokenManager;
use crate::error::{Result, RosterError};
use crate::security::timing::AuthTimer;
use crate::security_logger::{log_security_event, SecurityEvent};
use crate::storage::traits::{CredentialStore, Identity};

/// Registration form fields as submitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub role: String,
    pub name: String,
    pub email: Option<String>,
}

/// Result of a successful login or registration
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub principal: Principal,
    /// Signed payload for the session cookie
    pub token: String,
}

pub struct AuthEngine {
    credentials: CredentialAdapter,
    tokens: SessionTokenManager,
    auth_floor: Duration,
}

impl AuthEngine {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        digester: PasswordDigester,
        tokens: SessionTokenManager,
    ) -> Result<Self> {
        Ok(Self {
            credentials: CredentialAdapter::new(store, digester)?,
            tokens,
            auth_floor: Duration::ZERO,
        })
    }

    /// Minimum time every login attempt takes
    pub fn with_auth_floor(mut self, floor: Duration) -> Self {
        self.auth_floor = floor;
        self
    }

    pub fn credentials(&self) -> &CredentialAdapter {
        &self.credentials
    }

    pub fn session_lifetime(&self) -> Duration {
        self.tokens.lifetime()
    }

    /// Check a username/password pair and issue a session.
    ///
    /// Unknown users and wrong passwords produce the same error after the
    /// same amount of work.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(RosterError::EmptyCredentials);
        }

        let timer = AuthTimer::new(self.auth_floor);
        let outcome = self.check_credentials(username, password).await;
        timer.wait().await;

        match outcome {
            Ok(Some(identity)) => {
                let issued = self.issue_for(&identity).await?;
                log_security_event(SecurityEvent::AuthenticationSuccess {
                    username: identity.username,
                })
                .await;
                Ok(issued)
            }
            Ok(None) => {
                log_security_event(SecurityEvent::AuthenticationFailed {
                    username: username.to_string(),
                    reason: "invalid credentials".to_string(),
                })
                .await;
                Err(RosterError::InvalidCredentials)
            }
            Err(e) => Err(e),
        }
    }

    async fn check_credentials(&self, username: &str, password: &str) -> Result<Option<Identity>> {
        match self.credentials.find_by_username(username).await? {
            Some(identity) if self.credentials.verify_password(&identity, password) => {
                Ok(Some(identity))
            }
            Some(_) => Ok(None),
            None => {
                self.credentials.verify_decoy(password);
                Ok(None)
            }
        }
    }

    /// Create an account with one role and log it in
    pub async fn register(&self, registration: Registration) -> Result<IssuedSession> {
        let Registration {
            username,
            password,
            role,
            name,
            email,
        } = registration;

        if username.trim().is_empty() {
            return Err(RosterError::MissingRequiredField("username"));
        }
        if password.is_empty() {
            return Err(RosterError::MissingRequiredField("password"));
        }
        if role.trim().is_empty() {
            return Err(RosterError::MissingRequiredField("role"));
        }
        if name.trim().is_empty() {
            return Err(RosterError::MissingRequiredField("name"));
        }
        let role: Role = role.parse()?;

        // Skips digest work for the common case; the store still enforces
        // uniqueness for concurrent registrations.
        if self.credentials.username_exists(&username).await? {
            log_security_event(SecurityEvent::RegistrationRejected {
                username: username.clone(),
                reason: "duplicate username".to_string(),
            })
            .await;
            return Err(RosterError::DuplicateUsername(username));
        }

        let account = NewAccount {
            username: username.clone(),
            password,
            display_name: name.trim().to_string(),
            email: email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        };

        let identity = match self.credentials.create(account, role).await {
            Ok(identity) => identity,
            Err(e) => {
                if let RosterError::DuplicateUsername(_) = e {
                    log_security_event(SecurityEvent::RegistrationRejected {
                        username,
                        reason: "duplicate username".to_string(),
                    })
                    .await;
                }
                return Err(e);
            }
        };

        log_security_event(SecurityEvent::RegistrationAccepted {
            username: identity.username.clone(),
            role: role.to_string(),
        })
        .await;

        self.issue_for(&identity).await
    }

    async fn issue_for(&self, identity: &Identity) -> Result<IssuedSession> {
        let roles = self.credentials.roles_of(identity).await?;
        let principal = Principal::new(identity.username.clone(), roles);
        let token = self.tokens.issue(&principal)?;
        Ok(IssuedSession { principal, token })
    }

    /// End a session. Always yields `Anonymous`; ending an anonymous session
    /// is a no-op.
    pub async fn logout(&self, session: Session) -> Session {
        if let Session::Authenticated(principal) = session {
            log_security_event(SecurityEvent::SessionEnded {
                username: Some(principal.username().to_string()),
            })
            .await;
        }
        Session::Anonymous
    }

    /// Role-set intersection check; see `session::authorize`
    pub fn authorize(&self, session: &Session, required: &RoleSet) -> bool {
        session::authorize(session, required)
    }

    /// Whether a username is free. Blank names are never available.
    pub async fn username_available(&self, username: &str) -> Result<bool> {
        if username.trim().is_empty() {
            return Ok(false);
        }
        Ok(!self.credentials.username_exists(username).await?)
    }

    /// Rebuild the session a client presented. Missing, forged or expired
    /// tokens give `Anonymous`.
    pub async fn resolve(&self, token: Option<&str>) -> Session {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Session::Anonymous;
        };

        match self.tokens.verify(token) {
            Ok(principal) => Session::Authenticated(principal),
            Err(e) => {
                log_security_event(SecurityEvent::SessionRejected {
                    reason: e.to_string(),
                })
                .await;
                Session::Anonymous
            }
        }
    }
}

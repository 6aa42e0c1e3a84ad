use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::role::{Role, RoleSet};
use crate::auth::session::Principal;
use crate::error::{Result, RosterError};

/// Signed claim set carried in the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (username)
    pub sub: String,
    /// Roles held when the session was issued
    pub roles: Vec<Role>,
    /// Expiration time (as UTC timestamp)
    pub exp: u64,
    /// Issued at (as UTC timestamp)
    pub iat: u64,
    /// Not before (as UTC timestamp)
    pub nbf: u64,
    /// Unique token id, useful for correlating log lines
    pub jti: String,
}

impl SessionClaims {
    /// Creates claims for a principal valid for `lifetime` from now
    pub fn for_principal(principal: &Principal, lifetime: Duration) -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        Self {
            sub: principal.username().to_string(),
            roles: principal.roles().iter().copied().collect(),
            exp: now.saturating_add(lifetime.as_secs()),
            iat: now,
            nbf: now,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check if the claims are expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp().max(0) as u64 > self.exp
    }

    pub fn into_principal(self) -> Principal {
        let roles: RoleSet = self.roles.into_iter().collect();
        Principal::new(self.sub, roles)
    }
}

/// Signs and verifies session cookie payloads (HS256)
pub struct SessionTokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl SessionTokenManager {
    /// Creates a token manager from the session secret
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    /// How long an issued session stays valid
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Signs a session payload for the principal
    pub fn issue(&self, principal: &Principal) -> Result<String> {
        let claims = SessionClaims::for_principal(principal, self.lifetime);
        self.sign(&claims)
    }

    /// Signs arbitrary claims
    pub fn sign(&self, claims: &SessionClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| RosterError::InvalidSession(format!("Failed to sign session: {}", e)))
    }

    /// Validates signature and lifetime and returns the claims
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| RosterError::InvalidSession(format!("Invalid session token: {}", e)))?;

        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(RosterError::InvalidSession("Empty subject".to_string()));
        }
        if claims.is_expired() {
            return Err(RosterError::InvalidSession("Session expired".to_string()));
        }
        Ok(claims)
    }

    /// Validates a token and rebuilds the principal it carries
    pub fn verify(&self, token: &str) -> Result<Principal> {
        Ok(self.validate(token)?.into_principal())
    }
}

//! Session principal and the role intersection check

use serde::{Deserialize, Serialize};

use crate::auth::role::{Role, RoleSet};

/// Authenticated identity's claim bundle
///
/// Immutable once built: the engine constructs it after a successful login
/// or registration and the transport layer only carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    username: String,
    roles: RoleSet,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: RoleSet) -> Self {
        Self {
            username: username.into(),
            roles,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Request-scoped authentication state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Session {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(principal) => Some(principal),
        }
    }

    /// Identifier CSRF tokens are bound to
    pub fn binding_id(&self) -> String {
        match self {
            Session::Anonymous => crate::constants::ANONYMOUS_SESSION_ID.to_string(),
            Session::Authenticated(principal) => format!("user:{}", principal.username()),
        }
    }
}

impl From<Principal> for Session {
    fn from(principal: Principal) -> Self {
        Session::Authenticated(principal)
    }
}

/// Decide whether `session` may perform an action guarded by `required`.
///
/// Anonymous sessions are always refused. An empty `required` set admits any
/// authenticated principal; otherwise the principal needs at least one of
/// the required roles.
pub fn authorize(session: &Session, required: &RoleSet) -> bool {
    match session {
        Session::Anonymous => false,
        Session::Authenticated(principal) => {
            required.is_empty() || !principal.roles().is_disjoint(required)
        }
    }
}

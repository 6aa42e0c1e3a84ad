//! Authentication and authorization module

pub mod credentials;
pub mod engine;
pub mod password;
pub mod role;
pub mod session;
pub mod token;

// Re-export main components
pub use credentials::{CredentialAdapter, NewAccount};
pub use engine::{AuthEngine, IssuedSession, Registration};
pub use password::{DigestParams, PasswordDigester};
pub use role::{Action, Role, RoleSet};
pub use session::{authorize, Principal, Session};
pub use token::{SessionClaims, SessionTokenManager};

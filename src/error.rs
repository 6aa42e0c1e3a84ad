use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    // Authentication errors
    EmptyCredentials,
    InvalidCredentials,

    // Registration errors
    MissingRequiredField(&'static str),
    DuplicateUsername(String),
    InvalidRole(String),

    // Session and access errors
    InvalidSession(String),
    Unauthorized,
    Forbidden,

    // Roster errors
    StudentNotFound(u64),
    ValidationError(String),

    // Storage errors
    StoreUnavailable(String),

    // Security errors
    DigestError(String),
    CsrfError(String),

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCredentials => write!(f, "Username and password must not be empty"),
            Self::InvalidCredentials => write!(f, "Invalid username or password"),
            Self::MissingRequiredField(field) => write!(f, "Missing required field: {}", field),
            Self::DuplicateUsername(name) => write!(f, "Username already exists: {}", name),
            Self::InvalidRole(role) => write!(f, "Unknown role: {}", role),
            Self::InvalidSession(msg) => write!(f, "Invalid session: {}", msg),
            Self::Unauthorized => write!(f, "Authentication required"),
            Self::Forbidden => write!(f, "Forbidden: insufficient role"),
            Self::StudentNotFound(id) => write!(f, "Student not found: {}", id),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Self::DigestError(msg) => write!(f, "Password digest error: {}", msg),
            Self::CsrfError(msg) => write!(f, "CSRF validation failed: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for RosterError {}

impl warp::reject::Reject for RosterError {}

// Generic result type for the roster service
pub type Result<T> = std::result::Result<T, RosterError>;

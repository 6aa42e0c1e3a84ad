// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;

// Session constants
pub const SESSION_COOKIE: &str = "roster_session";
pub const DEFAULT_SESSION_HOURS: u64 = 8;
pub const MAX_SESSION_HOURS: u64 = 24 * 30;
pub const ANONYMOUS_SESSION_ID: &str = "anonymous";
pub const CSRF_HEADER: &str = "x-csrf-token";

// Roster paging
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

// Argon2id parameters for newly created digests (OWASP baseline)
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 1;

// Minimum wall time for a login attempt
pub const AUTH_FLOOR_MILLIS: u64 = 100;

// Request body limit for JSON endpoints
pub const MAX_BODY_BYTES: u64 = 16 * 1024;

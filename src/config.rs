//! Server configuration module
//! Loads service settings from `STUDENT_ROSTER_*` environment variables

use crate::auth::password::DigestParams;
use crate::constants::{
    DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB, DEFAULT_ARGON2_PARALLELISM,
    DEFAULT_HOST, DEFAULT_PAGE_SIZE, DEFAULT_PORT, DEFAULT_SESSION_HOURS, MAX_PAGE_SIZE,
    MAX_SESSION_HOURS,
};
use crate::error::{Result, RosterError};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Secret signing session cookies
    pub session_secret: String,
    /// Secret signing CSRF tokens (must differ from the session secret)
    pub csrf_secret: String,
    /// How long an issued session cookie stays valid
    pub session_lifetime: Duration,
    /// Development mode (enables localhost origins)
    pub development_mode: bool,
    /// Mark session cookies `Secure`
    pub secure_cookies: bool,
    /// Origins allowed to send state-changing requests
    pub allowed_origins: Vec<String>,
    /// Page size used when a listing does not ask for one
    pub default_page_size: usize,
    /// Argon2id cost for newly created password digests
    pub digest_params: DigestParams,
    /// Create demo accounts in an empty store at startup
    pub seed_demo_accounts: bool,
    pub seed_password: Option<String>,
    /// TLS configuration
    pub enable_tls: bool,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        panic!("ServerConfig::default() is not allowed for security reasons. Use ServerConfig::from_env() instead.");
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
        .unwrap_or(default)
}

impl ServerConfig {
    /// Create a test configuration - DANGEROUS: Only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_secret: "test-session-key-only-for-unit-tests-never-in-production".to_string(),
            csrf_secret: "test-csrf-key-only-for-unit-tests-never-in-production".to_string(),
            session_lifetime: Duration::from_secs(DEFAULT_SESSION_HOURS * 3600),
            development_mode: true,
            secure_cookies: false,
            allowed_origins: Vec::new(),
            default_page_size: DEFAULT_PAGE_SIZE,
            digest_params: DigestParams::minimal(),
            seed_demo_accounts: false,
            seed_password: None,
            enable_tls: false,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }

    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str, secret_type: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(RosterError::ConfigError(format!(
                "{} secret must be at least 32 characters long",
                secret_type
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "changeme",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        let lowered = secret.to_lowercase();
        for pattern in &insecure_patterns {
            if lowered.contains(pattern) {
                return Err(RosterError::ConfigError(format!(
                    "{} secret contains insecure pattern '{}'. Generate one with: openssl rand -base64 32",
                    secret_type, pattern
                )));
            }
        }

        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RosterError::ConfigError(format!(
                "{} secret should contain mixed characters (letters, numbers, symbols)",
                secret_type
            )));
        }

        Ok(())
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("STUDENT_ROSTER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(lookup("STUDENT_ROSTER_PORT"), DEFAULT_PORT);

        let session_secret = lookup("STUDENT_ROSTER_SESSION_SECRET").ok_or_else(|| {
            RosterError::ConfigError(
                "STUDENT_ROSTER_SESSION_SECRET environment variable is required. \
                 Generate one with: openssl rand -base64 32"
                    .to_string(),
            )
        })?;

        let csrf_secret = lookup("STUDENT_ROSTER_CSRF_SECRET").ok_or_else(|| {
            RosterError::ConfigError(
                "STUDENT_ROSTER_CSRF_SECRET environment variable is required. \
                 Generate one with: openssl rand -base64 32 \
                 NOTE: it must be different from the session secret."
                    .to_string(),
            )
        })?;

        let session_hours = parse_or(lookup("STUDENT_ROSTER_SESSION_HOURS"), DEFAULT_SESSION_HOURS);
        if session_hours == 0 {
            return Err(RosterError::ConfigError(
                "STUDENT_ROSTER_SESSION_HOURS must be at least 1".to_string(),
            ));
        }
        if session_hours > MAX_SESSION_HOURS {
            return Err(RosterError::ConfigError(format!(
                "STUDENT_ROSTER_SESSION_HOURS must be at most {}",
                MAX_SESSION_HOURS
            )));
        }

        let development_mode = parse_flag(lookup("STUDENT_ROSTER_DEVELOPMENT_MODE"), false);
        let secure_cookies = parse_flag(lookup("STUDENT_ROSTER_SECURE_COOKIES"), !development_mode);

        let allowed_origins = lookup("STUDENT_ROSTER_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let default_page_size = parse_or(lookup("STUDENT_ROSTER_PAGE_SIZE"), DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let digest_params = DigestParams {
            memory_kib: parse_or(lookup("STUDENT_ROSTER_ARGON2_MEMORY_KIB"), DEFAULT_ARGON2_MEMORY_KIB),
            iterations: parse_or(lookup("STUDENT_ROSTER_ARGON2_ITERATIONS"), DEFAULT_ARGON2_ITERATIONS),
            parallelism: parse_or(
                lookup("STUDENT_ROSTER_ARGON2_PARALLELISM"),
                DEFAULT_ARGON2_PARALLELISM,
            ),
        };

        let seed_demo_accounts = parse_flag(lookup("STUDENT_ROSTER_SEED_DEMO"), false);
        let seed_password = lookup("STUDENT_ROSTER_SEED_PASSWORD").filter(|p| !p.is_empty());
        if seed_demo_accounts && seed_password.is_none() {
            return Err(RosterError::ConfigError(
                "STUDENT_ROSTER_SEED_DEMO is enabled but STUDENT_ROSTER_SEED_PASSWORD is not set"
                    .to_string(),
            ));
        }

        // TLS configuration
        let enable_tls = parse_flag(lookup("STUDENT_ROSTER_ENABLE_TLS"), false);
        let tls_cert_path = lookup("STUDENT_ROSTER_TLS_CERT_PATH");
        let tls_key_path = lookup("STUDENT_ROSTER_TLS_KEY_PATH");

        if enable_tls {
            match (&tls_cert_path, &tls_key_path) {
                (Some(cert_path), Some(key_path)) => {
                    if !std::path::Path::new(cert_path).exists() {
                        return Err(RosterError::ConfigError(format!(
                            "TLS certificate file does not exist: {}",
                            cert_path
                        )));
                    }
                    if !std::path::Path::new(key_path).exists() {
                        return Err(RosterError::ConfigError(format!(
                            "TLS private key file does not exist: {}",
                            key_path
                        )));
                    }
                }
                _ => {
                    return Err(RosterError::ConfigError(
                        "TLS is enabled but STUDENT_ROSTER_TLS_CERT_PATH or STUDENT_ROSTER_TLS_KEY_PATH is not set"
                            .to_string(),
                    ))
                }
            }
        }

        Self::validate_secret(&session_secret, "Session")?;
        Self::validate_secret(&csrf_secret, "CSRF")?;
        if session_secret == csrf_secret {
            return Err(RosterError::ConfigError(
                "Session and CSRF secrets must be different".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            session_secret,
            csrf_secret,
            session_lifetime: Duration::from_secs(session_hours * 3600),
            development_mode,
            secure_cookies,
            allowed_origins,
            default_page_size,
            digest_params,
            seed_demo_accounts,
            seed_password,
            enable_tls,
            tls_cert_path,
            tls_key_path,
        })
    }
}

//! CSRF (Cross-Site Request Forgery) Protection
//!
//! State-changing requests must pass two checks:
//!
//! 1. Origin (or, failing that, Referer) header validation
//! 2. A signed, expiring CSRF token bound to the caller's session, sent in
//!    the `X-CSRF-Token` header

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use warp::http::{HeaderMap, Method};

use crate::constants::CSRF_HEADER;
use crate::error::{Result, RosterError};
use crate::security::timing::{constant_time_eq, constant_time_eq_bytes};
use crate::security_logger::{log_security_event, SecurityEvent};

type HmacSha256 = Hmac<Sha256>;

/// Result of CSRF validation
#[derive(Debug, Clone, PartialEq)]
pub enum CSRFValidationResult {
    /// Request is valid and should be allowed
    Valid,
    /// Request has invalid origin
    InvalidOrigin(String),
    /// Request has invalid CSRF token
    InvalidToken(String),
    /// Request has invalid referer
    InvalidReferer(String),
    /// Request is missing required headers
    MissingHeaders(String),
}

impl CSRFValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, CSRFValidationResult::Valid)
    }

    fn reason(&self) -> String {
        match self {
            CSRFValidationResult::Valid => "valid".to_string(),
            CSRFValidationResult::InvalidOrigin(msg)
            | CSRFValidationResult::InvalidToken(msg)
            | CSRFValidationResult::InvalidReferer(msg)
            | CSRFValidationResult::MissingHeaders(msg) => msg.clone(),
        }
    }
}

/// CSRF Protection configuration and validator
pub struct CSRFProtection {
    /// Origins allowed to send state-changing requests
    allowed_origins: HashSet<String>,
    /// Development mode flag (allows localhost origins)
    development_mode: bool,
    /// CSRF token secret for signing
    token_secret: String,
    /// Token validity duration in seconds
    token_validity_seconds: u64,
}

impl CSRFProtection {
    pub fn new(allowed_origins: Vec<String>, development_mode: bool, token_secret: String) -> Self {
        Self {
            allowed_origins: allowed_origins.into_iter().collect(),
            development_mode,
            token_secret,
            token_validity_seconds: 3600, // 1 hour default
        }
    }

    pub fn with_token_validity(mut self, seconds: u64) -> Self {
        self.token_validity_seconds = seconds;
        self
    }

    /// Only state-changing methods are checked
    pub fn requires_check(method: &Method) -> bool {
        matches!(
            *method,
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH
        )
    }

    /// Validate request headers of a state-changing request
    pub fn validate_http_request(&self, headers: &HeaderMap, method: &Method) -> CSRFValidationResult {
        if !Self::requires_check(method) {
            return CSRFValidationResult::Valid;
        }

        let origin = headers.get("origin").and_then(|h| h.to_str().ok());
        if let Some(origin_value) = origin {
            if self.is_origin_allowed(origin_value) {
                return CSRFValidationResult::Valid;
            }
            return CSRFValidationResult::InvalidOrigin(format!(
                "Origin '{}' not allowed",
                origin_value
            ));
        }

        // Some clients omit Origin on same-origin requests; fall back to Referer
        match headers.get("referer").and_then(|h| h.to_str().ok()) {
            Some(referer) if self.is_referer_allowed(referer) => CSRFValidationResult::Valid,
            Some(referer) => {
                CSRFValidationResult::InvalidReferer(format!("Referer '{}' not allowed", referer))
            }
            None => CSRFValidationResult::MissingHeaders(
                "Missing Origin and Referer headers".to_string(),
            ),
        }
    }

    fn is_origin_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        if self.allowed_origins.contains(origin) {
            return true;
        }

        // Development mode: allow localhost origins if no explicit origins configured
        if self.development_mode && self.allowed_origins.is_empty() && is_localhost_origin(origin) {
            log::debug!("Development mode: allowing localhost origin: {}", origin);
            return true;
        }

        false
    }

    /// Check if referer is from an allowed origin
    fn is_referer_allowed(&self, referer: &str) -> bool {
        let Ok(url) = url::Url::parse(referer) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };

        let origin = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };
        self.is_origin_allowed(&origin)
    }

    fn sign(&self, payload: &str) -> Option<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(self.token_secret.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        Some(mac.finalize().into_bytes().to_vec())
    }

    /// Generate a CSRF token for a specific session
    pub fn generate_csrf_token(&self, session_id: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let nonce: u64 = rand::thread_rng().gen();

        // Token payload: session_id|timestamp|nonce
        let payload = format!("{}|{}|{}", session_id, timestamp, nonce);
        let signature = self.sign(&payload).unwrap_or_default();

        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Validate a CSRF token against the session it should be bound to
    pub fn validate_csrf_token(&self, token: &str, session_id: &str) -> CSRFValidationResult {
        let Some((encoded_payload, encoded_signature)) = token.split_once('.') else {
            return CSRFValidationResult::InvalidToken("Malformed token".to_string());
        };

        let payload = match URL_SAFE_NO_PAD
            .decode(encoded_payload)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(payload) => payload,
            None => return CSRFValidationResult::InvalidToken("Invalid payload encoding".to_string()),
        };

        let Ok(signature) = URL_SAFE_NO_PAD.decode(encoded_signature) else {
            return CSRFValidationResult::InvalidToken("Invalid signature encoding".to_string());
        };

        let Some(expected) = self.sign(&payload) else {
            return CSRFValidationResult::InvalidToken("Invalid signature".to_string());
        };
        if !constant_time_eq_bytes(&signature, &expected) {
            return CSRFValidationResult::InvalidToken("Invalid signature".to_string());
        }

        // Parse from the right so session ids may contain '|'
        let mut parts = payload.rsplitn(3, '|');
        let (_nonce, timestamp, token_session_id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(nonce), Some(timestamp), Some(session)) => (nonce, timestamp, session),
            _ => return CSRFValidationResult::InvalidToken("Invalid payload structure".to_string()),
        };

        if !constant_time_eq(token_session_id, session_id) {
            return CSRFValidationResult::InvalidToken("Session mismatch".to_string());
        }

        let Ok(timestamp) = timestamp.parse::<u64>() else {
            return CSRFValidationResult::InvalidToken("Invalid timestamp".to_string());
        };
        let current_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if current_time > timestamp.saturating_add(self.token_validity_seconds) {
            return CSRFValidationResult::InvalidToken("Token expired".to_string());
        }

        CSRFValidationResult::Valid
    }

    /// Run both checks for a request and log failures
    pub async fn check_request(
        &self,
        method: &Method,
        headers: &HeaderMap,
        session_id: &str,
    ) -> Result<()> {
        if !Self::requires_check(method) {
            return Ok(());
        }

        let mut result = self.validate_http_request(headers, method);
        if result.is_valid() {
            result = match headers.get(CSRF_HEADER).and_then(|h| h.to_str().ok()) {
                Some(token) => self.validate_csrf_token(token, session_id),
                None => CSRFValidationResult::MissingHeaders("Missing CSRF token".to_string()),
            };
        }

        if result.is_valid() {
            return Ok(());
        }

        let reason = result.reason();
        log_security_event(SecurityEvent::CSRFAttempt {
            session: session_id.to_string(),
            reason: reason.clone(),
        })
        .await;
        Err(RosterError::CsrfError(reason))
    }
}

fn is_localhost_origin(origin: &str) -> bool {
    ["http://localhost", "https://localhost", "http://127.0.0.1", "https://127.0.0.1", "http://[::1]", "https://[::1]"]
        .iter()
        .any(|prefix| {
            origin == *prefix
                || origin
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with(':'))
        })
}

//! Tests for session and CSRF secret handling

use std::collections::HashMap;
use std::time::Duration;

use student_roster::config::ServerConfig;
use student_roster::error::RosterError;

const SESSION_KEY: &str = "k3y-for-signing-sessions-a9f0c7e2b4d6";
const CSRF_KEY: &str = "k3y-for-signing-forms-71e3b8d0f5a2c9";

fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, RosterError> {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ServerConfig::from_lookup(|key| env.get(key).cloned())
}

fn with_secrets(extra: &[(&str, &str)]) -> Result<ServerConfig, RosterError> {
    let mut pairs = vec![
        ("STUDENT_ROSTER_SESSION_SECRET", SESSION_KEY),
        ("STUDENT_ROSTER_CSRF_SECRET", CSRF_KEY),
    ];
    pairs.extend_from_slice(extra);
    load(&pairs)
}

#[test]
fn test_separate_secrets_accepted() {
    let config = with_secrets(&[]).expect("Should accept different secrets");
    assert_ne!(config.session_secret, config.csrf_secret);
    assert_eq!(config.session_lifetime, Duration::from_secs(8 * 3600));
}

#[test]
fn test_same_secrets_rejected() {
    let error = load(&[
        ("STUDENT_ROSTER_SESSION_SECRET", SESSION_KEY),
        ("STUDENT_ROSTER_CSRF_SECRET", SESSION_KEY),
    ])
    .unwrap_err();

    assert!(error.to_string().contains("must be different"));
}

#[test]
fn test_missing_csrf_secret_rejected() {
    let error = load(&[("STUDENT_ROSTER_SESSION_SECRET", SESSION_KEY)]).unwrap_err();
    assert!(error.to_string().contains("STUDENT_ROSTER_CSRF_SECRET"));
}

#[test]
fn test_insecure_patterns_rejected() {
    let insecure = [
        "short-k3y",
        "change-this-session-key-before-deploying-it",
        "my-default-session-signing-key-for-prod-01",
        "PASSWORD-protected-session-signing-key-2024",
        "onlylettersinthisverylongsessionsigningkey",
    ];

    for value in insecure {
        let result = load(&[
            ("STUDENT_ROSTER_SESSION_SECRET", value),
            ("STUDENT_ROSTER_CSRF_SECRET", CSRF_KEY),
        ]);
        assert!(
            matches!(result, Err(RosterError::ConfigError(_))),
            "accepted insecure session key {:?}",
            value
        );

        let result = load(&[
            ("STUDENT_ROSTER_SESSION_SECRET", SESSION_KEY),
            ("STUDENT_ROSTER_CSRF_SECRET", value),
        ]);
        assert!(
            matches!(result, Err(RosterError::ConfigError(_))),
            "accepted insecure CSRF key {:?}",
            value
        );
    }
}

#[test]
fn test_secure_cookies_follow_development_mode() {
    let production = with_secrets(&[]).unwrap();
    assert!(!production.development_mode);
    assert!(production.secure_cookies);

    let development = with_secrets(&[("STUDENT_ROSTER_DEVELOPMENT_MODE", "true")]).unwrap();
    assert!(development.development_mode);
    assert!(!development.secure_cookies);

    let forced = with_secrets(&[
        ("STUDENT_ROSTER_DEVELOPMENT_MODE", "true"),
        ("STUDENT_ROSTER_SECURE_COOKIES", "1"),
    ])
    .unwrap();
    assert!(forced.secure_cookies);
}

#[test]
fn test_session_hours_and_page_size() {
    let config = with_secrets(&[
        ("STUDENT_ROSTER_SESSION_HOURS", "2"),
        ("STUDENT_ROSTER_PAGE_SIZE", "500"),
    ])
    .unwrap();
    assert_eq!(config.session_lifetime, Duration::from_secs(7200));
    assert_eq!(config.default_page_size, 100);

    assert!(with_secrets(&[("STUDENT_ROSTER_SESSION_HOURS", "0")]).is_err());
}

#[test]
fn test_oversized_session_hours_rejected() {
    let error = with_secrets(&[("STUDENT_ROSTER_SESSION_HOURS", "18446744073709551615")]).unwrap_err();
    assert!(matches!(error, RosterError::ConfigError(_)));
    assert!(error.to_string().contains("at most"));

    let longest = with_secrets(&[("STUDENT_ROSTER_SESSION_HOURS", "720")]).unwrap();
    assert_eq!(longest.session_lifetime, Duration::from_secs(720 * 3600));
    assert!(with_secrets(&[("STUDENT_ROSTER_SESSION_HOURS", "721")]).is_err());
}

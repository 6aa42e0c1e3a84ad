//! Security-focused logging module to track authentication and access events

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Types of security events to track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityEvent {
    // Authentication events
    AuthenticationFailed { username: String, reason: String },
    AuthenticationSuccess { username: String },
    RegistrationAccepted { username: String, role: String },
    RegistrationRejected { username: String, reason: String },

    // Session events
    SessionEnded { username: Option<String> },
    SessionRejected { reason: String },

    // Authorization events
    PermissionDenied { username: String, action: String },
    UnauthenticatedAccess { action: String },

    // Request forgery
    CSRFAttempt { session: String, reason: String },

    // System security
    ConfigurationError { component: String, error: String },
}

impl SecurityEvent {
    /// Key used for counting and alert thresholds
    pub fn key(&self) -> &'static str {
        match self {
            SecurityEvent::AuthenticationFailed { .. } => "auth_failed",
            SecurityEvent::AuthenticationSuccess { .. } => "auth_success",
            SecurityEvent::RegistrationAccepted { .. } => "registration_accepted",
            SecurityEvent::RegistrationRejected { .. } => "registration_rejected",
            SecurityEvent::SessionEnded { .. } => "session_ended",
            SecurityEvent::SessionRejected { .. } => "session_rejected",
            SecurityEvent::PermissionDenied { .. } => "permission_denied",
            SecurityEvent::UnauthenticatedAccess { .. } => "unauthenticated_access",
            SecurityEvent::CSRFAttempt { .. } => "csrf_attempt",
            SecurityEvent::ConfigurationError { .. } => "config_error",
        }
    }
}

/// Security event with timestamp
#[derive(Debug, Clone)]
struct TimestampedEvent {
    event: SecurityEvent,
    timestamp: Instant,
}

/// Security logger for tracking and alerting on security events
pub struct SecurityLogger {
    events: Arc<RwLock<Vec<TimestampedEvent>>>,
    event_counts: Arc<RwLock<HashMap<&'static str, usize>>>,
    max_events: usize,
    alert_thresholds: HashMap<&'static str, usize>,
}

impl Default for SecurityLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityLogger {
    /// Create a new security logger
    pub fn new() -> Self {
        let alert_thresholds = HashMap::from([
            ("auth_failed", 5),
            ("session_rejected", 10),
            ("permission_denied", 20),
            ("unauthenticated_access", 20),
            ("csrf_attempt", 1),
            ("config_error", 1),
        ]);

        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            event_counts: Arc::new(RwLock::new(HashMap::new())),
            max_events: 10000,
            alert_thresholds,
        }
    }

    /// Log a security event
    pub async fn log_event(&self, event: SecurityEvent) {
        let event_key = event.key();

        {
            let mut events = self.events.write().await;
            events.push(TimestampedEvent {
                event: event.clone(),
                timestamp: Instant::now(),
            });

            // Limit memory usage
            if events.len() > self.max_events {
                let events_to_remove = events.len() - self.max_events;
                events.drain(0..events_to_remove);
            }
        }

        {
            let mut counts = self.event_counts.write().await;
            let count = counts.entry(event_key).or_insert(0);
            *count += 1;

            if let Some(&threshold) = self.alert_thresholds.get(event_key) {
                if *count >= threshold {
                    self.trigger_alert(event_key, *count, &event);
                    *count = 0; // Reset counter after alert
                }
            }
        }

        match event {
            SecurityEvent::AuthenticationFailed { username, reason } => {
                log::warn!("SECURITY: Authentication failed - User: {}, Reason: {}", username, reason);
            }
            SecurityEvent::AuthenticationSuccess { username } => {
                log::info!("SECURITY: Authentication success - User: {}", username);
            }
            SecurityEvent::RegistrationAccepted { username, role } => {
                log::info!("SECURITY: Registration accepted - User: {}, Role: {}", username, role);
            }
            SecurityEvent::RegistrationRejected { username, reason } => {
                log::warn!("SECURITY: Registration rejected - User: {}, Reason: {}", username, reason);
            }
            SecurityEvent::SessionEnded { username } => {
                log::info!("SECURITY: Session ended - User: {:?}", username);
            }
            SecurityEvent::SessionRejected { reason } => {
                log::warn!("SECURITY: Session cookie rejected - Reason: {}", reason);
            }
            SecurityEvent::PermissionDenied { username, action } => {
                log::warn!("SECURITY: Permission denied - User: {}, Action: {}", username, action);
            }
            SecurityEvent::UnauthenticatedAccess { action } => {
                log::warn!("SECURITY: Unauthenticated access attempt - Action: {}", action);
            }
            SecurityEvent::CSRFAttempt { session, reason } => {
                log::error!("SECURITY: CSRF check failed - Session: {}, Reason: {}", session, reason);
            }
            SecurityEvent::ConfigurationError { component, error } => {
                log::error!("SECURITY: Configuration error - Component: {}, Error: {}", component, error);
            }
        }
    }

    /// Trigger security alert
    fn trigger_alert(&self, event_type: &str, count: usize, sample_event: &SecurityEvent) {
        log::error!("SECURITY ALERT: {} events of type '{}' detected", count, event_type);
        log::error!("Sample event: {:?}", sample_event);
    }

    /// Get recent security events
    pub async fn get_recent_events(&self, duration: Duration) -> Vec<SecurityEvent> {
        let events = self.events.read().await;
        let now = Instant::now();

        events
            .iter()
            .filter(|event| now.duration_since(event.timestamp) <= duration)
            .map(|event| event.event.clone())
            .collect()
    }

    /// Get event statistics (counts since the last alert per kind)
    pub async fn get_event_stats(&self) -> HashMap<&'static str, usize> {
        self.event_counts.read().await.clone()
    }

    /// Clean up old events
    pub async fn cleanup_old_events(&self, max_age: Duration) {
        let mut events = self.events.write().await;
        let now = Instant::now();

        events.retain(|event| now.duration_since(event.timestamp) <= max_age);
    }

    /// Start periodic cleanup task
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // Every 5 minutes
            loop {
                interval.tick().await;
                self.cleanup_old_events(Duration::from_secs(3600 * 24)).await; // Keep 24 hours
            }
        });
    }
}

/// Global security logger instance - thread-safe singleton
static SECURITY_LOGGER: OnceLock<Arc<SecurityLogger>> = OnceLock::new();

/// Initialize the global security logger. Must run inside a Tokio runtime.
pub fn init_security_logger() {
    SECURITY_LOGGER.get_or_init(|| {
        let logger = Arc::new(SecurityLogger::new());
        logger.clone().start_cleanup_task();
        logger
    });
}

/// Get the global security logger
pub fn get_security_logger() -> Option<Arc<SecurityLogger>> {
    SECURITY_LOGGER.get().cloned()
}

/// Log a security event using the global logger; a no-op before init
pub async fn log_security_event(event: SecurityEvent) {
    if let Some(logger) = get_security_logger() {
        logger.log_event(event).await;
    }
}

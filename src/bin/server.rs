use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use student_roster::auth::{AuthEngine, PasswordDigester, SessionTokenManager};
use student_roster::config::ServerConfig;
use student_roster::constants::AUTH_FLOOR_MILLIS;
use student_roster::handlers::{build_routes, AppState};
use student_roster::roster::RosterService;
use student_roster::security::CSRFProtection;
use student_roster::security_logger::{init_security_logger, log_security_event, SecurityEvent};
use student_roster::storage::seed::seed_demo_accounts;
use student_roster::storage::{MemoryCredentialStore, MemoryStudentStorage};

#[tokio::main]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();
    init_security_logger();

    // Load config from env
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            log_security_event(SecurityEvent::ConfigurationError {
                component: "server".to_string(),
                error: e.to_string(),
            })
            .await;
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, tls={}, development_mode={}",
        config.host, config.port, config.enable_tls, config.development_mode
    );
    if config.development_mode {
        warn!("Development mode is enabled: localhost origins are accepted and cookies may be sent without Secure");
    }

    let digester = match PasswordDigester::new(config.digest_params) {
        Ok(digester) => digester,
        Err(e) => {
            error!("Failed to set up password digests: {}", e);
            std::process::exit(1);
        }
    };

    let tokens = SessionTokenManager::new(&config.session_secret, config.session_lifetime);
    let engine = match AuthEngine::new(Arc::new(MemoryCredentialStore::new()), digester, tokens) {
        Ok(engine) => engine.with_auth_floor(Duration::from_millis(AUTH_FLOOR_MILLIS)),
        Err(e) => {
            error!("Failed to create authentication engine: {}", e);
            std::process::exit(1);
        }
    };

    if config.seed_demo_accounts {
        if let Some(password) = config.seed_password.as_deref() {
            match seed_demo_accounts(engine.credentials(), password).await {
                Ok(count) => info!("Demo seed finished, {} accounts created", count),
                Err(e) => {
                    error!("Failed to seed demo accounts: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    let state = AppState {
        engine: Arc::new(engine),
        roster: Arc::new(RosterService::new(
            Arc::new(MemoryStudentStorage::new()),
            config.default_page_size,
        )),
        csrf: Arc::new(CSRFProtection::new(
            config.allowed_origins.clone(),
            config.development_mode,
            config.csrf_secret.clone(),
        )),
        secure_cookies: config.secure_cookies,
    };

    let routes = build_routes(state);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server
    match (config.enable_tls, config.tls_cert_path, config.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            info!("Starting Student Roster server on https://{}", addr);
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .run(addr)
                .await;
        }
        _ => {
            info!("Starting Student Roster server on http://{}", addr);
            warp::serve(routes).run(addr).await;
        }
    }
}

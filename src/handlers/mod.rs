//! Request handlers for the HTTP endpoints
//!
//! Handlers never fail at the warp level: every `RosterError` is turned into
//! a status code and a JSON body here.

pub mod account;
pub mod routes;
pub mod session;
pub mod students;

use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::auth::engine::AuthEngine;
use crate::auth::role::Action;
use crate::auth::session::Session;
use crate::error::{Result, RosterError};
use crate::roster::service::RosterService;
use crate::security::csrf::CSRFProtection;
use crate::security_logger::{log_security_event, SecurityEvent};

pub use routes::build_routes;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AuthEngine>,
    pub roster: Arc<RosterService>,
    pub csrf: Arc<CSRFProtection>,
    pub secure_cookies: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Include the shared state in a request
pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// HTTP status for an error
pub fn status_for(err: &RosterError) -> StatusCode {
    match err {
        RosterError::EmptyCredentials
        | RosterError::MissingRequiredField(_)
        | RosterError::ValidationError(_)
        | RosterError::InvalidRole(_) => StatusCode::BAD_REQUEST,
        RosterError::InvalidCredentials
        | RosterError::InvalidSession(_)
        | RosterError::Unauthorized => StatusCode::UNAUTHORIZED,
        RosterError::Forbidden | RosterError::CsrfError(_) => StatusCode::FORBIDDEN,
        RosterError::DuplicateUsername(_) => StatusCode::CONFLICT,
        RosterError::StudentNotFound(_) => StatusCode::NOT_FOUND,
        RosterError::StoreUnavailable(_)
        | RosterError::DigestError(_)
        | RosterError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error response; server-side failures get a generic message
pub fn error_response(err: &RosterError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        log::error!("Request failed: {}", err);
        return error_message("Internal server error", status);
    }
    error_message(&err.to_string(), status)
}

pub(crate) fn error_message(message: &str, status: StatusCode) -> Response {
    json_response(
        &ErrorBody {
            error: message.to_string(),
        },
        status,
    )
}

pub(crate) fn json_response<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

/// Collapse a handler outcome into a response
pub(crate) fn respond(outcome: Result<Response>) -> std::result::Result<Response, Infallible> {
    Ok(outcome.unwrap_or_else(|e| error_response(&e)))
}

/// Check that a session may perform an action.
///
/// Anonymous sessions get `Unauthorized`, authenticated ones without a
/// matching role get `Forbidden`.
pub(crate) async fn require(state: &AppState, session: &Session, action: Action) -> Result<()> {
    if state.engine.authorize(session, &action.required_roles()) {
        return Ok(());
    }

    match session.principal() {
        Some(principal) => {
            log_security_event(SecurityEvent::PermissionDenied {
                username: principal.username().to_string(),
                action: action.name().to_string(),
            })
            .await;
            Err(RosterError::Forbidden)
        }
        None => {
            log_security_event(SecurityEvent::UnauthenticatedAccess {
                action: action.name().to_string(),
            })
            .await;
            Err(RosterError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&RosterError::EmptyCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&RosterError::InvalidRole("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&RosterError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&RosterError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&RosterError::CsrfError("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&RosterError::DuplicateUsername("a".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&RosterError::StudentNotFound(7)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&RosterError::StoreUnavailable("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let response = error_response(&RosterError::StoreUnavailable("db at 10.0.0.3".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

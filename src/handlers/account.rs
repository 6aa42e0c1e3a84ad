//! Account handlers: login, registration, logout and profile

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::reply::Response;
use warp::Reply;

use crate::auth::engine::{IssuedSession, Registration};
use crate::auth::role::{Action, Role};
use crate::auth::session::{Principal, Session};
use crate::error::{Result, RosterError};
use crate::handlers::session::{clear_session_cookie, session_cookie};
use crate::handlers::{json_response, require, respond, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AvailabilityQuery {
    pub user_name: String,
}

/// Public view of a signed-in principal
#[derive(Debug, Serialize)]
pub struct PrincipalView {
    pub username: String,
    pub roles: Vec<Role>,
}

impl From<&Principal> for PrincipalView {
    fn from(principal: &Principal) -> Self {
        Self {
            username: principal.username().to_string(),
            roles: principal.roles().iter().copied().collect(),
        }
    }
}

#[derive(Serialize)]
struct CsrfTokenBody {
    token: String,
}

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
}

fn signed_in_response(state: &AppState, issued: &IssuedSession, status: StatusCode) -> Response {
    let cookie = session_cookie(
        &issued.token,
        state.engine.session_lifetime(),
        state.secure_cookies,
    );
    let reply = warp::reply::with_status(
        warp::reply::json(&PrincipalView::from(&issued.principal)),
        status,
    );
    warp::reply::with_header(reply, "set-cookie", cookie).into_response()
}

async fn login(
    state: &AppState,
    session: &Session,
    method: &Method,
    headers: &HeaderMap,
    request: LoginRequest,
) -> Result<Response> {
    state
        .csrf
        .check_request(method, headers, &session.binding_id())
        .await?;
    let issued = state.engine.login(&request.username, &request.password).await?;
    Ok(signed_in_response(state, &issued, StatusCode::OK))
}

pub async fn handle_login(
    state: AppState,
    session: Session,
    method: Method,
    headers: HeaderMap,
    request: LoginRequest,
) -> std::result::Result<Response, Infallible> {
    respond(login(&state, &session, &method, &headers, request).await)
}

async fn register(
    state: &AppState,
    session: &Session,
    method: &Method,
    headers: &HeaderMap,
    registration: Registration,
) -> Result<Response> {
    state
        .csrf
        .check_request(method, headers, &session.binding_id())
        .await?;
    let issued = state.engine.register(registration).await?;
    Ok(signed_in_response(state, &issued, StatusCode::CREATED))
}

pub async fn handle_register(
    state: AppState,
    session: Session,
    method: Method,
    headers: HeaderMap,
    registration: Registration,
) -> std::result::Result<Response, Infallible> {
    respond(register(&state, &session, &method, &headers, registration).await)
}

async fn logout(
    state: &AppState,
    session: Session,
    method: &Method,
    headers: &HeaderMap,
) -> Result<Response> {
    state
        .csrf
        .check_request(method, headers, &session.binding_id())
        .await?;
    state.engine.logout(session).await;

    let reply = json_response(&MessageBody { message: "Logged out" }, StatusCode::OK);
    let cookie = clear_session_cookie(state.secure_cookies);
    Ok(warp::reply::with_header(reply, "set-cookie", cookie).into_response())
}

/// Always clears the cookie, whether or not a session was present
pub async fn handle_logout(
    state: AppState,
    session: Session,
    method: Method,
    headers: HeaderMap,
) -> std::result::Result<Response, Infallible> {
    respond(logout(&state, session, &method, &headers).await)
}

async fn me(state: &AppState, session: &Session) -> Result<Response> {
    require(state, session, Action::ViewProfile).await?;
    let principal = session.principal().ok_or(RosterError::Unauthorized)?;
    Ok(json_response(&PrincipalView::from(principal), StatusCode::OK))
}

pub async fn handle_me(state: AppState, session: Session) -> std::result::Result<Response, Infallible> {
    respond(me(&state, &session).await)
}

pub async fn handle_roles() -> std::result::Result<Response, Infallible> {
    let names: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
    Ok(json_response(&names, StatusCode::OK))
}

/// Token for the session the caller currently holds
pub async fn handle_csrf_token(
    state: AppState,
    session: Session,
) -> std::result::Result<Response, Infallible> {
    let token = state.csrf.generate_csrf_token(&session.binding_id());
    Ok(json_response(&CsrfTokenBody { token }, StatusCode::OK))
}

pub async fn handle_username_available(
    state: AppState,
    query: AvailabilityQuery,
) -> std::result::Result<Response, Infallible> {
    respond(
        state
            .engine
            .username_available(&query.user_name)
            .await
            .map(|available| json_response(&available, StatusCode::OK)),
    )
}

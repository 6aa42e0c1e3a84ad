//! Student roster handlers

use std::convert::Infallible;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::reply::Response;
use warp::Reply;

use crate::auth::role::Action;
use crate::auth::session::Session;
use crate::error::Result;
use crate::handlers::{json_response, require, respond, AppState};
use crate::roster::student::StudentForm;
use crate::storage::traits::StudentQuery;

/// Role check first, so anonymous callers get 401 rather than a CSRF failure
async fn guard_mutation(
    state: &AppState,
    session: &Session,
    action: Action,
    method: &Method,
    headers: &HeaderMap,
) -> Result<()> {
    require(state, session, action).await?;
    state
        .csrf
        .check_request(method, headers, &session.binding_id())
        .await
}

async fn list(state: &AppState, session: &Session, query: StudentQuery) -> Result<Response> {
    require(state, session, Action::ViewStudents).await?;
    let page = state.roster.list(query).await?;
    Ok(json_response(&page, StatusCode::OK))
}

pub async fn handle_list(
    state: AppState,
    session: Session,
    query: StudentQuery,
) -> std::result::Result<Response, Infallible> {
    respond(list(&state, &session, query).await)
}

async fn details(state: &AppState, session: &Session, id: u64) -> Result<Response> {
    require(state, session, Action::ViewStudents).await?;
    let student = state.roster.details(id).await?;
    Ok(json_response(&student, StatusCode::OK))
}

pub async fn handle_details(
    id: u64,
    state: AppState,
    session: Session,
) -> std::result::Result<Response, Infallible> {
    respond(details(&state, &session, id).await)
}

async fn create(
    state: &AppState,
    session: &Session,
    method: &Method,
    headers: &HeaderMap,
    form: StudentForm,
) -> Result<Response> {
    guard_mutation(state, session, Action::CreateStudent, method, headers).await?;
    let student = state.roster.create(form).await?;
    Ok(json_response(&student, StatusCode::CREATED))
}

pub async fn handle_create(
    state: AppState,
    session: Session,
    method: Method,
    headers: HeaderMap,
    form: StudentForm,
) -> std::result::Result<Response, Infallible> {
    respond(create(&state, &session, &method, &headers, form).await)
}

async fn update(
    state: &AppState,
    session: &Session,
    method: &Method,
    headers: &HeaderMap,
    id: u64,
    form: StudentForm,
) -> Result<Response> {
    guard_mutation(state, session, Action::EditStudent, method, headers).await?;
    let student = state.roster.update(id, form).await?;
    Ok(json_response(&student, StatusCode::OK))
}

pub async fn handle_update(
    id: u64,
    state: AppState,
    session: Session,
    method: Method,
    headers: HeaderMap,
    form: StudentForm,
) -> std::result::Result<Response, Infallible> {
    respond(update(&state, &session, &method, &headers, id, form).await)
}

async fn delete(
    state: &AppState,
    session: &Session,
    method: &Method,
    headers: &HeaderMap,
    id: u64,
) -> Result<Response> {
    guard_mutation(state, session, Action::DeleteStudent, method, headers).await?;
    state.roster.delete(id).await?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response())
}

pub async fn handle_delete(
    id: u64,
    state: AppState,
    session: Session,
    method: Method,
    headers: HeaderMap,
) -> std::result::Result<Response, Infallible> {
    respond(delete(&state, &session, &method, &headers, id).await)
}

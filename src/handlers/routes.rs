//! Route assembly and rejection handling

use serde::de::DeserializeOwned;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::auth::engine::Registration;
use crate::constants::MAX_BODY_BYTES;
use crate::error::RosterError;
use crate::handlers::session::with_session;
use crate::handlers::{account, error_message, error_response, students, with_state, AppState};
use crate::roster::student::StudentForm;
use crate::security::headers::add_security_headers;
use crate::storage::traits::StudentQuery;

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Every endpoint of the service, with rejections recovered and security
/// headers applied
pub fn build_routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK).into_response());

    let roles = warp::path!("account" / "roles")
        .and(warp::get())
        .and_then(account::handle_roles);

    let csrf_token = warp::path!("account" / "csrf-token")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and_then(account::handle_csrf_token);

    let username_available = warp::path!("account" / "username-available")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(warp::query::<account::AvailabilityQuery>())
        .and_then(account::handle_username_available);

    let login = warp::path!("account" / "login")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(json_body::<account::LoginRequest>())
        .and_then(account::handle_login);

    let register = warp::path!("account" / "register")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(json_body::<Registration>())
        .and_then(account::handle_register);

    let logout = warp::path!("account" / "logout")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and_then(account::handle_logout);

    let me = warp::path!("account" / "me")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and_then(account::handle_me);

    let list_students = warp::path!("students")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and(warp::query::<StudentQuery>())
        .and_then(students::handle_list);

    let student_details = warp::path!("students" / u64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and_then(students::handle_details);

    let create_student = warp::path!("students")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(json_body::<StudentForm>())
        .and_then(students::handle_create);

    let update_student = warp::path!("students" / u64)
        .and(warp::put())
        .and(with_state(state.clone()))
        .and(with_session(state.clone()))
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(json_body::<StudentForm>())
        .and_then(students::handle_update);

    let delete_student = warp::path!("students" / u64)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and(with_session(state))
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and_then(students::handle_delete);

    let account_routes = roles
        .or(csrf_token)
        .unify()
        .or(username_available)
        .unify()
        .or(login)
        .unify()
        .or(register)
        .unify()
        .or(logout)
        .unify()
        .or(me)
        .unify();

    let student_routes = list_students
        .or(student_details)
        .unify()
        .or(create_student)
        .unify()
        .or(update_student)
        .unify()
        .or(delete_student)
        .unify();

    health
        .or(account_routes)
        .unify()
        .or(student_routes)
        .unify()
        .recover(handle_rejection)
        .unify()
        .map(add_security_headers)
}

/// Map rejections that escaped the handlers to JSON errors
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(error_message("Not found", StatusCode::NOT_FOUND));
    }
    if let Some(e) = err.find::<RosterError>() {
        return Ok(error_response(e));
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        log::debug!("Rejected request body: {}", e);
        return Ok(error_message("Malformed request body", StatusCode::BAD_REQUEST));
    }
    if err.find::<warp::reject::InvalidQuery>().is_some() {
        return Ok(error_message("Malformed query string", StatusCode::BAD_REQUEST));
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_message("Request body too large", StatusCode::PAYLOAD_TOO_LARGE));
    }
    if err.find::<warp::reject::LengthRequired>().is_some() {
        return Ok(error_message("Content-Length required", StatusCode::LENGTH_REQUIRED));
    }
    if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(error_message(
            "Expected a JSON body",
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_message("Method not allowed", StatusCode::METHOD_NOT_ALLOWED));
    }

    log::error!("Unhandled rejection: {:?}", err);
    Ok(error_message("Internal server error", StatusCode::INTERNAL_SERVER_ERROR))
}

//! Session cookie handling

use std::convert::Infallible;
use std::time::Duration;
use warp::{Filter, Rejection};

use crate::auth::session::Session;
use crate::constants::SESSION_COOKIE;
use crate::handlers::{with_state, AppState};

/// Find the session token in a `Cookie` header
pub fn session_token_from_cookies(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", Duration::ZERO, secure)
}

/// Resolve the caller's session from the request cookies
pub fn with_session(state: AppState) -> impl Filter<Extract = (Session,), Error = Rejection> + Clone {
    warp::header::optional::<String>("cookie")
        .and(with_state(state))
        .and_then(|cookies: Option<String>, state: AppState| async move {
            let token = cookies.as_deref().and_then(session_token_from_cookies);
            Ok::<_, Infallible>(state.engine.resolve(token).await)
        })
}

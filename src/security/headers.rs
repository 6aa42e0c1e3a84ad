//! Security headers for HTTP responses

use warp::http::HeaderValue;
use warp::reply::Response;

/// Content Security Policy for a JSON API: nothing may be loaded or framed
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'; form-action 'self'; base-uri 'none';";

const PERMISSIONS_POLICY: &str = "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()";

/// Add security headers to a response
pub fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();

    // Prevent clickjacking
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));

    // Prevent MIME type sniffing
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));

    headers.insert("Referrer-Policy", HeaderValue::from_static("same-origin"));
    headers.insert("Content-Security-Policy", HeaderValue::from_static(API_CSP));
    headers.insert("Permissions-Policy", HeaderValue::from_static(PERMISSIONS_POLICY));

    // Responses carry per-user data
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );

    // Remove server information disclosure
    headers.remove("Server");

    response
}

//! Answers `OPTIONS` requests on proxied paths without contacting the origin.
//!
//! A request carrying `Origin`, `Access-Control-Request-Method` and
//! `Access-Control-Request-Headers` is a CORS preflight and gets the CORS
//! headers; any other `OPTIONS` request is a capability probe and gets only
//! an `Allow` header. Both are answered with `204 No Content`.

use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Response, StatusCode};

use crate::body::{self, ProxyBody};
use crate::headers;

/// Returns `true` if the request headers describe a CORS preflight.
pub fn is_cors_preflight(request_headers: &HeaderMap) -> bool {
    [
        headers::ORIGIN,
        headers::ACCESS_CONTROL_REQUEST_METHOD,
        headers::ACCESS_CONTROL_REQUEST_HEADERS,
    ]
    .iter()
    .all(|name| request_headers.contains_key(*name))
}

/// Builds the `204` answer for an `OPTIONS` request.
///
/// # Example
///
/// ```
/// use hyper::{HeaderMap, StatusCode};
/// use passage_core::preflight::preflight_response;
///
/// let response = preflight_response(&HeaderMap::new());
/// assert_eq!(response.status(), StatusCode::NO_CONTENT);
/// assert_eq!(
///     response.headers().get("allow").unwrap(),
///     "GET, HEAD, POST, PUT, DELETE, OPTIONS"
/// );
/// ```
pub fn preflight_response(request_headers: &HeaderMap) -> Response<ProxyBody> {
    let mut response = Response::new(body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    if is_cors_preflight(request_headers) {
        headers::apply_cors_headers(
            response.headers_mut(),
            request_headers.get(headers::ACCESS_CONTROL_REQUEST_HEADERS),
        );
    } else {
        response.headers_mut().insert(
            HeaderName::from_static(headers::ALLOW),
            HeaderValue::from_static(headers::ALLOWED_METHODS),
        );
    }

    response
}

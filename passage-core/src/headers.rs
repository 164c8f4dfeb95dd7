//! HTTP header names and the header policy applied in both directions.
//!
//! Outbound requests lose everything that identifies the client or the proxy
//! host; inbound responses lose the headers that would stop rewritten content
//! from working under the proxy's origin, and gain permissive CORS headers.
//!
//! All matching is case-insensitive: names are compared through
//! [`hyper::header::HeaderName`], which is always lowercase.

use hyper::HeaderMap;
use hyper::header::{HeaderName, HeaderValue};

/// Cookie header.
pub const COOKIE: &str = "cookie";

/// Host header.
pub const HOST: &str = "host";

/// Origin header.
pub const ORIGIN: &str = "origin";

/// Referer header.
pub const REFERER: &str = "referer";

/// Accept-Encoding header. Negotiated by the fetch layer, never forwarded.
pub const ACCEPT_ENCODING: &str = "accept-encoding";

/// Content-Type header.
pub const CONTENT_TYPE: &str = "content-type";

/// Content-Length header.
pub const CONTENT_LENGTH: &str = "content-length";

/// User-Agent header.
pub const USER_AGENT: &str = "user-agent";

/// Allow header (generic OPTIONS responses).
pub const ALLOW: &str = "allow";

pub const CONTENT_SECURITY_POLICY: &str = "content-security-policy";
pub const X_FRAME_OPTIONS: &str = "x-frame-options";
pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
pub const STRICT_TRANSPORT_SECURITY: &str = "strict-transport-security";
pub const SET_COOKIE: &str = "set-cookie";

pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "access-control-allow-origin";
pub const ACCESS_CONTROL_ALLOW_METHODS: &str = "access-control-allow-methods";
pub const ACCESS_CONTROL_ALLOW_HEADERS: &str = "access-control-allow-headers";
pub const ACCESS_CONTROL_MAX_AGE: &str = "access-control-max-age";
pub const ACCESS_CONTROL_REQUEST_METHOD: &str = "access-control-request-method";
pub const ACCESS_CONTROL_REQUEST_HEADERS: &str = "access-control-request-headers";

/// Connection header (hop-by-hop).
pub const CONNECTION: &str = "connection";

/// Keep-Alive header (hop-by-hop).
pub const KEEP_ALIVE: &str = "keep-alive";

/// Proxy-Authenticate header (hop-by-hop).
pub const PROXY_AUTHENTICATE: &str = "proxy-authenticate";

/// Proxy-Authorization header (hop-by-hop).
pub const PROXY_AUTHORIZATION: &str = "proxy-authorization";

/// TE header (hop-by-hop).
pub const TE: &str = "te";

/// Trailers header (hop-by-hop).
pub const TRAILERS: &str = "trailers";

/// Transfer-Encoding header (hop-by-hop).
pub const TRANSFER_ENCODING: &str = "transfer-encoding";

/// Upgrade header (hop-by-hop).
pub const UPGRADE: &str = "upgrade";

/// List of all hop-by-hop headers that should not be forwarded.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    CONNECTION,
    KEEP_ALIVE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILERS,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Request headers that would reveal the client or the proxy's own host.
pub const REQUEST_STRIPPED_HEADERS: &[&str] = &[COOKIE, HOST, ORIGIN, REFERER];

/// Response headers that would block rewritten content or leak origin state.
pub const RESPONSE_STRIPPED_HEADERS: &[&str] = &[
    CONTENT_SECURITY_POLICY,
    X_FRAME_OPTIONS,
    X_CONTENT_TYPE_OPTIONS,
    STRICT_TRANSPORT_SECURITY,
    SET_COOKIE,
];

/// Value of `access-control-allow-methods` on every proxied response.
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Value of `access-control-max-age` on every proxied response.
pub const CORS_MAX_AGE: &str = "86400";

/// Value of the `allow` header answered to generic OPTIONS probes.
pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, PUT, DELETE, OPTIONS";

/// Check if a header is a hop-by-hop header that shouldn't be forwarded.
///
/// # Arguments
///
/// * `header_name` - The header name to check (lowercase).
///
/// # Example
///
/// ```
/// use passage_core::headers::is_hop_by_hop;
///
/// assert!(is_hop_by_hop("connection"));
/// assert!(is_hop_by_hop("transfer-encoding"));
/// assert!(!is_hop_by_hop("content-type"));
/// ```
pub fn is_hop_by_hop(header_name: &str) -> bool {
    HOP_BY_HOP_HEADERS.contains(&header_name)
}

/// Returns the headers to send to the origin for a client request.
///
/// Drops `cookie`, `host`, `origin`, `referer`, hop-by-hop headers and
/// `accept-encoding`; everything else is kept with its original values.
///
/// # Example
///
/// ```
/// use hyper::HeaderMap;
/// use passage_core::headers::sanitize_request_headers;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("Cookie", "session=1".parse().unwrap());
/// headers.insert("Accept", "text/html".parse().unwrap());
///
/// let clean = sanitize_request_headers(&headers);
/// assert!(clean.get("cookie").is_none());
/// assert_eq!(clean.get("accept").unwrap(), "text/html");
/// ```
pub fn sanitize_request_headers(headers: &HeaderMap) -> HeaderMap {
    filter_headers(headers, |name| {
        REQUEST_STRIPPED_HEADERS.contains(&name) || name == ACCEPT_ENCODING
    })
}

/// Returns the headers to send to the client for an origin response.
///
/// Drops the blocking/state headers and hop-by-hop headers, then sets the
/// four CORS headers. `access-control-allow-headers` echoes
/// `requested_headers` (the client's `access-control-request-headers`), or
/// `*` when the client asked for none.
pub fn sanitize_response_headers(
    headers: &HeaderMap,
    requested_headers: Option<&HeaderValue>,
) -> HeaderMap {
    let mut clean = filter_headers(headers, |name| RESPONSE_STRIPPED_HEADERS.contains(&name));
    apply_cors_headers(&mut clean, requested_headers);
    clean
}

/// Sets the four CORS headers, replacing any values already present.
pub fn apply_cors_headers(headers: &mut HeaderMap, requested_headers: Option<&HeaderValue>) {
    headers.insert(
        HeaderName::from_static(ACCESS_CONTROL_ALLOW_ORIGIN),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static(ACCESS_CONTROL_ALLOW_METHODS),
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        HeaderName::from_static(ACCESS_CONTROL_ALLOW_HEADERS),
        allow_headers_value(requested_headers),
    );
    headers.insert(
        HeaderName::from_static(ACCESS_CONTROL_MAX_AGE),
        HeaderValue::from_static(CORS_MAX_AGE),
    );
}

/// The `access-control-allow-headers` value for a request.
pub fn allow_headers_value(requested_headers: Option<&HeaderValue>) -> HeaderValue {
    match requested_headers {
        Some(value) if !value.as_bytes().iter().all(u8::is_ascii_whitespace) => value.clone(),
        _ => HeaderValue::from_static("*"),
    }
}

/// Copies every header whose name is neither hop-by-hop nor rejected by `drop`.
fn filter_headers(headers: &HeaderMap, drop: impl Fn(&str) -> bool) -> HeaderMap {
    let mut clean = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if is_hop_by_hop(name_str) || drop(name_str) {
            continue;
        }
        clean.append(name.clone(), value.clone());
    }
    clean
}

//! HTTP request handling and proxying.
//!
//! This module contains the proxy dispatcher: it splits proxied traffic from
//! asset traffic, answers preflights, decodes the target URL, forwards the
//! request and hands the origin response to the matching rewriter.
//!
//! # Architecture
//!
//! The request handling flow:
//! 1. Paths outside the proxy prefix go to the [`AssetHandler`] untouched
//! 2. `OPTIONS` requests are answered by the preflight responder
//! 3. The token after the prefix is decoded into the target URL
//! 4. Request headers are sanitized and the body is streamed to the origin
//! 5. Response headers are sanitized and the body is rewritten by content type
//!
//! # Connection Pooling
//!
//! The module accepts a shared [`reqwest::Client`] for HTTP connection pooling,
//! which should be built with [`ProxyConfig::build_http_client`].

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::ext::ReasonPhrase;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error};
use url::Url;

use crate::assets::AssetHandler;
use crate::body::{self, BoxError, ProxyBody};
use crate::error::{PassageError, Result};
use crate::rewriter::{RewriteContext, RewriteStrategy, css, html};
use crate::types::{ConfigProvider, ProxyConfig};
use crate::{codec, headers, preflight};

/// Handles an incoming HTTP request through the proxy pipeline.
///
/// This is the main entry point for request processing. It performs:
/// - Prefix dispatch between proxied traffic and the asset collaborator
/// - Preflight answers for `OPTIONS`, without contacting the origin
/// - Token decoding and target validation
/// - Request forwarding with sanitized headers and a streamed body
/// - Response rewriting according to the content type
///
/// # Arguments
///
/// * `req` - The incoming HTTP request
/// * `config` - Configuration provider for all settings
/// * `assets` - Collaborator serving non-proxied paths
/// * `http_client` - HTTP client for origin fetches (with connection pooling)
///
/// # Returns
///
/// Always returns `Ok` with either:
/// - The rewritten or passed-through origin response
/// - A preflight or asset response
/// - An error response (400, 502, 504)
pub async fn handle_request<B, C, A>(
    req: Request<B>,
    config: Arc<C>,
    assets: Arc<A>,
    http_client: reqwest::Client,
) -> std::result::Result<Response<ProxyBody>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError> + 'static,
    C: ConfigProvider,
    A: AssetHandler,
{
    let proxy_config = config.proxy_config();

    let token = req
        .uri()
        .path()
        .strip_prefix(proxy_config.prefix.as_str())
        .map(str::to_owned);
    let Some(token) = token else {
        debug!(path = %req.uri().path(), "Delegating to asset handler");
        return Ok(assets.serve(req.map(body::inbound)).await);
    };

    if req.method() == Method::OPTIONS {
        debug!(path = %req.uri().path(), "Answering OPTIONS without contacting origin");
        return Ok(preflight::preflight_response(req.headers()));
    }

    match forward_request(req, &token, proxy_config, &http_client).await {
        Ok(response) => Ok(response),
        Err(err) => {
            if err.is_server_error() {
                error!(error = %err, "Proxy transaction failed");
            } else {
                debug!(error = %err, "Rejected proxy request");
            }
            Ok(create_error_response(err.status_code(), &err.user_message()))
        }
    }
}

/// Forward request to the decoded target and shape the response
async fn forward_request<B>(
    req: Request<B>,
    token: &str,
    proxy_config: &ProxyConfig,
    client: &reqwest::Client,
) -> Result<Response<ProxyBody>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError> + 'static,
{
    if token.is_empty() {
        return Err(PassageError::EmptyToken(proxy_config.prefix.clone()));
    }

    let target = resolve_target(token, req.uri().query())?;
    let (parts, body) = req.into_parts();

    let mut outbound_headers = headers::sanitize_request_headers(&parts.headers);
    let mut req_builder = client.request(parts.method.clone(), target.clone());

    // Bodyless requests are sent without a body so GET stays a plain GET
    if body.is_end_stream() {
        outbound_headers.remove(headers::CONTENT_LENGTH);
    } else {
        req_builder = req_builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    debug!(method = %parts.method, target = %target, "Forwarding request");
    // bounds the wait for response headers only, never the response body
    let response = tokio::time::timeout(
        proxy_config.timeout,
        req_builder.headers(outbound_headers).send(),
    )
    .await
    .map_err(|_| {
        PassageError::UpstreamTimeout(format!(
            "no response from {target} within {:?}",
            proxy_config.timeout
        ))
    })??;

    let status = response.status();
    let reason = response.extensions().get::<ReasonPhrase>().cloned();
    let response_headers = headers::sanitize_response_headers(
        response.headers(),
        parts.headers.get(headers::ACCESS_CONTROL_REQUEST_HEADERS),
    );
    let strategy = RewriteStrategy::for_content_type(
        response
            .headers()
            .get(headers::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
    );
    debug!(status = status.as_u16(), ?strategy, target = %target, "Origin responded");

    let ctx = RewriteContext::new(target, proxy_config.prefix.clone());
    let body = match strategy {
        RewriteStrategy::Html => body::stream(html::rewrite_stream(response.bytes_stream(), ctx)),
        RewriteStrategy::Css => {
            let bytes = response
                .bytes()
                .await
                .map_err(|err| PassageError::BodyReadError(err.to_string()))?;
            body::full(css::rewrite_stylesheet(&bytes, &ctx).into_owned())
        }
        RewriteStrategy::Passthrough => body::stream(response.bytes_stream()),
    };

    let mut proxied = Response::new(body);
    *proxied.status_mut() = status;
    *proxied.headers_mut() = response_headers;
    if let Some(reason) = reason {
        proxied.extensions_mut().insert(reason);
    }
    if strategy.rewrites_body() {
        proxied.headers_mut().remove(headers::CONTENT_LENGTH);
    }

    Ok(proxied)
}

/// Decodes a token into the URL to fetch.
///
/// The inbound query string, when present, replaces the target's own query.
fn resolve_target(token: &str, query: Option<&str>) -> Result<Url> {
    let decoded = codec::decode(token)?;
    let mut target = Url::parse(&decoded).map_err(|_| PassageError::InvalidUrl)?;

    if !matches!(target.scheme(), "http" | "https") {
        return Err(PassageError::InvalidUrl);
    }

    if let Some(query) = query.filter(|query| !query.is_empty()) {
        target.set_query(Some(query));
    }

    Ok(target)
}

/// Creates a standardized error response.
///
/// Builds an HTTP response with the given status code and plain text message.
/// Falls back to a minimal 500 response if building fails (should never happen
/// with valid StatusCode).
///
/// # Example
///
/// ```
/// use passage_core::request_handler::create_error_response;
/// use hyper::StatusCode;
///
/// let response = create_error_response(StatusCode::BAD_REQUEST, "Invalid Base64 encoded URL.");
/// assert_eq!(response.status(), StatusCode::BAD_REQUEST);
/// ```
pub fn create_error_response(status: StatusCode, message: &str) -> Response<ProxyBody> {
    Response::builder()
        .status(status)
        .header(headers::CONTENT_TYPE, "text/plain")
        .body(body::full(message.to_string()))
        .unwrap_or_else(|_| Response::new(body::full("Internal Server Error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NotFoundAssets;
    use crate::body::{InboundBody, ProxyBody};
    use crate::test_utils::TestConfig;
    use http_body_util::{BodyExt, Full};
    use std::sync::Mutex;
    use std::time::Duration;

    fn request(method: Method, uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn dispatch(req: Request<Full<Bytes>>) -> Response<ProxyBody> {
        let config = TestConfig::new().with_connect_timeout(Duration::from_secs(2));
        let client = config.proxy.build_http_client().unwrap();
        handle_request(req, Arc::new(config), Arc::new(NotFoundAssets), client)
            .await
            .unwrap()
    }

    async fn body_text(response: Response<ProxyBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Records the path and body of the last delegated request.
    #[derive(Default)]
    struct RecordingAssets {
        seen: Mutex<Option<(String, Bytes)>>,
    }

    impl AssetHandler for RecordingAssets {
        async fn serve(&self, req: Request<InboundBody>) -> Response<ProxyBody> {
            let path = req.uri().to_string();
            let body = req.into_body().collect().await.unwrap().to_bytes();
            *self.seen.lock().unwrap() = Some((path, body));
            Response::new(body::full("asset"))
        }
    }

    // ===========================================
    // Dispatch tests
    // ===========================================

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let response = dispatch(request(Method::GET, "/assignment/")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "Please provide a Base64 encoded URL after /assignment/"
        );
    }

    #[tokio::test]
    async fn test_invalid_encoding_rejected() {
        let response = dispatch(request(Method::GET, "/assignment/%%%")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid Base64 encoded URL.");
    }

    #[tokio::test]
    async fn test_not_a_url_rejected() {
        let uri = format!("/assignment/{}", codec::encode("not a url"));
        let response = dispatch(request(Method::POST, &uri)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Decoded URL is not a valid URL.");
    }

    #[tokio::test]
    async fn test_unsupported_scheme_rejected() {
        let uri = format!("/assignment/{}", codec::encode("ftp://example.com/file"));
        let response = dispatch(request(Method::GET, &uri)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Decoded URL is not a valid URL.");
    }

    #[tokio::test]
    async fn test_error_response_is_plain_text() {
        let response = dispatch(request(Method::GET, "/assignment/")).await;
        assert_eq!(
            response.headers().get(headers::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
    }

    #[tokio::test]
    async fn test_options_answered_before_token_checks() {
        let response = dispatch(request(Method::OPTIONS, "/assignment/")).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(headers::ALLOW).unwrap(),
            headers::ALLOWED_METHODS
        );
    }

    #[tokio::test]
    async fn test_options_preflight_never_contacts_origin() {
        // port 1 is never listening; a fetch would fail with 502
        let uri = format!("/assignment/{}", codec::encode("http://127.0.0.1:1/api"));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header("origin", "https://app.example")
            .header("access-control-request-method", "PUT")
            .header("access-control-request-headers", "x-token")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = dispatch(req).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(headers::ACCESS_CONTROL_ALLOW_HEADERS)
                .unwrap(),
            "x-token"
        );
        assert!(response.headers().get(headers::ALLOW).is_none());
    }

    #[tokio::test]
    async fn test_non_proxied_path_goes_to_assets() {
        let response = dispatch(request(Method::GET, "/index.html")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_prefix_without_trailing_slash_goes_to_assets() {
        let response = dispatch(request(Method::GET, "/assignment")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_assets_receive_request_unmodified() {
        let assets = Arc::new(RecordingAssets::default());
        let config = TestConfig::new();
        let client = config.proxy.build_http_client().unwrap();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/static/app.js?v=3")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();

        let response = handle_request(req, Arc::new(config), assets.clone(), client)
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "asset");
        let seen = assets.seen.lock().unwrap().take().unwrap();
        assert_eq!(seen.0, "/static/app.js?v=3");
        assert_eq!(seen.1, "payload");
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let config = TestConfig::new().with_prefix("proxy");
        let client = config.proxy.build_http_client().unwrap();

        let response = handle_request(
            request(Method::GET, "/proxy/"),
            Arc::new(config),
            Arc::new(NotFoundAssets),
            client,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "Please provide a Base64 encoded URL after /proxy/"
        );
    }

    #[tokio::test]
    async fn test_silent_origin_times_out() {
        // accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let config = TestConfig::new().with_timeout(Duration::from_millis(300));
        let client = config.proxy.build_http_client().unwrap();
        let uri = format!("/assignment/{}", codec::encode(&format!("http://{addr}/")));

        let response = handle_request(
            request(Method::GET, &uri),
            Arc::new(config),
            Arc::new(NotFoundAssets),
            client,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_text(response).await, "Target timeout");
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_bad_gateway() {
        let uri = format!("/assignment/{}", codec::encode("http://127.0.0.1:1/"));
        let response = dispatch(request(Method::GET, &uri)).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_text(response).await, "Could not connect to target");
    }

    // ===========================================
    // resolve_target tests
    // ===========================================

    #[test]
    fn test_resolve_target() {
        let target = resolve_target(&codec::encode("https://example.com/a?x=1"), None).unwrap();
        assert_eq!(target.as_str(), "https://example.com/a?x=1");
    }

    #[test]
    fn test_resolve_target_inbound_query_replaces_target_query() {
        let token = codec::encode("https://example.com/search?x=1");

        let target = resolve_target(&token, Some("q=rust&page=2")).unwrap();
        assert_eq!(target.as_str(), "https://example.com/search?q=rust&page=2");

        let target = resolve_target(&token, Some("")).unwrap();
        assert_eq!(target.as_str(), "https://example.com/search?x=1");
    }

    #[test]
    fn test_resolve_target_errors() {
        assert!(matches!(
            resolve_target("!!!", None),
            Err(PassageError::InvalidEncoding)
        ));
        assert!(matches!(
            resolve_target(&codec::encode("mailto:a@example.com"), None),
            Err(PassageError::InvalidUrl)
        ));
    }

    // ===========================================
    // create_error_response tests
    // ===========================================

    #[test]
    fn test_create_error_response_status() {
        let response = create_error_response(StatusCode::GATEWAY_TIMEOUT, "Target timeout");
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_create_error_response_body() {
        let response = create_error_response(StatusCode::BAD_GATEWAY, "Could not connect to target");
        assert_eq!(body_text(response).await, "Could not connect to target");
    }

    #[tokio::test]
    async fn test_create_error_response_empty_message() {
        let response = create_error_response(StatusCode::BAD_REQUEST, "");
        assert!(body_text(response).await.is_empty());
    }
}

//! Collaborator for requests outside the proxy prefix.
//!
//! The dispatcher never inspects these requests; it hands them over whole
//! and returns whatever the collaborator produces.

use hyper::{Request, Response, StatusCode};
use std::future::Future;

use crate::body::{InboundBody, ProxyBody};
use crate::request_handler::create_error_response;

/// Serves every request that is not proxied traffic.
///
/// # Example
///
/// ```
/// use hyper::{Request, Response};
/// use passage_core::assets::AssetHandler;
/// use passage_core::body::{self, InboundBody, ProxyBody};
///
/// struct Hello;
///
/// impl AssetHandler for Hello {
///     async fn serve(&self, _req: Request<InboundBody>) -> Response<ProxyBody> {
///         Response::new(body::full("hello"))
///     }
/// }
/// ```
pub trait AssetHandler: Send + Sync + 'static {
    /// Produces the response for a non-proxied request.
    fn serve(&self, req: Request<InboundBody>) -> impl Future<Output = Response<ProxyBody>> + Send;
}

/// Answers every non-proxied request with `404 Not Found`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotFoundAssets;

impl AssetHandler for NotFoundAssets {
    async fn serve(&self, _req: Request<InboundBody>) -> Response<ProxyBody> {
        create_error_response(StatusCode::NOT_FOUND, "Not Found")
    }
}

//! Body types shared by the request handler and the rewriters.
//!
//! Responses are either fully buffered (errors, preflight, rewritten CSS) or
//! streamed (passthrough, rewritten HTML); both are erased into
//! [`ProxyBody`] so one service signature covers every outcome.

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Body, Frame};
use std::io;

/// Boxed error type for inbound request bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body produced by the proxy.
pub type ProxyBody = UnsyncBoxBody<Bytes, io::Error>;

/// Request body after type erasure, as handed to the asset collaborator.
pub type InboundBody = UnsyncBoxBody<Bytes, BoxError>;

/// A complete in-memory body.
pub fn full(bytes: impl Into<Bytes>) -> ProxyBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A body with no data.
pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Erases the type of an inbound request body.
pub fn inbound<B>(body: B) -> InboundBody
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError> + 'static,
{
    body.map_err(Into::into).boxed_unsync()
}

/// Wraps a stream of chunks as a response body without buffering it.
pub fn stream<S, E>(chunks: S) -> ProxyBody
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    let frames = chunks
        .map_ok(Frame::data)
        .map_err(|err| {
            let err: BoxError = err.into();
            io::Error::other(err)
        });
    StreamBody::new(frames).boxed_unsync()
}

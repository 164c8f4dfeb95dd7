//! Streaming HTML rewriting.
//!
//! Documents are pushed chunk by chunk through an [`lol_html`] rewriter that
//! only touches the attributes listed in [`REWRITE_TARGETS`]; every other
//! byte of the document is emitted unchanged. The whole document is never
//! held in memory.
//!
//! `lol_html` rewriters are not `Send`, so the streaming variant runs the
//! rewriter on a blocking worker and connects it to the async world with
//! two bounded channels. A slow client therefore slows down the origin read
//! instead of growing a buffer, and a client that goes away stops the worker
//! and releases the origin body.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use lol_html::errors::RewritingError;
use lol_html::html_content::Element;
use lol_html::{HtmlRewriter, OutputSink, Settings, element};
use std::io;
use tokio::sync::mpsc;
use tracing::debug;

use super::RewriteContext;
use crate::body::BoxError;

/// Elements and attributes holding resource references.
pub const REWRITE_TARGETS: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("img", "src"),
    ("script", "src"),
    ("form", "action"),
];

/// Chunks buffered between each stage of the streaming pipeline.
const CHANNEL_DEPTH: usize = 8;

/// Rewrites a complete in-memory document.
///
/// # Example
///
/// ```
/// use passage_core::codec::encode;
/// use passage_core::rewriter::{RewriteContext, html::rewrite_document};
/// use url::Url;
///
/// let ctx = RewriteContext::new(Url::parse("https://example.com/bar/").unwrap(), "/p/");
/// let out = rewrite_document(br#"<a href="/foo">x</a>"#, &ctx).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     format!(r#"<a href="/p/{}">x</a>"#, encode("https://example.com/foo"))
/// );
/// ```
pub fn rewrite_document(html: &[u8], ctx: &RewriteContext) -> Result<Vec<u8>, RewritingError> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = build_rewriter(ctx, |chunk: &[u8]| output.extend_from_slice(chunk));
    rewriter.write(html)?;
    rewriter.end()?;
    Ok(output)
}

/// Rewrites a document as it streams in, yielding rewritten chunks.
///
/// Must be called from within a Tokio runtime. Errors from the source
/// stream and from the rewriter are yielded as the final item.
pub fn rewrite_stream<S, E>(
    chunks: S,
    ctx: RewriteContext,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    let (input_tx, input_rx) = mpsc::channel(CHANNEL_DEPTH);
    let (output_tx, output_rx) = mpsc::channel(CHANNEL_DEPTH);

    tokio::spawn(pump_source(chunks, input_tx));
    tokio::task::spawn_blocking(move || rewrite_worker(input_rx, output_tx, ctx));

    futures::stream::unfold(output_rx, |mut output_rx| async move {
        output_rx.recv().await.map(|chunk| (chunk, output_rx))
    })
}

/// Feeds source chunks to the worker until either side stops.
async fn pump_source<S, E>(chunks: S, input_tx: mpsc::Sender<io::Result<Bytes>>)
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<BoxError>,
{
    let mut chunks = std::pin::pin!(chunks);
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|err| {
            let err: BoxError = err.into();
            io::Error::other(err)
        });
        let failed = chunk.is_err();
        if input_tx.send(chunk).await.is_err() || failed {
            break;
        }
    }
}

/// Runs the rewriter on a blocking thread, forwarding its output.
fn rewrite_worker(
    mut input_rx: mpsc::Receiver<io::Result<Bytes>>,
    output_tx: mpsc::Sender<io::Result<Bytes>>,
    ctx: RewriteContext,
) {
    let sink_tx = output_tx.clone();
    let mut rewriter = build_rewriter(&ctx, move |chunk: &[u8]| {
        if !chunk.is_empty() {
            let _ = sink_tx.blocking_send(Ok(Bytes::copy_from_slice(chunk)));
        }
    });

    while let Some(chunk) = input_rx.blocking_recv() {
        if output_tx.is_closed() {
            debug!(base = %ctx.base(), "Client went away, abandoning HTML rewrite");
            return;
        }

        let written = chunk.and_then(|bytes| {
            rewriter
                .write(&bytes)
                .map_err(|err| io::Error::other(err.to_string()))
        });
        if let Err(err) = written {
            let _ = output_tx.blocking_send(Err(err));
            return;
        }
    }

    if let Err(err) = rewriter.end() {
        let _ = output_tx.blocking_send(Err(io::Error::other(err.to_string())));
    }
}

/// Builds a rewriter with one handler per entry of [`REWRITE_TARGETS`].
fn build_rewriter<'h, O: OutputSink>(ctx: &'h RewriteContext, sink: O) -> HtmlRewriter<'h, O> {
    let element_content_handlers = REWRITE_TARGETS
        .iter()
        .map(move |&(tag, attribute)| {
            element!(format!("{tag}[{attribute}]"), move |el| {
                rewrite_attribute(el, attribute, ctx);
                Ok(())
            })
        })
        .collect();

    HtmlRewriter::new(
        Settings {
            element_content_handlers,
            ..Settings::default()
        },
        sink,
    )
}

/// Replaces one attribute value with its proxy path, if it resolves.
fn rewrite_attribute(el: &mut Element<'_, '_>, attribute: &str, ctx: &RewriteContext) {
    let Some(value) = el.get_attribute(attribute) else {
        return;
    };

    // attribute values come back with character references intact
    let value = html_escape::decode_html_entities(&value);
    let Some(proxied) = ctx.proxy_reference(&value) else {
        return;
    };

    if let Err(err) = el.set_attribute(attribute, &proxied) {
        debug!(attribute, error = %err, "Failed to set rewritten attribute");
    }
}

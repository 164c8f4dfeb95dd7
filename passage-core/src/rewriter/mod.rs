//! Link rewriting for fetched documents.
//!
//! Every resource reference found in a document is resolved against the
//! transaction's target URL and replaced by a proxy path carrying the
//! encoded absolute URL, so follow-up requests come back through the proxy.
//!
//! The strategy is picked from the response content type:
//! - [`RewriteStrategy::Html`]: streamed through [`html::rewrite_stream`]
//! - [`RewriteStrategy::Css`]: buffered and rewritten by [`css::rewrite_stylesheet`]
//! - [`RewriteStrategy::Passthrough`]: body forwarded untouched
//!
//! A reference that cannot be resolved is left exactly as it was; one bad
//! reference never aborts the document.

pub mod css;
pub mod html;

use tracing::trace;
use url::Url;

use crate::codec;

/// Per-document rewriting state: the base URL and the proxy prefix.
///
/// The base is always the decoded target of the transaction, never the
/// proxy's own URL and never an intermediate redirect location.
#[derive(Clone, Debug)]
pub struct RewriteContext {
    base: Url,
    prefix: String,
}

impl RewriteContext {
    /// Creates a context resolving against `base` and emitting `prefix` paths.
    pub fn new(base: Url, prefix: impl Into<String>) -> Self {
        Self {
            base,
            prefix: prefix.into(),
        }
    }

    /// The base URL references are resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves `reference` and returns the proxy path that replaces it.
    ///
    /// Returns `None` when the reference must stay untouched: blank values,
    /// fragment-only links, references that fail to resolve, and anything
    /// resolving to a scheme the proxy cannot fetch (`javascript:`,
    /// `mailto:`, `data:`...).
    ///
    /// # Example
    ///
    /// ```
    /// use passage_core::codec::encode;
    /// use passage_core::rewriter::RewriteContext;
    /// use url::Url;
    ///
    /// let ctx = RewriteContext::new(Url::parse("https://example.com/bar/").unwrap(), "/p/");
    /// assert_eq!(
    ///     ctx.proxy_reference("/foo").unwrap(),
    ///     format!("/p/{}", encode("https://example.com/foo"))
    /// );
    /// assert!(ctx.proxy_reference("#top").is_none());
    /// ```
    pub fn proxy_reference(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() || reference.starts_with('#') {
            return None;
        }

        let resolved = match self.base.join(reference) {
            Ok(url) => url,
            Err(err) => {
                trace!(reference, error = %err, "Leaving unresolvable reference untouched");
                return None;
            }
        };

        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }

        Some(format!("{}{}", self.prefix, codec::encode(resolved.as_str())))
    }
}

/// How a response body is treated, chosen from its content type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// Streamed HTML attribute rewriting.
    Html,
    /// Full-buffer CSS `url()` rewriting.
    Css,
    /// Body forwarded byte for byte.
    Passthrough,
}

impl RewriteStrategy {
    /// Selects the strategy for a `content-type` header value.
    ///
    /// Matching is done on the lowercased value, so parameters such as
    /// `; charset=UTF-8` and unusual casing do not matter.
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::Passthrough;
        };

        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/html") {
            Self::Html
        } else if content_type.contains("text/css") {
            Self::Css
        } else {
            Self::Passthrough
        }
    }

    /// Returns `true` if the body is transformed and its length changes.
    pub fn rewrites_body(self) -> bool {
        !matches!(self, Self::Passthrough)
    }
}

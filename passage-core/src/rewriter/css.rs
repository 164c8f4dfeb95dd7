//! CSS `url()` rewriting.
//!
//! Stylesheets are rewritten with a pattern substitution over the complete
//! text, so the body has to be buffered first. Memory use grows with the
//! stylesheet size; this is accepted for stylesheets, which are small next
//! to documents and media, and HTML keeps streaming.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use tracing::debug;

use super::RewriteContext;

/// `url(` + optional quote + body + optional whitespace + matching quote + `)`.
///
/// Quoted bodies are captured in groups 1 (double) and 2 (single); unquoted
/// bodies in group 3.
static CSS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i:url)\(\s*(?:"([^"]*)"|'([^']*)'|([^'"\s)][^)]*?))\s*\)"#)
        .expect("CSS url() pattern is valid")
});

/// Rewrites every resolvable `url()` in a stylesheet.
///
/// Each resolvable reference becomes `url('{prefix}{token}')`; references
/// that don't resolve keep their original text.
///
/// # Example
///
/// ```
/// use passage_core::codec::encode;
/// use passage_core::rewriter::{RewriteContext, css::rewrite_css};
/// use url::Url;
///
/// let ctx = RewriteContext::new(Url::parse("https://example.com/dir/").unwrap(), "/p/");
/// assert_eq!(
///     rewrite_css("body{background:url(img/x.png)}", &ctx),
///     format!(
///         "body{{background:url('/p/{}')}}",
///         encode("https://example.com/dir/img/x.png")
///     )
/// );
/// ```
pub fn rewrite_css(text: &str, ctx: &RewriteContext) -> String {
    CSS_URL
        .replace_all(text, |caps: &Captures<'_>| {
            let reference = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());

            match ctx.proxy_reference(reference) {
                Some(proxied) => format!("url('{proxied}')"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Rewrites a buffered stylesheet body.
///
/// Bodies that are not UTF-8 are returned unchanged.
pub fn rewrite_stylesheet<'a>(body: &'a [u8], ctx: &RewriteContext) -> Cow<'a, [u8]> {
    match std::str::from_utf8(body) {
        Ok(text) => Cow::Owned(rewrite_css(text, ctx).into_bytes()),
        Err(err) => {
            debug!(base = %ctx.base(), error = %err, "Stylesheet is not UTF-8, passing through");
            Cow::Borrowed(body)
        }
    }
}

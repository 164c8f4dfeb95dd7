//! Reversible URL tokens.
//!
//! A token is the base64 form of an absolute URL, carried in the path after
//! the proxy prefix. Tokens are emitted with the URL-safe alphabet and no
//! padding so they never introduce `+`, `/` or `=` into a path segment.
//! Decoding is lenient about the alphabet: tokens produced by a browser's
//! `btoa` (standard alphabet, padded) decode to the same URL.
//!
//! # Example
//!
//! ```
//! use passage_core::codec::{decode, encode};
//!
//! let token = encode("https://example.com/a?b=c");
//! assert_eq!(decode(&token).unwrap(), "https://example.com/a?b=c");
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;
use url::Url;

/// Reasons a token cannot be turned back into a target URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not valid base64, or the decoded bytes are not UTF-8.
    #[error("Invalid Base64 encoded URL.")]
    InvalidEncoding,

    /// The decoded text is not an absolute URL with a host.
    #[error("Decoded URL is not a valid URL.")]
    InvalidUrl,
}

/// Encodes an absolute URL into a path-safe token.
pub fn encode(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

/// Decodes a token back into the exact URL text it was produced from.
///
/// The returned string is the original text, not a normalised form, so
/// `decode(&encode(u)) == u` holds for any absolute URL `u`.
///
/// # Errors
///
/// - [`DecodeError::InvalidEncoding`] for empty tokens, characters outside
///   the base64 alphabets, or decoded bytes that are not UTF-8
/// - [`DecodeError::InvalidUrl`] when the text does not parse as an absolute
///   URL or has no host
pub fn decode(token: &str) -> Result<String, DecodeError> {
    let normalized = normalize_token(token);
    if normalized.is_empty() {
        return Err(DecodeError::InvalidEncoding);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|_| DecodeError::InvalidEncoding)?;
    let text = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidEncoding)?;

    match Url::parse(&text) {
        Ok(url) if url.has_host() => Ok(text),
        _ => Err(DecodeError::InvalidUrl),
    }
}

/// Maps the standard alphabet onto the URL-safe one and drops padding,
/// including padding that arrived percent-escaped.
fn normalize_token(token: &str) -> String {
    let mut trimmed = token;
    loop {
        if let Some(rest) = trimmed.strip_suffix('=') {
            trimmed = rest;
        } else if let Some(rest) = trimmed
            .strip_suffix("%3D")
            .or_else(|| trimmed.strip_suffix("%3d"))
        {
            trimmed = rest;
        } else {
            break;
        }
    }

    trimmed
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

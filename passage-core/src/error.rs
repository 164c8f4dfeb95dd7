//! Error types for Passage.
//!
//! Every failure is scoped to a single proxy transaction. Client-side
//! failures (bad path, bad token) become `400` responses with fixed
//! plain-text messages; origin failures become `5xx` responses.

use crate::codec::DecodeError;
use thiserror::Error;

/// Result type alias for Passage operations.
pub type Result<T> = std::result::Result<T, PassageError>;

/// Unified error type for Passage operations.
///
/// # Example
///
/// ```
/// use passage_core::error::PassageError;
/// use hyper::StatusCode;
///
/// let err = PassageError::EmptyToken("/assignment/".into());
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(
///     err.user_message(),
///     "Please provide a Base64 encoded URL after /assignment/"
/// );
/// ```
#[derive(Debug, Error)]
pub enum PassageError {
    /// Nothing follows the proxy prefix in the request path.
    #[error("Please provide a Base64 encoded URL after {0}")]
    EmptyToken(String),

    /// The token is not valid base64 text.
    #[error("Invalid Base64 encoded URL.")]
    InvalidEncoding,

    /// The token decodes, but not to a fetchable absolute URL.
    #[error("Decoded URL is not a valid URL.")]
    InvalidUrl,

    /// The origin could not be reached (DNS, TCP or TLS failure).
    #[error("Upstream connection failed: {0}")]
    UpstreamConnectionFailed(String),

    /// The origin did not answer in time.
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Failed to read or transform a response body.
    #[error("Body read error: {0}")]
    BodyReadError(String),

    /// HTTP client error (from reqwest).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[source] reqwest::Error),
}

impl From<DecodeError> for PassageError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidEncoding => Self::InvalidEncoding,
            DecodeError::InvalidUrl => Self::InvalidUrl,
        }
    }
}

impl From<reqwest::Error> for PassageError {
    /// Classifies a fetch failure into timeout, connection or generic client error.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(err.to_string())
        } else if err.is_connect() {
            Self::UpstreamConnectionFailed(err.to_string())
        } else {
            Self::HttpClientError(err)
        }
    }
}

impl PassageError {
    /// Returns the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> hyper::StatusCode {
        use hyper::StatusCode;

        match self {
            Self::EmptyToken(_) => StatusCode::BAD_REQUEST,
            Self::InvalidEncoding => StatusCode::BAD_REQUEST,
            Self::InvalidUrl => StatusCode::BAD_REQUEST,
            Self::UpstreamConnectionFailed(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::BodyReadError(_) => StatusCode::BAD_GATEWAY,
            Self::HttpClientError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the plain-text body sent to the client.
    ///
    /// Path and token failures carry their full diagnostic message; server
    /// side failures are reduced to a generic message that doesn't expose
    /// internal details.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyToken(_) | Self::InvalidEncoding | Self::InvalidUrl => self.to_string(),
            Self::UpstreamConnectionFailed(_) => "Could not connect to target".to_string(),
            Self::UpstreamTimeout(_) => "Target timeout".to_string(),
            Self::BodyReadError(_) => "Failed to read target response".to_string(),
            Self::HttpClientError(_) => "Bad gateway".to_string(),
        }
    }

    /// Returns true if this error should be logged at error level.
    ///
    /// Token and path failures are the client's mistake and are only
    /// logged at debug level.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::UpstreamConnectionFailed(_)
                | Self::UpstreamTimeout(_)
                | Self::BodyReadError(_)
                | Self::HttpClientError(_)
        )
    }
}

//! Error types for mail.tm API operations.

use reqwest::StatusCode;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// mail.tm API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Request did not complete within its timeout.
    #[error("Request timed out")]
    Timeout,

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The server rejected the address/password pair (HTTP 401).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Unexpected HTTP status.
    #[error("HTTP {status}{}", detail_suffix(.detail))]
    Status {
        /// Status code returned by the server.
        status: StatusCode,
        /// `detail` message from the response body, if any.
        detail: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl Error {
    /// Classifies a transport failure, separating timeouts from other errors.
    #[must_use]
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Returns true when the server rejected the credentials.
    #[must_use]
    pub const fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}

//! Error types for historical-data retrieval.
//!
//! Classifies failures into transient (retried with backoff) and permanent
//! (failed immediately), as required by the retry policy.

use thiserror::Error;

/// Errors that can occur while retrieving a historical-data page.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Non-success HTTP status other than 429.
    #[error("HTTP status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt or reason phrase.
        message: String,
    },

    /// HTTP 429 from the source.
    #[error("rate limited by source")]
    RateLimited {
        /// Parsed Retry-After hint, when the source sent one.
        retry_after_secs: Option<u64>,
    },

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The request URL could not be constructed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Retriever configuration is unusable (e.g. a malformed header).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transient failures persisted past the retry budget.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Total attempts issued, including the first.
        attempts: u32,
        /// The final transient error, stringified.
        last_error: String,
    },
}

impl RetrievalError {
    /// Creates a status error from code and message.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// True when the failure is worth retrying with backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidUrl(_) | Self::Configuration(_) | Self::RetriesExhausted { .. } => false,
        }
    }

    /// The source's Retry-After hint in seconds, if one was sent.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

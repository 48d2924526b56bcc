//! Source provider error types.

use thiserror::Error;

/// Result type for source provider operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur while resolving candidates from an upstream source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Provider is down, uncredentialed or rejected our credentials.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{0} request timed out")]
    Timeout(&'static str),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Translate a non-success HTTP status into an error.
    pub fn from_http_status(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::Unavailable(format!("{provider} rejected credentials ({status})")),
            _ => Self::Http {
                provider,
                status,
                message: message.into(),
            },
        }
    }

    /// Translate a transport error, keeping timeouts distinguishable.
    pub fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(provider)
        } else {
            Self::Network(err)
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }

    /// Check if a later call to the same provider could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Timeout(_) | SourceError::Network(_) => true,
            SourceError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

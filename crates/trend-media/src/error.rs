//! Error types for asset and compositing operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while acquiring imagery or rendering a poster.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Payload is not a decodable raster (markup, unknown magic, too large).
    #[error("Unsupported asset: {0}")]
    AssetUnsupported(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("No URL variants to try")]
    NoVariants,

    #[error("Composition failed: {0}")]
    CompositionFailed(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an unsupported asset error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::AssetUnsupported(message.into())
    }

    /// Create a composition failure error.
    pub fn composition_failed(message: impl Into<String>) -> Self {
        Self::CompositionFailed(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Translate an HTTP status for `url`.
    pub fn from_status(status: u16, url: &str) -> Self {
        match status {
            404 | 410 => Self::NotFound(url.to_string()),
            _ => Self::Http {
                status,
                url: url.to_string(),
            },
        }
    }

    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(url.to_string())
        } else {
            Self::Network(err)
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, MediaError::AssetUnsupported(_))
    }

    pub fn is_composition_failure(&self) -> bool {
        matches!(self, MediaError::CompositionFailed(_))
    }

    /// Check if the same URL could succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            MediaError::Timeout(_) | MediaError::Network(_) => true,
            MediaError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => Self::AssetUnsupported(e.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

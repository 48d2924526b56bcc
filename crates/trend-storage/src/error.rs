//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Why a poster object could not be published.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Credentials, bucket or public URL are missing or malformed.
    #[error("Storage not configured: {0}")]
    NotConfigured(String),

    /// The object key would escape the poster prefix or is empty.
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// The store refused the object; repeating the request will not help.
    #[error("Upload of {key} rejected: {message}")]
    Rejected { key: String, message: String },

    /// Throttling, 5xx or a dropped connection.
    #[error("Upload of {key} interrupted: {message}")]
    Transient { key: String, message: String },
}

impl StorageError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    pub fn rejected(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn transient(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Classify an upload failure by the HTTP status the store answered with.
    /// `None` means the request never got a response.
    pub fn from_status(key: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        match status {
            Some(408 | 429) | None => Self::transient(key, message),
            Some(s) if s >= 500 => Self::transient(key, message),
            Some(_) => Self::rejected(key, message),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transient { .. })
    }
}

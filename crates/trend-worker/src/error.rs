//! Worker error types.

use thiserror::Error;
use trend_models::Category;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Setup and publishing errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Source error: {0}")]
    Source(#[from] trend_sources::SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] trend_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] trend_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// The only error a `generate_poster` call returns.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline exhausted for {category}: {reason}")]
    Exhausted { category: Category, reason: String },
}

impl PipelineError {
    pub fn exhausted(category: Category, reason: impl Into<String>) -> Self {
        Self::Exhausted {
            category,
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            PipelineError::Exhausted { category, .. } => *category,
        }
    }
}

/// Copy generation failure. Always absorbed by the template fallback.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Text backend unavailable: {0}")]
    Unavailable(String),

    #[error("Text backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Text backend timed out")]
    Timeout,

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Generated copy is empty")]
    Empty,

    #[error("Generated copy does not mention {0:?}")]
    MissingSubject(String),
}

impl CopyError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

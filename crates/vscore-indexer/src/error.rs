//! Indexer error types.

use std::path::PathBuf;
use thiserror::Error;

pub type IndexerResult<T> = Result<T, IndexerError>;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input folder not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Segment {index} failed: {message}")]
    SegmentFailed { index: usize, message: String },

    #[error("Failed to write index to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Media error: {0}")]
    Media(#[from] vscore_media::MediaError),

    #[error("Model error: {0}")]
    Model(#[from] vscore_models::ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn segment_failed(index: usize, msg: impl Into<String>) -> Self {
        Self::SegmentFailed {
            index,
            message: msg.into(),
        }
    }

    /// Whether the error stops the whole run rather than one video.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::InputNotFound(_)
                | Self::NotADirectory(_)
                | Self::WriteFailed { .. }
        )
    }
}

//! Error types for model validation.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when a model violates its invariants.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Metric {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Invalid segment bounds: start={start}, end={end}")]
    InvalidSegment { start: f64, end: f64 },
}

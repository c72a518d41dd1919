//! Persisted data models for the segment quality index.
//!
//! This crate provides Serde-serializable types for:
//! - Per-segment score records (`ScoreMetrics`)
//! - Closed label sets for the categorical metrics
//! - Video segments and per-video bookkeeping
//! - The top-level index document written to disk

pub mod error;
pub mod index;
pub mod labels;
pub mod score;
pub mod segment;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use index::{IndexMetadata, SamplingInfo, VideoIndex, VideoMetadata};
pub use labels::{
    CameraMovement, ColorGradingStyle, ExposureClass, LabelParseError, LightingType, ShotSize,
    StabilizationType,
};
pub use score::{MetricInfo, ScoreMetrics, METRIC_INFO};
pub use segment::VideoSegment;

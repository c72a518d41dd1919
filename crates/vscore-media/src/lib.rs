#![deny(unreachable_patterns)]
//! Per-segment visual quality and style scoring.
//!
//! This crate provides:
//! - FFprobe/FFmpeg wrappers that probe a video and decode one segment's frames
//! - A [`FeatureExtractor`] seam over the vision primitives (OpenCV through the
//!   default `opencv` feature, with a statistics-only raster fallback)
//! - Fourteen frame metrics, scheduled on scalar and detection sampling tiers
//! - Segment aggregation into a persisted [`vscore_models::ScoreMetrics`] record

pub mod aggregate;
pub mod color;
pub mod config;
pub mod decode;
pub mod error;
pub mod extractor;
pub mod frame;
pub mod metrics;
pub mod probe;
pub mod sampler;
pub mod segment;
pub mod telemetry;

pub use aggregate::SegmentAggregator;
pub use config::{
    AnalysisConfig, FocusThresholds, MovementThresholds, SamplingPolicy, StabilizationThresholds,
};
pub use decode::{analysis_dimensions, FfmpegSource, FrameSource};
pub use error::{MediaError, MediaResult};
pub use extractor::{FeatureExtractor, RasterExtractor};
pub use frame::Frame;
pub use self::metrics::{FrameMetric, Judgment, MetricKind, MetricRegistry, Observation, Unavailable};
pub use probe::{probe_video, VideoInfo};
pub use sampler::{FramePlan, FrameSampler, FrameWindow};
pub use segment::{plan_segments, SegmentProcessor, SegmentSpan};

#[cfg(feature = "opencv")]
pub use extractor::OpenCvExtractor;

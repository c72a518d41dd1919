//! Indexer configuration.
//!
//! Built in three layers: defaults, then `VSCORE_*` environment variables,
//! then command-line flags. [`IndexerConfig::validate`] runs last.

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::warn;
use vscore_media::{AnalysisConfig, FeatureExtractor, RasterExtractor};

use crate::error::{IndexerError, IndexerResult};

/// Segments longer than this still work but blur the per-segment scores.
pub const LONG_SEGMENT_WARN_SECS: f64 = 10.0;

/// Vision backend used for feature extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExtractorKind {
    /// OpenCV primitives (the `opencv` feature, on by default)
    #[default]
    Opencv,
    /// Pixel statistics and sharpness only; vision metrics keep neutral defaults
    Raster,
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opencv => write!(f, "opencv"),
            Self::Raster => write!(f, "raster"),
        }
    }
}

impl ExtractorKind {
    /// Instantiate the backend.
    pub fn build(&self) -> IndexerResult<Arc<dyn FeatureExtractor>> {
        match self {
            Self::Opencv => build_opencv(),
            Self::Raster => Ok(Arc::new(RasterExtractor::new())),
        }
    }
}

#[cfg(feature = "opencv")]
fn build_opencv() -> IndexerResult<Arc<dyn FeatureExtractor>> {
    Ok(Arc::new(vscore_media::OpenCvExtractor::new()?))
}

#[cfg(not(feature = "opencv"))]
fn build_opencv() -> IndexerResult<Arc<dyn FeatureExtractor>> {
    Err(IndexerError::config_error(
        "the opencv extractor is not available in this build (enable the `opencv` feature)",
    ))
}

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Segment length in seconds
    pub segment_duration: f64,
    /// Maximum segments decoded and scored at once
    pub max_parallel_segments: usize,
    /// Downscale frames to this width before analysis
    pub analysis_width: Option<u32>,
    pub extractor: ExtractorKind,
    pub analysis: AnalysisConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            segment_duration: 1.0,
            max_parallel_segments: 4,
            analysis_width: None,
            extractor: ExtractorKind::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns. Unparseable values
    /// are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            segment_duration: lookup("VSCORE_SEGMENT_DURATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.segment_duration),
            max_parallel_segments: lookup("VSCORE_MAX_PARALLEL")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_parallel_segments),
            analysis_width: lookup("VSCORE_ANALYSIS_WIDTH")
                .and_then(|s| s.parse().ok())
                .or(defaults.analysis_width),
            ..defaults
        }
    }

    pub fn with_segment_duration(mut self, seconds: f64) -> Self {
        self.segment_duration = seconds;
        self
    }

    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_segments = max;
        self
    }

    pub fn with_analysis_width(mut self, width: u32) -> Self {
        self.analysis_width = Some(width);
        self
    }

    pub fn with_extractor(mut self, extractor: ExtractorKind) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn validate(&self) -> IndexerResult<()> {
        if !(self.segment_duration.is_finite() && self.segment_duration > 0.0) {
            return Err(IndexerError::config_error(format!(
                "segment duration must be positive, got {}",
                self.segment_duration
            )));
        }
        if self.max_parallel_segments == 0 {
            return Err(IndexerError::config_error(
                "max parallel segments must be at least 1",
            ));
        }
        if self.analysis_width == Some(0) {
            return Err(IndexerError::config_error("analysis width must be positive"));
        }
        self.analysis
            .validate()
            .map_err(|e| IndexerError::config_error(e.to_string()))?;

        if self.segment_duration > LONG_SEGMENT_WARN_SECS {
            warn!(
                segment_duration = self.segment_duration,
                "Segments longer than {}s average away short events",
                LONG_SEGMENT_WARN_SECS
            );
        }
        Ok(())
    }
}

//! Video segment model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::score::ScoreMetrics;

/// A fixed-duration time window `[start_time, end_time)` of one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSegment {
    /// Source file name
    pub video_file: String,
    /// Start time in seconds (inclusive)
    pub start_time: f64,
    /// End time in seconds (exclusive)
    pub end_time: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Aggregated scores
    pub metrics: ScoreMetrics,
}

impl VideoSegment {
    /// Create a segment, rejecting empty or inverted bounds.
    pub fn new(
        video_file: impl Into<String>,
        start_time: f64,
        duration: f64,
        metrics: ScoreMetrics,
    ) -> ModelResult<Self> {
        let end_time = start_time + duration;
        if !start_time.is_finite() || start_time < 0.0 || !(duration > 0.0) {
            return Err(ModelError::InvalidSegment {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            video_file: video_file.into(),
            start_time,
            end_time,
            duration,
            metrics,
        })
    }

    /// Create a segment from its bounds, keeping `end_time` exactly as given
    /// so that a neighbour starting there does not overlap.
    pub fn from_bounds(
        video_file: impl Into<String>,
        start_time: f64,
        end_time: f64,
        metrics: ScoreMetrics,
    ) -> ModelResult<Self> {
        if !start_time.is_finite() || start_time < 0.0 || !end_time.is_finite() || !(end_time > start_time) {
            return Err(ModelError::InvalidSegment {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            video_file: video_file.into(),
            start_time,
            end_time,
            duration: end_time - start_time,
            metrics,
        })
    }

    /// True when both segments come from the same video and their half-open
    /// intervals intersect.
    pub fn overlaps_with(&self, other: &VideoSegment) -> bool {
        if self.video_file != other.video_file {
            return false;
        }
        !(self.end_time <= other.start_time || self.start_time >= other.end_time)
    }

    /// True when `t` falls inside `[start_time, end_time)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t < self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(file: &str, start: f64, duration: f64) -> VideoSegment {
        VideoSegment::new(file, start, duration, ScoreMetrics::default()).unwrap()
    }

    #[test]
    fn test_adjacent_segments_do_not_overlap() {
        let a = segment("a.mp4", 0.0, 1.0);
        let b = segment("a.mp4", 1.0, 1.0);
        assert!(!a.overlaps_with(&b));
        assert!(!b.overlaps_with(&a));
    }

    #[test]
    fn test_from_bounds_keeps_end_exact() {
        let fps = 29.97;
        let first = VideoSegment::from_bounds("a.mp4", 0.0, 29.0 / fps, ScoreMetrics::default())
            .unwrap();
        let second =
            VideoSegment::from_bounds("a.mp4", 29.0 / fps, 58.0 / fps, ScoreMetrics::default())
                .unwrap();
        assert_eq!(first.end_time, second.start_time);
        assert!(!first.overlaps_with(&second));
        assert!((first.duration - 29.0 / fps).abs() < 1e-12);
        assert!(VideoSegment::from_bounds("a.mp4", 1.0, 1.0, ScoreMetrics::default()).is_err());
    }

    #[test]
    fn test_intersecting_segments_overlap() {
        let a = segment("a.mp4", 0.0, 2.0);
        let b = segment("a.mp4", 1.5, 1.0);
        assert!(a.overlaps_with(&b));
        assert!(b.overlaps_with(&a));
    }

    #[test]
    fn test_different_videos_never_overlap() {
        let a = segment("a.mp4", 0.0, 2.0);
        let b = segment("b.mp4", 0.0, 2.0);
        assert!(!a.overlaps_with(&b));
    }

    #[test]
    fn test_contains_is_half_open() {
        let a = segment("a.mp4", 1.0, 1.0);
        assert!(a.contains(1.0));
        assert!(a.contains(1.999));
        assert!(!a.contains(2.0));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(VideoSegment::new("a.mp4", 0.0, 0.0, ScoreMetrics::default()).is_err());
        assert!(VideoSegment::new("a.mp4", -1.0, 1.0, ScoreMetrics::default()).is_err());
        assert!(VideoSegment::new("a.mp4", 0.0, f64::NAN, ScoreMetrics::default()).is_err());
    }

    #[test]
    fn test_end_time_derived_from_duration() {
        let a = segment("a.mp4", 2.0, 0.5);
        assert!((a.end_time - 2.5).abs() < 0.001);
    }
}

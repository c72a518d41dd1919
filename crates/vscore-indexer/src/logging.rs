//! Structured per-video logging.
//!
//! Every line carries the run ID and the video name so one video's progress
//! can be followed through concurrent segment work.

use tracing::{error, info, warn, Span};

/// Video logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct VideoLogger {
    run_id: String,
    video: String,
}

impl VideoLogger {
    /// Create a logger for `video` within indexing run `run_id`.
    pub fn new(run_id: &str, video: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            video: video.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            "Video started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            "Video progress: {}", message
        );
    }

    /// Log a skipped segment.
    pub fn log_segment_skipped(&self, segment: usize, reason: &str) {
        warn!(
            run_id = %self.run_id,
            video = %self.video,
            segment,
            "Segment skipped: {}", reason
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            video = %self.video,
            "Video failed: {}", message
        );
    }

    pub fn log_completion(&self, segments: usize, elapsed_secs: f64) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            segments,
            elapsed_secs,
            "Video indexed"
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    /// Span for everything done on behalf of this video.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "video",
            run_id = %self.run_id,
            video = %self.video
        )
    }
}

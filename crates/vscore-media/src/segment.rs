//! Scoring of one segment's frames.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use vscore_models::ScoreMetrics;

use crate::aggregate::SegmentAggregator;
use crate::config::AnalysisConfig;
use crate::extractor::FeatureExtractor;
use crate::frame::Frame;
use crate::metrics::{FrameInput, Judgment, MetricRegistry, Observation};
use crate::probe::VideoInfo;
use crate::sampler::{FrameSampler, FrameWindow};
use crate::telemetry;

/// Frame range of one segment within a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpan {
    /// Zero-based segment number
    pub index: usize,
    pub start_frame: u64,
    /// Frames requested (a full segment)
    pub num_frames: usize,
    /// Start time in seconds
    pub start_time: f64,
}

impl SegmentSpan {
    /// Fewest decoded frames for the segment to be kept.
    pub fn min_frames(&self) -> usize {
        (self.num_frames / 2).max(1)
    }

    /// End time of the segment given how many frames were actually decoded.
    ///
    /// `None` when too few frames came back. A full read ends exactly where
    /// the next span starts; a short tail ends after its last frame.
    pub fn end_time_for(&self, frames_read: usize, fps: f64) -> Option<f64> {
        if frames_read < self.min_frames() || !(fps > 0.0) {
            return None;
        }
        Some(frame_time(self.start_frame + frames_read.min(self.num_frames) as u64, fps))
    }
}

fn frame_time(frame: u64, fps: f64) -> f64 {
    frame as f64 / fps
}

/// Split a video into consecutive fixed-length segments.
///
/// Segment `k` starts at frame `k * floor(fps * segment_duration)`. Every
/// start inside the stream yields a span; whether a short tail is kept is
/// decided after decoding, by [`SegmentSpan::end_time_for`].
pub fn plan_segments(info: &VideoInfo, segment_duration: f64) -> Vec<SegmentSpan> {
    if !(info.fps > 0.0 && segment_duration > 0.0) {
        return Vec::new();
    }
    let frames_per_segment = ((info.fps * segment_duration) as u64).max(1);
    (0..info.total_frames)
        .step_by(frames_per_segment as usize)
        .enumerate()
        .map(|(index, start_frame)| SegmentSpan {
            index,
            start_frame,
            num_frames: frames_per_segment as usize,
            start_time: frame_time(start_frame, info.fps),
        })
        .collect()
}

/// Drives sampling, metric evaluation and aggregation for a segment.
///
/// Frames are processed strictly in order. Cheap to clone; the registry and
/// extractor are shared.
#[derive(Clone)]
pub struct SegmentProcessor {
    sampler: FrameSampler,
    registry: Arc<MetricRegistry>,
    extractor: Arc<dyn FeatureExtractor>,
}

impl SegmentProcessor {
    /// Processor running the standard metric set.
    pub fn new(config: &AnalysisConfig, extractor: Arc<dyn FeatureExtractor>) -> Self {
        Self::with_registry(
            config,
            Arc::new(MetricRegistry::standard(config)),
            extractor,
        )
    }

    pub fn with_registry(
        config: &AnalysisConfig,
        registry: Arc<MetricRegistry>,
        extractor: Arc<dyn FeatureExtractor>,
    ) -> Self {
        Self {
            sampler: FrameSampler::new(config.sampling),
            registry,
            extractor,
        }
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Score a segment.
    pub fn process(&self, frames: Vec<Frame>) -> ScoreMetrics {
        let started = Instant::now();
        let frame_count = frames.len();
        let observations = self.observe(frames);
        let metrics = SegmentAggregator::aggregate(&observations);

        telemetry::record_segment_duration(started.elapsed().as_secs_f64());
        debug!(
            frames = frame_count,
            observations = observations.len(),
            found = observations.iter().filter(|o| o.is_found()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Segment scored"
        );
        metrics
    }

    /// Per-frame observations in frame order, before aggregation.
    pub fn observe(&self, frames: Vec<Frame>) -> Vec<Observation<Judgment>> {
        let mut window = FrameWindow::new();
        let mut observations = Vec::new();

        for (index, frame) in frames.into_iter().enumerate() {
            if !self.sampler.is_scalar(index) {
                continue;
            }
            let plan = self.sampler.plan(index, !window.is_empty());
            window.advance(frame);
            let Some(current) = window.current() else {
                continue;
            };
            let input = FrameInput::new(current, window.previous());
            observations.extend(
                self.registry
                    .evaluate(&plan, &input, self.extractor.as_ref()),
            );
        }

        observations
    }
}

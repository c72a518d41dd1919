//! The persisted index document.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::score::ScoreMetrics;
use crate::segment::VideoSegment;

/// Per-video bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    /// Number of segments written for this video
    pub segment_count: usize,
    /// Path the video was read from
    pub file_path: String,
    /// Whether indexing succeeded
    pub indexed: bool,
    /// Error message when indexing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl VideoMetadata {
    /// Metadata for a successfully indexed video.
    pub fn indexed(file_path: impl Into<String>, segment_count: usize) -> Self {
        Self {
            segment_count,
            file_path: file_path.into(),
            indexed: true,
            error: None,
            duration_secs: None,
            fps: None,
            width: None,
            height: None,
        }
    }

    /// Metadata for a video that could not be indexed.
    pub fn failed(file_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            segment_count: 0,
            file_path: file_path.into(),
            indexed: false,
            error: Some(error.into()),
            duration_secs: None,
            fps: None,
            width: None,
            height: None,
        }
    }

    /// Attach probe facts.
    pub fn with_probe(mut self, duration_secs: f64, fps: f64, width: u32, height: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self.fps = Some(fps);
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Frame sampling policy recorded alongside the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SamplingInfo {
    /// Scalar metrics run on every Nth frame
    pub scalar_stride: usize,
    /// Person detection and cinematic classifiers run on every Nth frame
    pub detection_stride: usize,
}

/// Index-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndexMetadata {
    pub created_at: DateTime<Utc>,
    pub segment_duration: f64,
    pub total_segments: usize,
    pub total_videos: usize,
    pub indexed_videos: usize,
    pub available_metrics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingInfo>,
}

/// The full index document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoIndex {
    pub metadata: IndexMetadata,
    /// Per-video bookkeeping keyed by file name
    pub videos: BTreeMap<String, VideoMetadata>,
    pub segments: Vec<VideoSegment>,
}

impl VideoIndex {
    /// Assemble an index, deriving the totals from its contents.
    pub fn new(
        segment_duration: f64,
        sampling: Option<SamplingInfo>,
        videos: BTreeMap<String, VideoMetadata>,
        segments: Vec<VideoSegment>,
    ) -> Self {
        let metadata = IndexMetadata {
            created_at: Utc::now(),
            segment_duration,
            total_segments: segments.len(),
            total_videos: videos.len(),
            indexed_videos: videos.values().filter(|v| v.indexed).count(),
            available_metrics: ScoreMetrics::metric_names()
                .into_iter()
                .map(String::from)
                .collect(),
            sampling,
        };
        Self {
            metadata,
            videos,
            segments,
        }
    }

    /// Segments belonging to one video, in time order.
    pub fn segments_for<'a>(&'a self, video_file: &'a str) -> impl Iterator<Item = &'a VideoSegment> {
        self.segments
            .iter()
            .filter(move |s| s.video_file == video_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(file: &str, start: f64) -> VideoSegment {
        VideoSegment::new(file, start, 1.0, ScoreMetrics::default()).unwrap()
    }

    #[test]
    fn test_index_totals() {
        let mut videos = BTreeMap::new();
        videos.insert("a.mp4".to_string(), VideoMetadata::indexed("/in/a.mp4", 2));
        videos.insert(
            "b.mp4".to_string(),
            VideoMetadata::failed("/in/b.mp4", "Could not open video"),
        );
        let index = VideoIndex::new(
            1.0,
            None,
            videos,
            vec![segment("a.mp4", 0.0), segment("a.mp4", 1.0)],
        );

        assert_eq!(index.metadata.total_segments, 2);
        assert_eq!(index.metadata.total_videos, 2);
        assert_eq!(index.metadata.indexed_videos, 1);
        assert_eq!(index.metadata.available_metrics.len(), 30);
        assert_eq!(index.segments_for("a.mp4").count(), 2);
        assert_eq!(index.segments_for("b.mp4").count(), 0);
    }

    #[test]
    fn test_failed_video_serializes_error() {
        let json = serde_json::to_value(VideoMetadata::failed("/in/b.mp4", "boom")).unwrap();
        assert_eq!(json["indexed"], false);
        assert_eq!(json["error"], "boom");
        assert_eq!(json["segment_count"], 0);
        assert!(json.get("fps").is_none());
    }

    #[test]
    fn test_indexed_video_omits_error() {
        let meta = VideoMetadata::indexed("/in/a.mp4", 3).with_probe(3.0, 30.0, 64, 48);
        let json = serde_json::to_value(meta).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["width"], 64);
    }

    #[test]
    fn test_index_roundtrip() {
        let mut videos = BTreeMap::new();
        videos.insert("a.mp4".to_string(), VideoMetadata::indexed("/in/a.mp4", 1));
        let index = VideoIndex::new(
            1.0,
            Some(SamplingInfo {
                scalar_stride: 3,
                detection_stride: 6,
            }),
            videos,
            vec![segment("a.mp4", 0.0)],
        );
        let json = serde_json::to_string_pretty(&index).unwrap();
        let parsed: VideoIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, index);
    }
}

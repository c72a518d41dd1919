//! Indexing metrics.
//!
//! Provides counters for monitoring an indexing run:
//! - Segments written and segments skipped
//! - Videos that could not be indexed

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Segments scored and written to the index.
    pub const SEGMENTS_INDEXED_TOTAL: &str = "vscore_segments_indexed_total";

    /// Segments skipped after a decode or scoring failure, by reason.
    pub const SEGMENTS_FAILED_TOTAL: &str = "vscore_segments_failed_total";

    /// Videos recorded with `indexed = false`.
    pub const VIDEOS_FAILED_TOTAL: &str = "vscore_videos_failed_total";
}

/// Record segments written for one video.
pub fn record_segments_indexed(count: usize) {
    counter!(names::SEGMENTS_INDEXED_TOTAL).increment(count as u64);
}

/// Record a skipped segment.
pub fn record_segment_failed(reason: &'static str) {
    counter!(
        names::SEGMENTS_FAILED_TOTAL,
        "reason" => reason
    )
    .increment(1);
}

/// Record a video that could not be indexed.
pub fn record_video_failed() {
    counter!(names::VIDEOS_FAILED_TOTAL).increment(1);
}

//! Analysis metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops until the host
//! process installs a recorder.

use metrics::{counter, histogram};

use crate::metrics::MetricKind;

/// Metric name constants for consistency.
pub mod names {
    /// Detector errors swallowed by a metric, by metric family.
    pub const DETECTOR_FAILURES_TOTAL: &str = "vscore_detector_failures_total";

    /// Wall time spent scoring one segment's frames.
    pub const SEGMENT_PROCESSING_SECONDS: &str = "vscore_segment_processing_seconds";
}

/// Record a detector failure for `kind`.
pub fn record_detector_failure(kind: MetricKind) {
    counter!(
        names::DETECTOR_FAILURES_TOTAL,
        "metric" => kind.as_str()
    )
    .increment(1);
}

/// Record how long a segment took to score.
pub fn record_segment_duration(seconds: f64) {
    histogram!(names::SEGMENT_PROCESSING_SECONDS).record(seconds);
}

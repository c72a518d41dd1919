//! Vision primitives behind a single seam.
//!
//! Metrics never touch pixels directly for anything heavier than a mean;
//! they ask a [`FeatureExtractor`] for flow, tracked features, detections,
//! statistics and edge maps. Two backends exist:
//!
//! - `OpenCvExtractor`: Farneback flow, LK tracking with RANSAC affine
//!   estimation, HOG people detection, Canny contours (`opencv` feature,
//!   on by default)
//! - [`RasterExtractor`]: pixel statistics and Laplacian sharpness only, for
//!   builds without OpenCV; every other signal reports
//!   [`MediaError::DetectorUnavailable`](crate::error::MediaError)

pub mod raster;
pub mod signals;

#[cfg(feature = "opencv")]
pub mod opencv;

#[cfg(test)]
pub(crate) mod synthetic;

pub use raster::RasterExtractor;
pub use signals::{
    AffineMotion, BoundingBox, ChannelStats, ChannelSummary, ColorSpace, Contour,
    Correspondence, EdgeAnalysis, FlowParams, FlowStats, Histogram, SharpnessMap, ValueBands,
};

#[cfg(feature = "opencv")]
pub use self::opencv::OpenCvExtractor;

use crate::error::MediaResult;
use crate::frame::Frame;

/// Minimum good correspondences for an affine estimate to be trusted.
pub const MIN_AFFINE_CORRESPONDENCES: usize = 15;

/// Raw visual signal provider.
///
/// Implementations must be shareable across segment workers.
#[cfg_attr(test, mockall::automock)]
pub trait FeatureExtractor: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Dense optical flow from `prev` to `frame`.
    fn compute_flow(&self, frame: &Frame, prev: &Frame, params: &FlowParams)
        -> MediaResult<FlowStats>;

    /// Robust similarity transform from `prev` to `frame`.
    ///
    /// Returns `None` when fewer than [`MIN_AFFINE_CORRESPONDENCES`] + 1 good
    /// correspondences survive tracking.
    fn track_features(&self, prev: &Frame, frame: &Frame) -> MediaResult<Option<AffineMotion>>;

    /// Tracked feature correspondences from `prev` to `frame`.
    fn track_correspondences(&self, prev: &Frame, frame: &Frame)
        -> MediaResult<Vec<Correspondence>>;

    /// Person bounding boxes.
    fn detect_persons(&self, frame: &Frame) -> MediaResult<Vec<BoundingBox>>;

    /// Per-channel mean, standard deviation, min and max.
    fn channel_stats(&self, frame: &Frame, space: ColorSpace) -> MediaResult<ChannelStats>;

    /// Normalized 256-bin histogram of one channel.
    fn histogram(&self, frame: &Frame, space: ColorSpace, channel: usize)
        -> MediaResult<Histogram>;

    /// Mean RGB of pixels with HSV value below `low` and above `high`.
    fn value_bands(&self, frame: &Frame, low: u8, high: u8) -> MediaResult<ValueBands>;

    /// Laplacian variance of the whole frame.
    fn sharpness(&self, frame: &Frame) -> MediaResult<f64>;

    /// Laplacian variance, globally and over a `grid x grid` partition.
    fn sharpness_map(&self, frame: &Frame, grid: usize) -> MediaResult<SharpnessMap>;

    /// Canny edges, external contours and the Sobel-y row profile.
    fn edges_and_contours(&self, frame: &Frame) -> MediaResult<EdgeAnalysis>;
}

//! Deterministic extractor for tests.
//!
//! Motion signals are fixed up front; pixel statistics come from the raster
//! backend and edges from a plain brightness threshold.

use image::{GrayImage, Luma};

use super::signals::{
    AffineMotion, BoundingBox, ChannelStats, ColorSpace, Contour, Correspondence, EdgeAnalysis,
    FlowParams, FlowStats, Histogram, SharpnessMap, ValueBands,
};
use super::{FeatureExtractor, RasterExtractor};
use crate::error::MediaResult;
use crate::frame::Frame;

#[derive(Debug, Clone, Default)]
pub struct SyntheticExtractor {
    pub flow: FlowStats,
    pub affine: Option<AffineMotion>,
    pub persons: Vec<BoundingBox>,
    stats: RasterExtractor,
}

impl SyntheticExtractor {
    /// No motion, nothing tracked, nobody in frame.
    pub fn still() -> Self {
        Self::default()
    }

    pub fn with_flow(mut self, flow: FlowStats) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_affine(mut self, affine: AffineMotion) -> Self {
        self.affine = Some(affine);
        self
    }

    pub fn with_persons(mut self, persons: Vec<BoundingBox>) -> Self {
        self.persons = persons;
        self
    }
}

impl FeatureExtractor for SyntheticExtractor {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn compute_flow(
        &self,
        _frame: &Frame,
        _prev: &Frame,
        _params: &FlowParams,
    ) -> MediaResult<FlowStats> {
        Ok(self.flow)
    }

    fn track_features(&self, _prev: &Frame, _frame: &Frame) -> MediaResult<Option<AffineMotion>> {
        Ok(self.affine)
    }

    /// A 6x6 lattice moved by the configured translation.
    fn track_correspondences(
        &self,
        prev: &Frame,
        _frame: &Frame,
    ) -> MediaResult<Vec<Correspondence>> {
        let motion = self.affine.unwrap_or_default();
        let (w, h) = (prev.width() as f64, prev.height() as f64);
        Ok((0..36)
            .map(|i| {
                let x = w * ((i % 6) as f64 + 0.5) / 6.0;
                let y = h * ((i / 6) as f64 + 0.5) / 6.0;
                Correspondence::new((x, y), (x + motion.tx, y + motion.ty))
            })
            .collect())
    }

    fn detect_persons(&self, _frame: &Frame) -> MediaResult<Vec<BoundingBox>> {
        Ok(self.persons.clone())
    }

    fn channel_stats(&self, frame: &Frame, space: ColorSpace) -> MediaResult<ChannelStats> {
        self.stats.channel_stats(frame, space)
    }

    fn histogram(&self, frame: &Frame, space: ColorSpace, channel: usize) -> MediaResult<Histogram> {
        self.stats.histogram(frame, space, channel)
    }

    fn value_bands(&self, frame: &Frame, low: u8, high: u8) -> MediaResult<ValueBands> {
        self.stats.value_bands(frame, low, high)
    }

    fn sharpness(&self, frame: &Frame) -> MediaResult<f64> {
        self.stats.sharpness(frame)
    }

    fn sharpness_map(&self, frame: &Frame, grid: usize) -> MediaResult<SharpnessMap> {
        self.stats.sharpness_map(frame, grid)
    }

    /// Pixels at or above mid-grey form the single contour.
    fn edges_and_contours(&self, frame: &Frame) -> MediaResult<EdgeAnalysis> {
        let gray = frame.gray();
        let (w, h) = (gray.width(), gray.height());
        let edges = GrayImage::from_fn(w, h, |x, y| {
            Luma([if gray.get_pixel(x, y).0[0] >= 128 { 255 } else { 0 }])
        });

        let (mut x0, mut y0, mut x1, mut y1, mut count) = (w, h, 0, 0, 0u64);
        for (x, y, px) in edges.enumerate_pixels() {
            if px.0[0] > 0 {
                x0 = x0.min(x);
                y0 = y0.min(y);
                x1 = x1.max(x);
                y1 = y1.max(y);
                count += 1;
            }
        }
        let contours = if count > 0 {
            vec![Contour {
                bbox: BoundingBox::new(
                    x0 as f64,
                    y0 as f64,
                    (x1 - x0 + 1) as f64,
                    (y1 - y0 + 1) as f64,
                ),
                area: count as f64,
            }]
        } else {
            Vec::new()
        };

        let row_gradient = (0..h)
            .map(|y| {
                let next = (y + 1).min(h - 1);
                (0..w)
                    .map(|x| {
                        (gray.get_pixel(x, next).0[0] as f64 - gray.get_pixel(x, y).0[0] as f64)
                            .abs()
                    })
                    .sum()
            })
            .collect();

        Ok(EdgeAnalysis {
            edges,
            contours,
            row_gradient,
        })
    }
}

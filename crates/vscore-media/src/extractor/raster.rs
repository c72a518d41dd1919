//! Statistics-only feature extractor.
//!
//! Covers what is a plain reduction over the cached color planes: channel
//! statistics, histograms, value bands and Laplacian sharpness. Flow,
//! tracking, person detection and edge analysis need OpenCV; here they
//! report [`MediaError::DetectorUnavailable`] and the dependent metrics fall
//! back to their neutral defaults.

use image::GrayImage;
use rayon::prelude::*;

use super::signals::{
    AffineMotion, BoundingBox, ChannelStats, ChannelSummary, ColorSpace, Correspondence,
    EdgeAnalysis, FlowParams, FlowStats, Histogram, SharpnessMap, ValueBands,
};
use super::FeatureExtractor;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Feature extractor built on the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterExtractor;

impl RasterExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn unavailable<T>(signal: &str) -> MediaResult<T> {
    Err(MediaError::DetectorUnavailable(format!(
        "raster backend has no {signal}"
    )))
}

impl FeatureExtractor for RasterExtractor {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn compute_flow(
        &self,
        _frame: &Frame,
        _prev: &Frame,
        _params: &FlowParams,
    ) -> MediaResult<FlowStats> {
        unavailable("optical flow")
    }

    fn track_features(&self, _prev: &Frame, _frame: &Frame) -> MediaResult<Option<AffineMotion>> {
        unavailable("feature tracker")
    }

    fn track_correspondences(
        &self,
        _prev: &Frame,
        _frame: &Frame,
    ) -> MediaResult<Vec<Correspondence>> {
        unavailable("feature tracker")
    }

    fn detect_persons(&self, _frame: &Frame) -> MediaResult<Vec<BoundingBox>> {
        unavailable("person detector")
    }

    fn channel_stats(&self, frame: &Frame, space: ColorSpace) -> MediaResult<ChannelStats> {
        let channels = match space {
            ColorSpace::Gray => vec![summarize(frame.gray().as_raw(), 1, 0)],
            ColorSpace::Rgb => summarize3(frame.rgb().as_raw()),
            ColorSpace::Lab => summarize3(frame.lab().as_raw()),
            ColorSpace::Hsv => summarize3(frame.hsv().as_raw()),
        };
        Ok(ChannelStats { space, channels })
    }

    fn histogram(&self, frame: &Frame, space: ColorSpace, channel: usize) -> MediaResult<Histogram> {
        if channel >= space.channels() {
            return Err(MediaError::InvalidFrame(format!(
                "channel {} out of range for {:?}",
                channel, space
            )));
        }
        let (raw, stride) = match space {
            ColorSpace::Gray => (frame.gray().as_raw(), 1),
            ColorSpace::Rgb => (frame.rgb().as_raw(), 3),
            ColorSpace::Lab => (frame.lab().as_raw(), 3),
            ColorSpace::Hsv => (frame.hsv().as_raw(), 3),
        };
        let mut counts = [0u64; 256];
        for px in raw.chunks_exact(stride) {
            counts[px[channel] as usize] += 1;
        }
        Ok(Histogram::from_counts(&counts))
    }

    fn value_bands(&self, frame: &Frame, low: u8, high: u8) -> MediaResult<ValueBands> {
        let mut shadows = ([0.0; 3], 0usize);
        let mut highlights = ([0.0; 3], 0usize);
        for (rgb, hsv) in frame.rgb().pixels().zip(frame.hsv().pixels()) {
            let v = hsv.0[2];
            let band = if v < low {
                &mut shadows
            } else if v > high {
                &mut highlights
            } else {
                continue;
            };
            for c in 0..3 {
                band.0[c] += rgb.0[c] as f64;
            }
            band.1 += 1;
        }
        let mean = |(sum, n): ([f64; 3], usize)| {
            (n > 0).then(|| [sum[0] / n as f64, sum[1] / n as f64, sum[2] / n as f64])
        };
        Ok(ValueBands {
            shadows: mean(shadows),
            highlights: mean(highlights),
        })
    }

    fn sharpness(&self, frame: &Frame) -> MediaResult<f64> {
        let gray = frame.gray();
        Ok(laplacian_variance(gray, 0, 0, gray.width() as usize, gray.height() as usize))
    }

    fn sharpness_map(&self, frame: &Frame, grid: usize) -> MediaResult<SharpnessMap> {
        let gray = frame.gray();
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let grid = grid.max(1);
        let cells = (0..grid * grid)
            .into_par_iter()
            .map(|i| {
                let (row, col) = (i / grid, i % grid);
                laplacian_variance(
                    gray,
                    col * w / grid,
                    row * h / grid,
                    (col + 1) * w / grid,
                    (row + 1) * h / grid,
                )
            })
            .collect();
        Ok(SharpnessMap {
            global: self.sharpness(frame)?,
            grid,
            cells,
        })
    }

    fn edges_and_contours(&self, _frame: &Frame) -> MediaResult<EdgeAnalysis> {
        unavailable("edge detector")
    }
}

/// Reflect an index into `0..n` without repeating the edge sample.
#[inline]
fn reflect101(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

fn summarize(raw: &[u8], stride: usize, channel: usize) -> ChannelSummary {
    let mut n = 0usize;
    let (mut sum, mut sum_sq) = (0.0, 0.0);
    let (mut min, mut max) = (f64::MAX, f64::MIN);
    for px in raw.chunks_exact(stride) {
        let v = px[channel] as f64;
        sum += v;
        sum_sq += v * v;
        min = min.min(v);
        max = max.max(v);
        n += 1;
    }
    if n == 0 {
        return ChannelSummary::default();
    }
    let mean = sum / n as f64;
    let var = (sum_sq / n as f64 - mean * mean).max(0.0);
    ChannelSummary {
        mean,
        std: var.sqrt(),
        min,
        max,
    }
}

fn summarize3(raw: &[u8]) -> Vec<ChannelSummary> {
    (0..3).map(|c| summarize(raw, 3, c)).collect()
}

/// 4-neighbour Laplacian variance over `[x0, x1) x [y0, y1)`, with borders
/// reflected inside the rectangle.
fn laplacian_variance(gray: &GrayImage, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
    if x1 <= x0 || y1 <= y0 {
        return 0.0;
    }
    let (w, h) = (x1 - x0, y1 - y0);
    let stride = gray.width() as usize;
    let data = gray.as_raw();
    let at = |x: isize, y: isize| -> f64 {
        let rx = x0 + reflect101(x, w);
        let ry = y0 + reflect101(y, h);
        data[ry * stride + rx] as f64
    };

    let n = (w * h) as f64;
    let (mut sum, mut sum_sq) = (0.0, 0.0);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let v = at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4.0 * at(x, y);
            sum += v;
            sum_sq += v * v;
        }
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

//! Raw per-frame signals produced by a [`FeatureExtractor`](super::FeatureExtractor).
//!
//! These are ephemeral: metrics turn them into judgments and they are never
//! persisted.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Dense optical-flow summary between two frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowStats {
    /// Mean flow vector magnitude (pixels)
    pub magnitude_mean: f64,
    /// Standard deviation of flow magnitude
    pub magnitude_std: f64,
    /// Mean horizontal flow
    pub mean_dx: f64,
    /// Mean vertical flow
    pub mean_dy: f64,
    /// Median projection of flow onto the outward direction from frame center.
    /// Positive when content expands away from center.
    pub radial_median: f64,
}

/// Farneback dense-flow parameters.
///
/// The motion score and the camera movement cascade were tuned against
/// different pyramids, so each metric asks for its own set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    pub pyr_scale: f64,
    pub levels: i32,
    pub winsize: i32,
    pub iterations: i32,
    pub poly_n: i32,
    pub poly_sigma: f64,
}

impl FlowParams {
    /// Shallow pyramid used by the motion score.
    pub const MOTION: FlowParams = FlowParams {
        pyr_scale: 0.5,
        levels: 3,
        winsize: 15,
        iterations: 3,
        poly_n: 5,
        poly_sigma: 1.2,
    };

    /// Deeper, smoother pyramid used for camera movement.
    pub const CAMERA: FlowParams = FlowParams {
        pyr_scale: 0.5,
        levels: 5,
        winsize: 21,
        iterations: 5,
        poly_n: 7,
        poly_sigma: 1.5,
    };
}

/// Similarity transform estimated from tracked features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMotion {
    pub scale: f64,
    /// Rotation in degrees
    pub rotation_deg: f64,
    pub tx: f64,
    pub ty: f64,
}

impl AffineMotion {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            rotation_deg: 0.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Decompose a 2x3 affine matrix `[[a, c, tx], [b, d, ty]]`.
    ///
    /// Scale is the mean of the two column norms.
    pub fn from_matrix(m: [[f64; 3]; 2]) -> Self {
        let sx = (m[0][0] * m[0][0] + m[1][0] * m[1][0]).sqrt();
        let sy = (m[0][1] * m[0][1] + m[1][1] * m[1][1]).sqrt();
        Self {
            scale: (sx + sy) / 2.0,
            rotation_deg: m[1][0].atan2(m[0][0]).to_degrees(),
            tx: m[0][2],
            ty: m[1][2],
        }
    }
}

impl Default for AffineMotion {
    fn default() -> Self {
        Self::identity()
    }
}

/// One tracked feature: position in the previous frame and in the current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl Correspondence {
    pub fn new(from: (f64, f64), to: (f64, f64)) -> Self {
        Self { from, to }
    }

    /// Displacement `to - from`.
    pub fn displacement(&self) -> (f64, f64) {
        (self.to.0 - self.from.0, self.to.1 - self.from.1)
    }
}

/// Color space for channel statistics and histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Gray,
    Rgb,
    /// 8-bit LAB (L 0-255, a/b offset by 128)
    Lab,
    /// 8-bit HSV (H 0-180)
    Hsv,
}

impl ColorSpace {
    pub fn channels(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            _ => 3,
        }
    }
}

/// Summary statistics of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-channel statistics of one frame in one color space.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    pub space: ColorSpace,
    pub channels: Vec<ChannelSummary>,
}

impl ChannelStats {
    /// Summary of channel `i`; zeros when the channel does not exist.
    pub fn channel(&self, i: usize) -> ChannelSummary {
        self.channels.get(i).copied().unwrap_or_default()
    }
}

/// Normalized 256-bin histogram (bins sum to 1, or all zero for an empty image).
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<f64>,
}

impl Histogram {
    /// Build a normalized histogram from raw counts.
    pub fn from_counts(counts: &[u64]) -> Self {
        let total: u64 = counts.iter().sum();
        let bins = if total == 0 {
            vec![0.0; counts.len()]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        Self { bins }
    }

    /// Probability mass of bins in `[start, end)`.
    pub fn mass(&self, start: usize, end: usize) -> f64 {
        let end = end.min(self.bins.len());
        if start >= end {
            return 0.0;
        }
        self.bins[start..end].iter().sum()
    }

    /// Masses of four equal-width quartiles.
    pub fn quartiles(&self) -> [f64; 4] {
        let q = self.bins.len() / 4;
        [
            self.mass(0, q),
            self.mass(q, 2 * q),
            self.mass(2 * q, 3 * q),
            self.mass(3 * q, self.bins.len()),
        ]
    }
}

/// Mean RGB of the darkest and brightest pixel bands, split on HSV value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueBands {
    /// Mean `[r, g, b]` of pixels with V below the low threshold
    pub shadows: Option<[f64; 3]>,
    /// Mean `[r, g, b]` of pixels with V above the high threshold
    pub highlights: Option<[f64; 3]>,
}

/// Laplacian-variance sharpness, globally and per grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SharpnessMap {
    /// Laplacian variance over the whole frame
    pub global: f64,
    /// Grid dimension (cells per side)
    pub grid: usize,
    /// Row-major per-cell Laplacian variance
    pub cells: Vec<f64>,
}

impl SharpnessMap {
    pub fn cell(&self, row: usize, col: usize) -> f64 {
        self.cells.get(row * self.grid + col).copied().unwrap_or(0.0)
    }
}

/// An external contour and its bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contour {
    pub bbox: BoundingBox,
    /// Enclosed area in pixels
    pub area: f64,
}

/// Edge map, external contours and horizontal-edge row profile of a frame.
#[derive(Debug, Clone)]
pub struct EdgeAnalysis {
    /// Binary edge map (0 or 255)
    pub edges: GrayImage,
    pub contours: Vec<Contour>,
    /// Per-row sum of absolute vertical gradient (Sobel y)
    pub row_gradient: Vec<f64>,
}

impl EdgeAnalysis {
    /// Largest contour by area; the first one wins ties.
    pub fn largest_contour(&self) -> Option<&Contour> {
        self.contours
            .iter()
            .reduce(|best, c| if c.area > best.area { c } else { best })
    }

    /// Sum of edge intensities per cell of an `n x n` grid, row-major.
    pub fn grid_sums(&self, n: usize) -> Vec<f64> {
        let (w, h) = (self.edges.width() as usize, self.edges.height() as usize);
        let mut sums = vec![0.0; n * n];
        if w == 0 || h == 0 || n == 0 {
            return sums;
        }
        for row in 0..n {
            for col in 0..n {
                let mut total = 0.0;
                for y in row * h / n..(row + 1) * h / n {
                    for x in col * w / n..(col + 1) * w / n {
                        total += self.edges.get_pixel(x as u32, y as u32).0[0] as f64;
                    }
                }
                sums[row * n + col] = total;
            }
        }
        sums
    }

    /// Row index with the strongest horizontal edge response.
    pub fn dominant_row(&self) -> Option<usize> {
        self.row_gradient
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affine_from_matrix() {
        let angle = 2.0_f64.to_radians();
        let s = 1.05;
        let m = [
            [s * angle.cos(), -s * angle.sin(), 3.0],
            [s * angle.sin(), s * angle.cos(), -1.5],
        ];
        let motion = AffineMotion::from_matrix(m);
        assert!((motion.scale - 1.05).abs() < 1e-9);
        assert!((motion.rotation_deg - 2.0).abs() < 1e-9);
        assert!((motion.tx - 3.0).abs() < 1e-9);
        assert!((motion.ty + 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_mass_and_quartiles() {
        let mut counts = vec![0u64; 256];
        counts[10] = 1;
        counts[70] = 1;
        counts[130] = 1;
        counts[250] = 1;
        let hist = Histogram::from_counts(&counts);
        assert!((hist.mass(0, 256) - 1.0).abs() < 1e-9);
        for q in hist.quartiles() {
            assert!((q - 0.25).abs() < 1e-9);
        }
        assert!((hist.mass(200, 300) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_histogram_is_zero() {
        let hist = Histogram::from_counts(&[0; 256]);
        assert!(hist.mass(0, 256).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_row_first_max() {
        let analysis = EdgeAnalysis {
            edges: GrayImage::new(4, 4),
            contours: vec![],
            row_gradient: vec![1.0, 5.0, 5.0, 2.0],
        };
        assert_eq!(analysis.dominant_row(), Some(1));
        assert!(analysis.largest_contour().is_none());
    }

    #[test]
    fn test_bounding_box_center() {
        let bbox = BoundingBox::new(10.0, 20.0, 40.0, 60.0);
        assert!((bbox.cx() - 30.0).abs() < 0.001);
        assert!((bbox.cy() - 50.0).abs() < 0.001);
        assert!((bbox.area() - 2400.0).abs() < 0.001);
    }
}

//! Decoded video frame with lazily derived color planes.

use image::{GrayImage, ImageBuffer, Rgb, RgbImage};
use std::sync::OnceLock;

use crate::color::{rgb_to_gray, rgb_to_hsv8, rgb_to_lab8};
use crate::error::{MediaError, MediaResult};

/// Three-channel 8-bit plane whose channels are not RGB (HSV, LAB).
pub type Plane3 = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// One decoded RGB frame.
///
/// Grayscale, LAB and HSV planes and the global sharpness are computed on
/// first use and cached, so several metrics can share them without
/// recomputation.
#[derive(Debug)]
pub struct Frame {
    /// Zero-based index within its segment
    index: usize,
    rgb: RgbImage,
    gray: OnceLock<GrayImage>,
    lab: OnceLock<Plane3>,
    hsv: OnceLock<Plane3>,
    sharpness: OnceLock<f64>,
}

impl Frame {
    /// Wrap an RGB image.
    pub fn new(index: usize, rgb: RgbImage) -> Self {
        Self {
            index,
            rgb,
            gray: OnceLock::new(),
            lab: OnceLock::new(),
            hsv: OnceLock::new(),
            sharpness: OnceLock::new(),
        }
    }

    /// Build a frame from packed `rgb24` bytes.
    pub fn from_rgb24(index: usize, width: u32, height: u32, data: Vec<u8>) -> MediaResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(MediaError::InvalidFrame(format!(
                "expected {} bytes for {}x{} rgb24, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        let rgb = RgbImage::from_raw(width, height, data)
            .ok_or_else(|| MediaError::InvalidFrame("rgb24 buffer rejected".to_string()))?;
        Ok(Self::new(index, rgb))
    }

    /// A frame filled with a single color.
    pub fn solid(index: usize, width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(index, RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// Number of pixels.
    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn gray(&self) -> &GrayImage {
        self.gray.get_or_init(|| {
            GrayImage::from_fn(self.width(), self.height(), |x, y| {
                image::Luma([rgb_to_gray(self.rgb.get_pixel(x, y).0)])
            })
        })
    }

    /// LAB plane (L, a, b in 8-bit scale).
    pub fn lab(&self) -> &Plane3 {
        self.lab.get_or_init(|| convert(&self.rgb, rgb_to_lab8))
    }

    /// HSV plane (H 0-180, S, V).
    pub fn hsv(&self) -> &Plane3 {
        self.hsv.get_or_init(|| convert(&self.rgb, rgb_to_hsv8))
    }

    /// Global Laplacian variance, computed by `compute` on first use.
    ///
    /// Errors are not cached.
    pub fn sharpness_with(
        &self,
        compute: impl FnOnce(&Frame) -> MediaResult<f64>,
    ) -> MediaResult<f64> {
        if let Some(value) = self.sharpness.get() {
            return Ok(*value);
        }
        let value = compute(self)?;
        Ok(*self.sharpness.get_or_init(|| value))
    }
}

fn convert(rgb: &RgbImage, f: fn([u8; 3]) -> [u8; 3]) -> Plane3 {
    let mut out = Plane3::new(rgb.width(), rgb.height());
    for (src, dst) in rgb.pixels().zip(out.pixels_mut()) {
        *dst = Rgb(f(src.0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb24_checks_length() {
        assert!(Frame::from_rgb24(0, 4, 2, vec![0; 24]).is_ok());
        assert!(Frame::from_rgb24(0, 4, 2, vec![0; 23]).is_err());
    }

    #[test]
    fn test_black_frame_planes() {
        let frame = Frame::solid(3, 8, 6, [0, 0, 0]);
        assert_eq!(frame.index(), 3);
        assert_eq!(frame.gray().get_pixel(2, 2).0, [0]);
        assert_eq!(frame.lab().get_pixel(2, 2).0, [0, 128, 128]);
        assert_eq!(frame.hsv().get_pixel(2, 2).0, [0, 0, 0]);
        assert!((frame.area() - 48.0).abs() < 0.001);
    }

    #[test]
    fn test_sharpness_is_computed_once() {
        let frame = Frame::solid(0, 4, 4, [10, 10, 10]);
        let mut calls = 0;
        let first = frame
            .sharpness_with(|_| {
                calls += 1;
                Ok(42.0)
            })
            .unwrap();
        let second = frame
            .sharpness_with(|_| {
                calls += 1;
                Ok(7.0)
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert!((first - 42.0).abs() < 1e-9);
        assert!((second - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_sharpness_error_is_not_cached() {
        let frame = Frame::solid(0, 4, 4, [10, 10, 10]);
        assert!(frame
            .sharpness_with(|_| Err(MediaError::internal("laplacian")))
            .is_err());
        assert!((frame.sharpness_with(|_| Ok(3.0)).unwrap() - 3.0).abs() < 1e-9);
    }
}

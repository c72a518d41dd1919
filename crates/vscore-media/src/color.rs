//! 8-bit color space conversions.
//!
//! Values follow the usual 8-bit image-processing conventions so thresholds
//! tuned against OpenCV output carry over unchanged:
//! - HSV: H in `0..=180` (degrees / 2), S and V in `0..=255`
//! - LAB: L scaled to `0..=255`, a and b offset by 128

/// Convert an RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv8(rgb: [u8; 3]) -> [u8; 3] {
    let (h, s, v) = rgb_to_hsv(rgb[0] as f64, rgb[1] as f64, rgb[2] as f64);
    [
        (h / 2.0).round().min(180.0) as u8,
        (s * 255.0).round().min(255.0) as u8,
        v.round().min(255.0) as u8,
    ]
}

/// Convert RGB to HSV (H in degrees, S in 0-1, V in the input scale).
fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { delta / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };

    (h, s, v)
}

/// Convert an sRGB pixel to 8-bit CIE LAB (D65 white point).
pub fn rgb_to_lab8(rgb: [u8; 3]) -> [u8; 3] {
    let r = srgb_to_linear(rgb[0]);
    let g = srgb_to_linear(rgb[1]);
    let b = srgb_to_linear(rgb[2]);

    let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / 0.950456;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / 1.088754;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    let l = if y > 0.008856 { 116.0 * fy - 16.0 } else { 903.3 * y };
    let a = 500.0 * (fx - fy) + 128.0;
    let bb = 200.0 * (fy - fz) + 128.0;

    [
        (l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8,
        a.round().clamp(0.0, 255.0) as u8,
        bb.round().clamp(0.0, 255.0) as u8,
    ]
}

/// Rec. 601 luma, as used for grayscale conversion.
pub fn rgb_to_gray(rgb: [u8; 3]) -> u8 {
    let y = 0.299 * rgb[0] as f64 + 0.587 * rgb[1] as f64 + 0.114 * rgb[2] as f64;
    y.round().min(255.0) as u8
}

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_red() {
        assert_eq!(rgb_to_hsv8([255, 0, 0]), [0, 255, 255]);
    }

    #[test]
    fn test_hsv_green() {
        assert_eq!(rgb_to_hsv8([0, 255, 0]), [60, 255, 255]);
    }

    #[test]
    fn test_hsv_blue() {
        assert_eq!(rgb_to_hsv8([0, 0, 255]), [120, 255, 255]);
    }

    #[test]
    fn test_hsv_gray() {
        assert_eq!(rgb_to_hsv8([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn test_lab_black_and_white() {
        assert_eq!(rgb_to_lab8([0, 0, 0]), [0, 128, 128]);
        let white = rgb_to_lab8([255, 255, 255]);
        assert_eq!(white[0], 255);
        assert!((white[1] as i32 - 128).abs() <= 1);
        assert!((white[2] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_lab_warm_colors_raise_b() {
        let orange = rgb_to_lab8([255, 140, 0]);
        assert!(orange[2] > 150);
        let blue = rgb_to_lab8([0, 0, 255]);
        assert!(blue[2] < 100);
    }

    #[test]
    fn test_gray_luma() {
        assert_eq!(rgb_to_gray([0, 0, 0]), 0);
        assert_eq!(rgb_to_gray([255, 255, 255]), 255);
        assert_eq!(rgb_to_gray([100, 100, 100]), 100);
    }
}

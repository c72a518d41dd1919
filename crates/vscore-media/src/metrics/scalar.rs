//! Scalar quality metrics.
//!
//! Each metric reduces one frame (or frame pair, for motion) to a single
//! score in `[0, 1]`. The scoring curves are plain functions so they can be
//! tested without pixels.

use super::{clamp, FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::extractor::{ColorSpace, FeatureExtractor, FlowParams};

/// Laplacian variance that maps to a perfect sharpness score.
const SHARPNESS_SCALE: f64 = 1000.0;
/// Gray standard deviation that maps to full contrast.
const CONTRAST_SCALE: f64 = 60.0;
/// Grid used for edge distribution.
const COMPOSITION_GRID: usize = 3;

const MOTION_LOW: f64 = 3.0;
const MOTION_HIGH: f64 = 20.0;
const MOTION_FALLOFF: f64 = 30.0;

/// Sharpness from Laplacian variance.
pub fn sharpness_score(laplacian_variance: f64) -> f64 {
    clamp(laplacian_variance / SHARPNESS_SCALE, 0.0, 1.0)
}

/// Brightness preference curve over normalized LAB lightness.
///
/// Flat at 1.0 between 0.3 and 0.8, falling linearly to 0 at both ends.
pub fn brightness_score(lightness: f64) -> f64 {
    let score = if lightness < 0.3 {
        lightness / 0.3
    } else if lightness > 0.8 {
        (1.0 - lightness) / 0.2
    } else {
        1.0
    };
    clamp(score, 0.0, 1.0)
}

pub fn contrast_score(gray_std: f64) -> f64 {
    clamp(gray_std / CONTRAST_SCALE, 0.0, 1.0)
}

pub fn vibrancy_score(saturation_mean: f64) -> f64 {
    clamp(saturation_mean / 255.0, 0.0, 1.0)
}

/// Edge distribution score; evenly spread edges score highest.
pub fn composition_score(grid_sums: &[f64]) -> f64 {
    if grid_sums.is_empty() {
        return 0.0;
    }
    let n = grid_sums.len() as f64;
    let mean = grid_sums.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = grid_sums.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let distribution = variance.sqrt() / (mean + 1.0);
    clamp(1.0 - (distribution / 2.0).min(1.0), 0.0, 1.0)
}

/// Motion preference curve over mean flow magnitude.
///
/// Little motion scores up to 0.5, moderate motion 0.5..1.0, and anything
/// above [`MOTION_HIGH`] pixels decays as it gets chaotic.
pub fn motion_score(magnitude: f64) -> f64 {
    let score = if magnitude < MOTION_LOW {
        magnitude / MOTION_LOW * 0.5
    } else if magnitude > MOTION_HIGH {
        (1.0 - (magnitude - MOTION_HIGH) / MOTION_FALLOFF).max(0.0)
    } else {
        0.5 + (magnitude - MOTION_LOW) / (MOTION_HIGH - MOTION_LOW) * 0.5
    };
    clamp(score, 0.0, 1.0)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SharpnessMetric;

impl FrameMetric for SharpnessMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Sharpness
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let variance = input.frame.sharpness_with(|f| extractor.sharpness(f))?;
        Ok(Judgment::Sharpness(sharpness_score(variance)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BrightnessMetric;

impl FrameMetric for BrightnessMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Brightness
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let lab = extractor.channel_stats(input.frame, ColorSpace::Lab)?;
        Ok(Judgment::Brightness(brightness_score(
            lab.channel(0).mean / 255.0,
        )))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ContrastMetric;

impl FrameMetric for ContrastMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Contrast
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let gray = extractor.channel_stats(input.frame, ColorSpace::Gray)?;
        Ok(Judgment::Contrast(contrast_score(gray.channel(0).std)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ColorVibrancyMetric;

impl FrameMetric for ColorVibrancyMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::ColorVibrancy
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let hsv = extractor.channel_stats(input.frame, ColorSpace::Hsv)?;
        Ok(Judgment::ColorVibrancy(vibrancy_score(hsv.channel(1).mean)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CompositionMetric;

impl FrameMetric for CompositionMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Composition
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let edges = extractor.edges_and_contours(input.frame)?;
        Ok(Judgment::Composition(composition_score(
            &edges.grid_sums(COMPOSITION_GRID),
        )))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MotionMetric;

impl FrameMetric for MotionMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Motion
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let prev = input.require_prev()?;
        let flow = extractor.compute_flow(input.frame, prev, &FlowParams::MOTION)?;
        Ok(Judgment::Motion(motion_score(flow.magnitude_mean)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::extractor::{EdgeAnalysis, FlowStats, MockFeatureExtractor, RasterExtractor};
    use crate::frame::Frame;

    #[test]
    fn test_brightness_curve() {
        assert!(brightness_score(0.0).abs() < 0.001);
        assert!((brightness_score(0.15) - 0.5).abs() < 0.001);
        assert!((brightness_score(0.5) - 1.0).abs() < 0.001);
        assert!((brightness_score(0.9) - 0.5).abs() < 0.001);
        assert!(brightness_score(1.0).abs() < 0.001);
    }

    #[test]
    fn test_motion_curve() {
        assert!(motion_score(0.0).abs() < 0.001);
        assert!((motion_score(1.5) - 0.25).abs() < 0.001);
        assert!((motion_score(3.0) - 0.5).abs() < 0.001);
        assert!((motion_score(20.0) - 1.0).abs() < 0.001);
        assert!((motion_score(35.0) - 0.5).abs() < 0.001);
        assert!(motion_score(80.0).abs() < 0.001);
    }

    #[test]
    fn test_saturating_scales() {
        assert!((sharpness_score(500.0) - 0.5).abs() < 0.001);
        assert!((sharpness_score(5000.0) - 1.0).abs() < 0.001);
        assert!((contrast_score(30.0) - 0.5).abs() < 0.001);
        assert!((contrast_score(90.0) - 1.0).abs() < 0.001);
        assert!((vibrancy_score(255.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_composition_distribution() {
        assert_eq!(composition_score(&[0.0; 9]), 0.0);
        assert!((composition_score(&[100.0; 9]) - 1.0).abs() < 0.001);

        let mut concentrated = [0.0; 9];
        concentrated[4] = 9000.0;
        assert!(composition_score(&concentrated) < 0.2);
    }

    #[test]
    fn test_black_frame_scores_zero() {
        let extractor = RasterExtractor::new();
        let frame = Frame::solid(0, 32, 24, [0, 0, 0]);
        let input = FrameInput::new(&frame, None);

        let metrics: Vec<Box<dyn FrameMetric>> = vec![
            Box::new(SharpnessMetric),
            Box::new(BrightnessMetric),
            Box::new(ContrastMetric),
            Box::new(ColorVibrancyMetric),
        ];
        for metric in metrics {
            let judgment = metric.evaluate(&input, &extractor).unwrap();
            let value = match judgment {
                Judgment::Sharpness(v)
                | Judgment::Brightness(v)
                | Judgment::Contrast(v)
                | Judgment::ColorVibrancy(v) => v,
                other => panic!("unexpected judgment {:?}", other),
            };
            assert!(value.abs() < 0.001, "{} = {}", metric.kind(), value);
        }
    }

    #[test]
    fn test_motion_requires_previous_frame() {
        let extractor = RasterExtractor::new();
        let frame = Frame::solid(3, 16, 16, [10, 10, 10]);
        let result = MotionMetric.evaluate(&FrameInput::new(&frame, None), &extractor);
        assert_eq!(result, Err(Unavailable::NoPreviousFrame));
    }

    #[test]
    fn test_motion_uses_flow_magnitude() {
        let mut extractor = MockFeatureExtractor::new();
        extractor
            .expect_compute_flow()
            .withf(|_, _, params| *params == FlowParams::MOTION)
            .times(1)
            .returning(|_, _, _| {
                Ok(FlowStats {
                    magnitude_mean: 11.5,
                    ..Default::default()
                })
            });
        let prev = Frame::solid(0, 8, 8, [0, 0, 0]);
        let frame = Frame::solid(3, 8, 8, [0, 0, 0]);
        let judgment = MotionMetric
            .evaluate(&FrameInput::new(&frame, Some(&prev)), &extractor)
            .unwrap();
        assert_eq!(judgment, Judgment::Motion(0.75));
    }

    #[test]
    fn test_extractor_error_is_unavailable() {
        let mut extractor = MockFeatureExtractor::new();
        extractor
            .expect_sharpness()
            .returning(|_| Err(MediaError::detection_failed("laplacian")));
        let frame = Frame::solid(0, 8, 8, [0, 0, 0]);
        let observation = SharpnessMetric.compute(&FrameInput::new(&frame, None), &extractor);
        assert!(!observation.is_found());
    }

    #[test]
    fn test_composition_with_contours() {
        let mut extractor = MockFeatureExtractor::new();
        extractor.expect_edges_and_contours().returning(|_| {
            Ok(EdgeAnalysis {
                edges: image::GrayImage::from_pixel(30, 30, image::Luma([255])),
                contours: vec![],
                row_gradient: vec![0.0; 30],
            })
        });
        let frame = Frame::solid(0, 30, 30, [0, 0, 0]);
        let judgment = CompositionMetric
            .evaluate(&FrameInput::new(&frame, None), &extractor)
            .unwrap();
        assert_eq!(judgment, Judgment::Composition(1.0));
    }

    #[test]
    fn test_sharpness_reuses_cached_variance() {
        let mut extractor = MockFeatureExtractor::new();
        extractor.expect_sharpness().times(1).returning(|_| Ok(500.0));
        let frame = Frame::solid(0, 8, 8, [0, 0, 0]);
        for _ in 0..2 {
            let judgment = SharpnessMetric
                .evaluate(&FrameInput::new(&frame, None), &extractor)
                .unwrap();
            assert_eq!(judgment, Judgment::Sharpness(0.5));
        }
    }
}

//! Exposure class, score and tonal range.

use serde::{Deserialize, Serialize};
use vscore_models::ExposureClass;

use super::{clamp, FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::extractor::{ChannelSummary, ColorSpace, FeatureExtractor, Histogram};

const UNDER_EXPOSED_BELOW: f64 = 90.0;
const OVER_EXPOSED_ABOVE: f64 = 165.0;
/// Percentage of clipped or crushed pixels a well exposed frame stays under.
const CLIP_TOLERANCE_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureJudgment {
    pub class: ExposureClass,
    /// 0-100
    pub score: f64,
    pub is_well_exposed: bool,
    /// Percentage of pixels with L > 250
    pub clipped_pct: f64,
    /// Percentage of pixels with L < 5
    pub crushed_pct: f64,
    /// `min((L max - L min) / 255, 1)`
    pub dynamic_range: f64,
    /// `1 - std(quartiles) / mean(quartiles)` of the L histogram
    pub histogram_balance: f64,
}

fn histogram_balance(histogram: &Histogram) -> f64 {
    let quartiles = histogram.quartiles();
    let mean = quartiles.iter().sum::<f64>() / 4.0;
    if mean <= 0.0 {
        return 0.0;
    }
    let std = (quartiles.iter().map(|q| (q - mean).powi(2)).sum::<f64>() / 4.0).sqrt();
    1.0 - std / mean
}

/// Judge exposure from LAB lightness statistics and histogram.
pub fn judge_exposure(lightness: &ChannelSummary, histogram: &Histogram) -> ExposureJudgment {
    let l = lightness.mean;
    let clipped_pct = histogram.mass(251, 256) * 100.0;
    let crushed_pct = histogram.mass(0, 5) * 100.0;

    let (class, base) = if l < UNDER_EXPOSED_BELOW {
        (ExposureClass::Underexposed, (l / 90.0 * 70.0).max(0.0))
    } else if l > OVER_EXPOSED_ABOVE {
        (ExposureClass::Overexposed, ((255.0 - l) / 90.0 * 70.0).max(0.0))
    } else {
        (
            ExposureClass::ProperlyExposed,
            100.0 - (l - 127.5).abs() / 127.5 * 20.0,
        )
    };
    let score = clamp(base - 2.0 * clipped_pct - 2.0 * crushed_pct, 0.0, 100.0);

    ExposureJudgment {
        class,
        score,
        is_well_exposed: class == ExposureClass::ProperlyExposed
            && clipped_pct < CLIP_TOLERANCE_PCT
            && crushed_pct < CLIP_TOLERANCE_PCT,
        clipped_pct,
        crushed_pct,
        dynamic_range: clamp((lightness.max - lightness.min) / 255.0, 0.0, 1.0),
        histogram_balance: histogram_balance(histogram),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExposureMetric;

impl FrameMetric for ExposureMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Exposure
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let lab = extractor.channel_stats(input.frame, ColorSpace::Lab)?;
        let histogram = extractor.histogram(input.frame, ColorSpace::Lab, 0)?;
        Ok(Judgment::Exposure(judge_exposure(&lab.channel(0), &histogram)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::RasterExtractor;
    use crate::frame::Frame;

    fn lightness(mean: f64, min: f64, max: f64) -> ChannelSummary {
        ChannelSummary {
            mean,
            std: 0.0,
            min,
            max,
        }
    }

    fn spike(bin: usize) -> Histogram {
        let mut counts = vec![0u64; 256];
        counts[bin] = 1;
        Histogram::from_counts(&counts)
    }

    #[test]
    fn test_mid_gray_is_properly_exposed() {
        let judgment = judge_exposure(&lightness(127.5, 127.0, 128.0), &spike(127));
        assert_eq!(judgment.class, ExposureClass::ProperlyExposed);
        assert!((judgment.score - 100.0).abs() < 0.001);
        assert!(judgment.is_well_exposed);
    }

    #[test]
    fn test_dark_frame_is_underexposed() {
        let judgment = judge_exposure(&lightness(45.0, 45.0, 45.0), &spike(45));
        assert_eq!(judgment.class, ExposureClass::Underexposed);
        assert!((judgment.score - 35.0).abs() < 0.001);
        assert!(!judgment.is_well_exposed);
    }

    #[test]
    fn test_bright_frame_is_overexposed() {
        let judgment = judge_exposure(&lightness(210.0, 200.0, 220.0), &spike(210));
        assert_eq!(judgment.class, ExposureClass::Overexposed);
        assert!((judgment.score - 35.0).abs() < 0.001);
    }

    #[test]
    fn test_clipping_penalty_and_flag() {
        let mut counts = vec![0u64; 256];
        counts[128] = 90;
        counts[255] = 10;
        let judgment =
            judge_exposure(&lightness(140.0, 128.0, 255.0), &Histogram::from_counts(&counts));
        assert!((judgment.clipped_pct - 10.0).abs() < 0.001);
        assert_eq!(judgment.class, ExposureClass::ProperlyExposed);
        assert!(!judgment.is_well_exposed);
        let base = 100.0 - 12.5 / 127.5 * 20.0;
        assert!((judgment.score - (base - 20.0)).abs() < 0.001);
    }

    #[test]
    fn test_boundaries_are_proper() {
        let low = judge_exposure(&lightness(90.0, 90.0, 90.0), &spike(90));
        assert_eq!(low.class, ExposureClass::ProperlyExposed);
        let high = judge_exposure(&lightness(165.0, 165.0, 165.0), &spike(165));
        assert_eq!(high.class, ExposureClass::ProperlyExposed);
    }

    #[test]
    fn test_dynamic_range_and_balance() {
        let mut counts = vec![0u64; 256];
        for bin in [10, 80, 150, 240] {
            counts[bin] = 1;
        }
        let judgment =
            judge_exposure(&lightness(120.0, 10.0, 240.0), &Histogram::from_counts(&counts));
        assert!((judgment.dynamic_range - 230.0 / 255.0).abs() < 0.001);
        assert!((judgment.histogram_balance - 1.0).abs() < 0.001);

        let single = judge_exposure(&lightness(120.0, 120.0, 120.0), &spike(120));
        // quartiles [0, 1, 0, 0]: std sqrt(3)/4, mean 1/4
        assert!((single.histogram_balance - (1.0 - 3f64.sqrt())).abs() < 0.001);
    }

    #[test]
    fn test_black_frame_is_crushed() {
        let extractor = RasterExtractor::new();
        let frame = Frame::solid(0, 16, 16, [0, 0, 0]);
        let judgment = ExposureMetric
            .evaluate(&FrameInput::new(&frame, None), &extractor)
            .unwrap();
        match judgment {
            Judgment::Exposure(e) => {
                assert_eq!(e.class, ExposureClass::Underexposed);
                assert!(e.score.abs() < 0.001);
                assert!((e.crushed_pct - 100.0).abs() < 0.001);
                assert!(!e.is_well_exposed);
            }
            other => panic!("unexpected judgment {:?}", other),
        }
    }
}

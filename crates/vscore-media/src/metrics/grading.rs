//! Color grading look detection.
//!
//! Evaluation order: warm / cool, desaturated / vibrant, monochrome,
//! teal-orange, vintage. Pairs joined by a slash are mutually exclusive,
//! with the first one checked first.

use serde::{Deserialize, Serialize};
use vscore_models::ColorGradingStyle;

use super::board::ConfidenceBoard;
use super::{FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::extractor::{ColorSpace, FeatureExtractor, ValueBands};

/// HSV value below which a pixel counts as shadow.
pub const SHADOW_VALUE: u8 = 100;
/// HSV value above which a pixel counts as highlight.
pub const HIGHLIGHT_VALUE: u8 = 155;

/// Color signals the grading rules read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradingSignals {
    pub saturation_mean: f64,
    pub saturation_std: f64,
    pub value_mean: f64,
    /// LAB a mean (green-red), 128 is neutral
    pub a_mean: f64,
    /// LAB b mean (blue-yellow), 128 is neutral
    pub b_mean: f64,
    pub bands: ValueBands,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingJudgment {
    pub style: ColorGradingStyle,
    /// Dominant confidence, 0-100
    pub confidence: f64,
    pub styles: Vec<ColorGradingStyle>,
    pub is_colorful: bool,
    pub is_muted: bool,
}

impl GradingJudgment {
    /// Grading strength as persisted, 0-1.
    pub fn strength(&self) -> f64 {
        self.confidence / 100.0
    }
}

pub fn classify_grading(signals: &GradingSignals) -> GradingJudgment {
    let s = signals.saturation_mean;
    let b = signals.b_mean;
    let mut board = ConfidenceBoard::new();

    let warm = board.record_if(b > 135.0, ColorGradingStyle::Warm, || {
        ((b - 128.0) / 127.0 * 100.0).min(100.0)
    });
    if !warm {
        board.record_if(b < 120.0, ColorGradingStyle::Cool, || {
            ((128.0 - b) / 128.0 * 100.0).min(100.0)
        });
    }

    let desaturated = board.record_if(s < 80.0, ColorGradingStyle::Desaturated, || {
        (1.0 - s / 255.0) * 100.0
    });
    if !desaturated {
        board.record_if(s > 150.0, ColorGradingStyle::Vibrant, || s / 255.0 * 100.0);
    }

    board.record_if(s < 20.0, ColorGradingStyle::Monochrome, || {
        (1.0 - s / 20.0) * 100.0
    });

    if let (Some(shadows), Some(highlights)) = (signals.bands.shadows, signals.bands.highlights) {
        board.record_if(
            shadows[2] > 120.0 && highlights[0] > 140.0,
            ColorGradingStyle::TealOrange,
            || 75.0,
        );
    }

    board.record_if(s < 100.0 && b > 130.0, ColorGradingStyle::Vintage, || 70.0);

    let (style, confidence) = board.resolve(ColorGradingStyle::Neutral);
    GradingJudgment {
        style,
        confidence,
        styles: board.labels(),
        is_colorful: s > 100.0,
        is_muted: s < 60.0,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ColorGradingMetric;

impl FrameMetric for ColorGradingMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::ColorGrading
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let hsv = extractor.channel_stats(input.frame, ColorSpace::Hsv)?;
        let lab = extractor.channel_stats(input.frame, ColorSpace::Lab)?;
        let bands = extractor.value_bands(input.frame, SHADOW_VALUE, HIGHLIGHT_VALUE)?;
        let signals = GradingSignals {
            saturation_mean: hsv.channel(1).mean,
            saturation_std: hsv.channel(1).std,
            value_mean: hsv.channel(2).mean,
            a_mean: lab.channel(1).mean,
            b_mean: lab.channel(2).mean,
            bands,
        };
        Ok(Judgment::ColorGrading(classify_grading(&signals)))
    }
}

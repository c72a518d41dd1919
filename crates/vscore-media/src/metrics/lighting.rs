//! Lighting setup classification from LAB lightness statistics.
//!
//! Rules are evaluated in this order and each one that fires records a
//! confidence on a [`ConfidenceBoard`]:
//!
//! | Order | Label | Condition |
//! |---|---|---|
//! | 1 | golden_hour | warm `b`, mid lightness, soft contrast |
//! | 1 | blue_hour | cool `b`, mid-low lightness (only if golden hour did not fire) |
//! | 2 | natural | mid lightness, moderate contrast |
//! | 3 | high_key | bright, low contrast |
//! | 3 | low_key | dark, high contrast (only if high key did not fire) |
//! | 4 | backlit | heavy shadows and highlights together |
//! | 5 | three_point | every lightness quartile holds 15%-35% of pixels |
//! | 6 | motivated | mid lightness, moderate contrast (wider band) |

use serde::{Deserialize, Serialize};
use vscore_models::LightingType;

use super::board::ConfidenceBoard;
use super::{FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::extractor::{ChannelStats, ColorSpace, FeatureExtractor, Histogram};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingJudgment {
    pub lighting: LightingType,
    /// Dominant confidence, 0-100
    pub confidence: f64,
    /// Every label that fired, in evaluation order
    pub labels: Vec<LightingType>,
    pub is_warm: bool,
    pub is_cool: bool,
    pub is_dramatic: bool,
    /// `L max - L min`, 0-255
    pub dynamic_range: f64,
}

impl LightingJudgment {
    /// Lighting quality as persisted, 0-1.
    pub fn quality(&self) -> f64 {
        self.confidence / 100.0
    }
}

/// Classify from LAB channel statistics and the normalized L histogram.
pub fn classify_lighting(lab: &ChannelStats, histogram: &Histogram) -> LightingJudgment {
    let l = lab.channel(0);
    let b = lab.channel(2).mean;
    let (l_mean, l_std) = (l.mean, l.std);
    let mid = l_mean > 100.0 && l_mean < 180.0;

    let mut board = ConfidenceBoard::new();

    let golden = board.record_if(
        b > 135.0 && mid && l_std < 50.0,
        LightingType::GoldenHour,
        || ((b - 128.0) / 20.0 * 100.0).min(100.0),
    );
    if !golden {
        board.record_if(
            b < 115.0 && l_mean > 80.0 && l_mean < 150.0,
            LightingType::BlueHour,
            || 70.0,
        );
    }

    board.record_if(mid && l_std > 30.0 && l_std < 60.0, LightingType::Natural, || 75.0);

    let high_key = board.record_if(l_mean > 170.0 && l_std < 40.0, LightingType::HighKey, || {
        ((l_mean - 170.0) / 85.0 * 100.0).min(100.0)
    });
    if !high_key {
        board.record_if(l_mean < 100.0 && l_std > 45.0, LightingType::LowKey, || {
            ((100.0 - l_mean) / 100.0 * 100.0).min(100.0)
        });
    }

    let dark = histogram.mass(0, 50);
    let bright = histogram.mass(200, 256);
    board.record_if(
        dark > 0.3 && bright > 0.2 && l_std > 50.0,
        LightingType::Backlit,
        || 80.0,
    );

    board.record_if(
        histogram.quartiles().iter().all(|&q| q > 0.15 && q < 0.35),
        LightingType::ThreePoint,
        || 70.0,
    );

    board.record_if(
        l_mean > 90.0 && l_mean < 170.0 && l_std > 25.0 && l_std < 55.0,
        LightingType::Motivated,
        || 60.0,
    );

    let (lighting, confidence) = board.resolve(LightingType::Unknown);
    LightingJudgment {
        lighting,
        confidence,
        labels: board.labels(),
        is_warm: b > 130.0,
        is_cool: b < 125.0,
        is_dramatic: l_std > 50.0,
        dynamic_range: l.max - l.min,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LightingMetric;

impl FrameMetric for LightingMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Lighting
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let lab = extractor.channel_stats(input.frame, ColorSpace::Lab)?;
        let histogram = extractor.histogram(input.frame, ColorSpace::Lab, 0)?;
        Ok(Judgment::Lighting(classify_lighting(&lab, &histogram)))
    }
}

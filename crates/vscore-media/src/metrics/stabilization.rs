//! Camera support inference from tracked feature motion.

use serde::{Deserialize, Serialize};
use vscore_models::StabilizationType;

use super::{FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::config::StabilizationThresholds;
use crate::extractor::{Correspondence, FeatureExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilizationJudgment {
    pub stabilization: StabilizationType,
    /// Motion consistency, 0-1
    pub score: f64,
    pub is_stable: bool,
}

/// How uniform the displacement vectors are: `1 / (1 + mean(std_x, std_y))`.
///
/// A locked-off camera moves every feature by the same amount, so the
/// per-axis spread is zero and the consistency is 1.
pub fn motion_consistency(correspondences: &[Correspondence]) -> f64 {
    if correspondences.is_empty() {
        return 0.0;
    }
    let n = correspondences.len() as f64;
    let (sum_x, sum_y) = correspondences.iter().fold((0.0, 0.0), |(sx, sy), c| {
        let (dx, dy) = c.displacement();
        (sx + dx, sy + dy)
    });
    let (mean_x, mean_y) = (sum_x / n, sum_y / n);
    let (var_x, var_y) = correspondences.iter().fold((0.0, 0.0), |(vx, vy), c| {
        let (dx, dy) = c.displacement();
        (vx + (dx - mean_x).powi(2), vy + (dy - mean_y).powi(2))
    });
    let std_mean = ((var_x / n).sqrt() + (var_y / n).sqrt()) / 2.0;
    1.0 / (1.0 + std_mean)
}

/// Tier a consistency score.
pub fn classify_stabilization(
    score: f64,
    thresholds: &StabilizationThresholds,
) -> StabilizationJudgment {
    let stabilization = if score >= thresholds.tripod {
        StabilizationType::Tripod
    } else if score >= thresholds.gimbal {
        StabilizationType::Gimbal
    } else if score >= thresholds.handheld_stabilized {
        StabilizationType::HandheldStabilized
    } else {
        StabilizationType::HandheldUnstabilized
    };
    StabilizationJudgment {
        stabilization,
        score,
        is_stable: score >= thresholds.gimbal,
    }
}

#[derive(Debug, Clone, Default)]
pub struct StabilizationMetric {
    thresholds: StabilizationThresholds,
}

impl StabilizationMetric {
    pub fn new(thresholds: StabilizationThresholds) -> Self {
        Self { thresholds }
    }
}

impl FrameMetric for StabilizationMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Stabilization
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let prev = input.require_prev()?;
        let correspondences = extractor.track_correspondences(prev, input.frame)?;
        if correspondences.len() < self.thresholds.min_correspondences {
            return Err(Unavailable::NoSignal("too few tracked features"));
        }
        let score = motion_consistency(&correspondences);
        Ok(Judgment::Stabilization(classify_stabilization(
            score,
            &self.thresholds,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MockFeatureExtractor;
    use crate::frame::Frame;

    fn shifted(n: usize, dx: f64, dy: f64) -> Vec<Correspondence> {
        (0..n)
            .map(|i| {
                let from = (i as f64 * 3.0, i as f64 * 2.0);
                Correspondence::new(from, (from.0 + dx, from.1 + dy))
            })
            .collect()
    }

    #[test]
    fn test_uniform_shift_is_fully_consistent() {
        let score = motion_consistency(&shifted(30, 4.0, -2.0));
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spread_lowers_consistency() {
        // dx alternates +1/-1 (std 1), dy constant (std 0) -> 1 / (1 + 0.5)
        let correspondences: Vec<_> = (0..20)
            .map(|i| {
                let dx = if i % 2 == 0 { 1.0 } else { -1.0 };
                Correspondence::new((0.0, 0.0), (dx, 0.0))
            })
            .collect();
        let score = motion_consistency(&correspondences);
        assert!((score - 1.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_tiers() {
        let t = StabilizationThresholds::default();
        assert_eq!(classify_stabilization(0.97, &t).stabilization, StabilizationType::Tripod);
        assert_eq!(classify_stabilization(0.85, &t).stabilization, StabilizationType::Gimbal);
        assert_eq!(
            classify_stabilization(0.75, &t).stabilization,
            StabilizationType::HandheldStabilized
        );
        assert_eq!(
            classify_stabilization(0.5, &t).stabilization,
            StabilizationType::HandheldUnstabilized
        );
        assert!(classify_stabilization(0.85, &t).is_stable);
        assert!(!classify_stabilization(0.84, &t).is_stable);
    }

    #[test]
    fn test_too_few_correspondences_is_unavailable() {
        let mut extractor = MockFeatureExtractor::new();
        extractor
            .expect_track_correspondences()
            .returning(|_, _| Ok(shifted(19, 1.0, 1.0)));
        let prev = Frame::solid(0, 8, 8, [0, 0, 0]);
        let frame = Frame::solid(6, 8, 8, [0, 0, 0]);
        let result = StabilizationMetric::default()
            .evaluate(&FrameInput::new(&frame, Some(&prev)), &extractor);
        assert!(matches!(result, Err(Unavailable::NoSignal(_))));
    }

    #[test]
    fn test_locked_off_camera_is_tripod() {
        let mut extractor = MockFeatureExtractor::new();
        extractor
            .expect_track_correspondences()
            .returning(|_, _| Ok(shifted(40, 0.0, 0.0)));
        let prev = Frame::solid(0, 8, 8, [0, 0, 0]);
        let frame = Frame::solid(6, 8, 8, [0, 0, 0]);
        let judgment = StabilizationMetric::default()
            .evaluate(&FrameInput::new(&frame, Some(&prev)), &extractor)
            .unwrap();
        match judgment {
            Judgment::Stabilization(s) => {
                assert_eq!(s.stabilization, StabilizationType::Tripod);
                assert!(s.is_stable);
            }
            other => panic!("unexpected judgment {:?}", other),
        }
    }
}

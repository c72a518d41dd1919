//! Focus pulls and shallow depth of field.

use serde::{Deserialize, Serialize};

use super::{clamp, FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::config::FocusThresholds;
use crate::extractor::{FeatureExtractor, SharpnessMap};

const BOKEH_GRID: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusJudgment {
    pub has_focus_change: bool,
    /// Relative sharpness change against the previous frame, in percent
    pub change_pct: f64,
    /// Laplacian variance of the current frame
    pub sharpness: f64,
    pub has_shallow_dof: bool,
    /// Variance of the top-left, center and bottom-right cell sharpnesses
    pub dof_variance: f64,
}

impl FocusJudgment {
    /// Change amount as persisted: `min(change% / 100, 1)`.
    pub fn change_amount(&self) -> f64 {
        clamp(self.change_pct / 100.0, 0.0, 1.0)
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Percent change in sharpness from `previous` to `current`.
pub fn sharpness_change_pct(previous: f64, current: f64) -> f64 {
    (current - previous).abs() / (previous + 1e-6) * 100.0
}

/// Judge focus from the current sharpness map and, if any, the previous
/// frame's global sharpness.
pub fn judge_focus(
    current: &SharpnessMap,
    previous: Option<f64>,
    thresholds: &FocusThresholds,
) -> FocusJudgment {
    let has_shallow_dof = variance(&current.cells) > thresholds.bokeh_variance;

    match previous {
        None => FocusJudgment {
            has_focus_change: false,
            change_pct: 0.0,
            sharpness: current.global,
            has_shallow_dof,
            dof_variance: 0.0,
        },
        Some(prev) => {
            let change_pct = sharpness_change_pct(prev, current.global);
            let last = current.grid.saturating_sub(1);
            let diagonal = [
                current.cell(0, 0),
                current.cell(current.grid / 2, current.grid / 2),
                current.cell(last, last),
            ];
            FocusJudgment {
                has_focus_change: change_pct > thresholds.change_pct,
                change_pct,
                sharpness: current.global,
                has_shallow_dof,
                dof_variance: variance(&diagonal),
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FocusMetric {
    thresholds: FocusThresholds,
}

impl FocusMetric {
    pub fn new(thresholds: FocusThresholds) -> Self {
        Self { thresholds }
    }
}

impl FrameMetric for FocusMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Focus
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let current = extractor.sharpness_map(input.frame, BOKEH_GRID)?;
        let previous = match input.prev {
            Some(prev) => Some(prev.sharpness_with(|f| extractor.sharpness(f))?),
            None => None,
        };
        Ok(Judgment::Focus(judge_focus(
            &current,
            previous,
            &self.thresholds,
        )))
    }
}

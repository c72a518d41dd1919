//! Person presence and centering.

use serde::{Deserialize, Serialize};

use super::{clamp, FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::extractor::{BoundingBox, FeatureExtractor};

/// Person coverage and how centered the main subject is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonJudgment {
    /// Coverage-based presence score (0-1)
    pub score: f64,
    /// Proximity of the subject to frame center (0-1)
    pub center_focus: f64,
}

/// Presence score for a subject covering `coverage` of the frame.
///
/// Small subjects ramp up to 0.6, the 15%-70% band scores 0.6..1.0 and
/// subjects filling the frame fall back toward 0.3.
pub fn coverage_score(coverage: f64) -> f64 {
    let score = if coverage < 0.15 {
        coverage / 0.15 * 0.6
    } else if coverage > 0.7 {
        (1.0 - (coverage - 0.7) / 0.3).max(0.3)
    } else {
        0.6 + ((coverage - 0.15) / 0.55).min(0.4)
    };
    clamp(score, 0.0, 1.0)
}

/// Judge the largest detected person in a `width x height` frame.
pub fn judge_persons(boxes: &[BoundingBox], width: f64, height: f64) -> PersonJudgment {
    let largest = boxes
        .iter()
        .reduce(|best, b| if b.area() > best.area() { b } else { best });
    let Some(subject) = largest else {
        return PersonJudgment::default();
    };
    if width <= 0.0 || height <= 0.0 {
        return PersonJudgment::default();
    }

    let coverage = subject.area() / (width * height);
    let dx = (subject.cx() - width / 2.0) / (width / 2.0);
    let dy = (subject.cy() - height / 2.0) / (height / 2.0);
    let distance = (dx * dx + dy * dy).sqrt();

    PersonJudgment {
        score: coverage_score(coverage),
        center_focus: clamp(1.0 - distance * 0.8, 0.0, 1.0),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PersonMetric;

impl FrameMetric for PersonMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Person
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let boxes = extractor.detect_persons(input.frame)?;
        Ok(Judgment::Person(judge_persons(
            &boxes,
            input.frame.width() as f64,
            input.frame.height() as f64,
        )))
    }
}

//! Shot size and rule-of-thirds composition.
//!
//! The largest external contour of the edge map stands in for the subject.
//! Its bounding box decides the shot size; composition blends three
//! sub-scores (0-100):
//!
//! - proximity of the box center to the nearest thirds intersection (40%)
//! - placement of the strongest horizontal edge row near a thirds line (30%)
//! - share of the frame left as negative space around the box (30%)

use serde::{Deserialize, Serialize};
use vscore_models::ShotSize;

use super::{FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::extractor::{BoundingBox, EdgeAnalysis, FeatureExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingJudgment {
    pub shot_size: ShotSize,
    /// Subject bounding box area over frame area, 0-1
    pub subject_ratio: f64,
    /// Weighted composition score, 0-100
    pub composition: f64,
    /// Proximity to the nearest thirds intersection, 0-100
    pub thirds: f64,
    pub horizon: f64,
    pub negative_space: f64,
}

impl FramingJudgment {
    pub fn has_good_composition(&self) -> bool {
        self.composition > 60.0
    }

    pub fn follows_rule_of_thirds(&self) -> bool {
        self.thirds > 60.0
    }
}

/// Shot size from the subject box in a `width x height` frame.
pub fn classify_shot_size(subject: &BoundingBox, width: f64, height: f64) -> ShotSize {
    let ratio = subject.area() / (width * height);
    // Large subject spanning neither dimension
    if ratio > 0.4 && subject.width < width * 0.6 && subject.height < height * 0.6 {
        return ShotSize::Insert;
    }
    if ratio > 0.6 {
        ShotSize::ExtremeCloseUp
    } else if ratio > 0.35 {
        ShotSize::CloseUp
    } else if ratio > 0.15 {
        ShotSize::Medium
    } else if ratio > 0.05 {
        ShotSize::Wide
    } else {
        ShotSize::ExtremeWide
    }
}

fn proximity_score(subject: &BoundingBox, width: f64, height: f64) -> f64 {
    let (tw, th) = (width / 3.0, height / 3.0);
    let points = [(tw, th), (2.0 * tw, th), (tw, 2.0 * th), (2.0 * tw, 2.0 * th)];
    let nearest = points
        .iter()
        .map(|(px, py)| ((subject.cx() - px).powi(2) + (subject.cy() - py).powi(2)).sqrt())
        .fold(f64::INFINITY, f64::min);
    let acceptable = width.min(height) * 0.1;
    (100.0 - nearest / acceptable * 100.0).max(0.0)
}

fn horizon_score(horizon_row: f64, height: f64) -> f64 {
    let third = height / 3.0;
    let distance = (horizon_row - third)
        .abs()
        .min((horizon_row - 2.0 * third).abs());
    if distance < height * 0.05 {
        100.0
    } else {
        (100.0 - distance / third * 100.0).max(0.0)
    }
}

fn negative_space_score(subject: &BoundingBox, width: f64, height: f64) -> f64 {
    let left = subject.x;
    let right = width - (subject.x + subject.width);
    let top = subject.y;
    let bottom = height - (subject.y + subject.height);
    let ratio = (left + right + top + bottom) / (2.0 * (width + height));
    if ratio > 0.3 && ratio < 0.7 {
        100.0
    } else {
        (100.0 - (ratio - 0.5).abs() * 200.0).max(0.0)
    }
}

/// Judge framing from an edge analysis of a `width x height` frame.
///
/// Returns `NoSignal` when the edge map has no contours.
pub fn judge_framing(
    analysis: &EdgeAnalysis,
    width: f64,
    height: f64,
) -> Result<FramingJudgment, Unavailable> {
    let subject = analysis
        .largest_contour()
        .map(|c| c.bbox)
        .ok_or(Unavailable::NoSignal("no contour"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(Unavailable::NoSignal("empty frame"));
    }

    let thirds = proximity_score(&subject, width, height);
    let horizon = horizon_score(analysis.dominant_row().unwrap_or(0) as f64, height);
    let negative_space = negative_space_score(&subject, width, height);

    Ok(FramingJudgment {
        shot_size: classify_shot_size(&subject, width, height),
        subject_ratio: subject.area() / (width * height),
        composition: thirds * 0.4 + horizon * 0.3 + negative_space * 0.3,
        thirds,
        horizon,
        negative_space,
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ShotFramingMetric;

impl FrameMetric for ShotFramingMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::ShotFraming
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let analysis = extractor.edges_and_contours(input.frame)?;
        judge_framing(
            &analysis,
            input.frame.width() as f64,
            input.frame.height() as f64,
        )
        .map(Judgment::ShotFraming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::synthetic::SyntheticExtractor;
    use crate::extractor::Contour;
    use crate::frame::Frame;
    use image::{GrayImage, Rgb, RgbImage};

    fn analysis(boxes: &[BoundingBox], rows: usize, horizon: usize) -> EdgeAnalysis {
        let mut row_gradient = vec![0.0; rows];
        if horizon < rows {
            row_gradient[horizon] = 10.0;
        }
        EdgeAnalysis {
            edges: GrayImage::new(1, 1),
            contours: boxes
                .iter()
                .map(|b| Contour {
                    bbox: *b,
                    area: b.area(),
                })
                .collect(),
            row_gradient,
        }
    }

    #[test]
    fn test_shot_size_tiers() {
        let (w, h) = (100.0, 100.0);
        assert_eq!(
            classify_shot_size(&BoundingBox::new(0.0, 0.0, 90.0, 90.0), w, h),
            ShotSize::ExtremeCloseUp
        );
        assert_eq!(
            classify_shot_size(&BoundingBox::new(0.0, 0.0, 100.0, 40.0), w, h),
            ShotSize::CloseUp
        );
        assert_eq!(
            classify_shot_size(&BoundingBox::new(0.0, 0.0, 100.0, 20.0), w, h),
            ShotSize::Medium
        );
        assert_eq!(
            classify_shot_size(&BoundingBox::new(0.0, 0.0, 30.0, 30.0), w, h),
            ShotSize::Wide
        );
        assert_eq!(
            classify_shot_size(&BoundingBox::new(0.0, 0.0, 10.0, 10.0), w, h),
            ShotSize::ExtremeWide
        );
    }

    #[test]
    fn test_no_contour_is_unavailable() {
        let result = judge_framing(&analysis(&[], 90, 0), 160.0, 90.0);
        assert_eq!(result, Err(Unavailable::NoSignal("no contour")));
    }

    #[test]
    fn test_subject_on_thirds_point() {
        // 30x30 box centered on (100, 100) in a 300x300 frame, horizon on row 100
        let subject = BoundingBox::new(85.0, 85.0, 30.0, 30.0);
        let judgment = judge_framing(&analysis(&[subject], 300, 100), 300.0, 300.0).unwrap();
        assert!((judgment.thirds - 100.0).abs() < 0.001);
        assert!((judgment.horizon - 100.0).abs() < 0.001);
        // space 85 + 185 + 85 + 185 = 540 over 1200 = 0.45
        assert!((judgment.negative_space - 100.0).abs() < 0.001);
        assert!((judgment.composition - 100.0).abs() < 0.001);
        assert!((judgment.subject_ratio - 0.01).abs() < 0.001);
        assert!(judgment.has_good_composition());
        assert!(judgment.follows_rule_of_thirds());
    }

    #[test]
    fn test_full_frame_subject() {
        let subject = BoundingBox::new(0.0, 0.0, 300.0, 300.0);
        let judgment = judge_framing(&analysis(&[subject], 300, 0), 300.0, 300.0).unwrap();
        assert_eq!(judgment.shot_size, ShotSize::ExtremeCloseUp);
        // no space at all
        assert!(judgment.negative_space.abs() < 0.001);
        // horizon at row 0 is 100 rows from the upper third
        assert!(judgment.horizon.abs() < 0.001);
        // center (150, 150) is 70.7 px from each thirds point, beyond 30 px
        assert!(judgment.thirds.abs() < 0.001);
    }

    #[test]
    fn test_largest_contour_is_subject() {
        let small = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        let large = BoundingBox::new(100.0, 100.0, 100.0, 100.0);
        let judgment = judge_framing(&analysis(&[small, large], 300, 100), 300.0, 300.0).unwrap();
        assert!((judgment.subject_ratio - 1.0 / 9.0).abs() < 0.001);
        assert_eq!(judgment.shot_size, ShotSize::Wide);
    }

    #[test]
    fn test_black_frame_has_no_subject() {
        let extractor = SyntheticExtractor::still();
        let frame = Frame::solid(0, 32, 32, [0, 0, 0]);
        let result = ShotFramingMetric.evaluate(&FrameInput::new(&frame, None), &extractor);
        assert!(matches!(result, Err(Unavailable::NoSignal(_))));
    }

    #[test]
    fn test_bright_square_is_found() {
        let image = RgbImage::from_fn(60, 60, |x, y| {
            if (20..40).contains(&x) && (20..40).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let frame = Frame::new(0, image);
        let extractor = SyntheticExtractor::still();
        let judgment = ShotFramingMetric
            .evaluate(&FrameInput::new(&frame, None), &extractor)
            .unwrap();
        match judgment {
            Judgment::ShotFraming(f) => {
                assert!(f.subject_ratio > 0.05 && f.subject_ratio < 0.2);
            }
            other => panic!("unexpected judgment {:?}", other),
        }
    }
}

//! Camera movement classification.
//!
//! A fixed-priority cascade over dense flow statistics and the similarity
//! transform of tracked features. The first rule that matches wins:
//!
//! 1. handheld shake (high flow variance)
//! 2. rotation
//! 3. zoom / dolly
//! 4. pan
//! 5. tilt
//! 6. complex (motion without a dominant component)
//! 7. static

use serde::{Deserialize, Serialize};
use tracing::debug;
use vscore_models::CameraMovement;

use super::{clamp, FrameInput, FrameMetric, Judgment, MetricKind, Unavailable};
use crate::config::MovementThresholds;
use crate::extractor::{AffineMotion, FeatureExtractor, FlowParams, FlowStats};

const RATIO_EPSILON: f64 = 1e-6;

/// Camera movement for one frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementJudgment {
    pub movement: CameraMovement,
    /// 0-100
    pub confidence: f64,
    /// 0-100
    pub smoothness: f64,
    /// Cinematic quality, 0-100
    pub quality: f64,
    /// 0-1
    pub direction_consistency: f64,
    /// Mean flow magnitude in pixels
    pub magnitude: f64,
    pub scale: f64,
    pub rotation_deg: f64,
}

impl MovementJudgment {
    /// Judgment used when there is nothing to compare against.
    pub fn sentinel() -> Self {
        Self {
            movement: CameraMovement::Static,
            confidence: 0.0,
            smoothness: 100.0,
            quality: 50.0,
            direction_consistency: 1.0,
            magnitude: 0.0,
            scale: 1.0,
            rotation_deg: 0.0,
        }
    }
}

/// Run the movement cascade.
pub fn classify_movement(
    flow: &FlowStats,
    affine: &AffineMotion,
    thresholds: &MovementThresholds,
) -> MovementJudgment {
    let mean = flow.magnitude_mean;
    let variance_ratio = flow.magnitude_std / (mean + RATIO_EPSILON);
    let direction_consistency = clamp(1.0 - variance_ratio, 0.0, 1.0);
    let scale_delta = (affine.scale - 1.0).abs();
    let radial = flow.radial_median;

    let (movement, confidence, base_quality) =
        if variance_ratio > thresholds.handheld_variance_ratio && mean > thresholds.motion_floor {
            (CameraMovement::Handheld, (variance_ratio * 30.0).min(100.0), 30.0)
        } else if affine.rotation_deg.abs() > thresholds.rotation {
            let movement = if affine.rotation_deg > 0.0 {
                CameraMovement::RotationCCW
            } else {
                CameraMovement::RotationCW
            };
            let confidence = (affine.rotation_deg.abs() / thresholds.rotation * 40.0).min(100.0);
            (movement, confidence, 75.0)
        } else if scale_delta > thresholds.zoom_scale || radial.abs() > thresholds.zoom_radial {
            let strength = (scale_delta * 50.0).max(radial.abs());
            let optical = direction_consistency > thresholds.zoom_consistency;
            let zoom_in = affine.scale < 1.0 || radial < 0.0;
            let (movement, quality) = match (zoom_in, optical) {
                (true, true) => (CameraMovement::ZoomIn, 85.0),
                (true, false) => (CameraMovement::DollyIn, 90.0),
                (false, true) => (CameraMovement::ZoomOut, 70.0),
                (false, false) => (CameraMovement::DollyOut, 80.0),
            };
            let confidence = (strength / thresholds.zoom_radial * 60.0).min(100.0);
            (movement, confidence, quality)
        } else if affine.tx.abs() > thresholds.pan {
            let movement = if affine.tx > 0.0 {
                CameraMovement::PanRight
            } else {
                CameraMovement::PanLeft
            };
            (movement, (affine.tx.abs() / thresholds.pan * 60.0).min(100.0), 75.0)
        } else if affine.ty.abs() > thresholds.tilt {
            let movement = if affine.ty > 0.0 {
                CameraMovement::TiltDown
            } else {
                CameraMovement::TiltUp
            };
            (movement, (affine.ty.abs() / thresholds.tilt * 60.0).min(100.0), 70.0)
        } else if mean > thresholds.motion_floor {
            (
                CameraMovement::Complex,
                (mean / thresholds.motion_floor * 40.0).min(100.0),
                65.0,
            )
        } else {
            (CameraMovement::Static, 100.0, 50.0)
        };

    let smoothness = if mean > thresholds.smoothness_floor {
        (100.0 - variance_ratio * 30.0).max(0.0)
    } else {
        100.0
    };

    let quality = if movement.is_directed() {
        (base_quality + smoothness / 100.0 * 25.0).min(100.0)
    } else {
        base_quality
    };

    MovementJudgment {
        movement,
        confidence,
        smoothness,
        quality,
        direction_consistency,
        magnitude: mean,
        scale: affine.scale,
        rotation_deg: affine.rotation_deg,
    }
}

/// Camera movement from flow plus feature tracking.
#[derive(Debug, Clone, Default)]
pub struct CameraMovementMetric {
    thresholds: MovementThresholds,
}

impl CameraMovementMetric {
    pub fn new(thresholds: MovementThresholds) -> Self {
        Self { thresholds }
    }
}

impl FrameMetric for CameraMovementMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::CameraMovement
    }

    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable> {
        let prev = input.require_prev()?;
        let flow = extractor.compute_flow(input.frame, prev, &FlowParams::CAMERA)?;

        // A failed affine fit degrades to "no transform" rather than losing the flow.
        let affine = match extractor.track_features(prev, input.frame) {
            Ok(Some(affine)) => affine,
            Ok(None) => AffineMotion::identity(),
            Err(e) => {
                debug!(frame = input.frame.index(), error = %e, "Feature tracking failed");
                AffineMotion::identity()
            }
        };

        Ok(Judgment::CameraMovement(classify_movement(
            &flow,
            &affine,
            &self.thresholds,
        )))
    }
}

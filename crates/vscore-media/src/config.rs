//! Configuration for segment analysis.

use serde::{Deserialize, Serialize};
use vscore_models::SamplingInfo;

use crate::error::{MediaError, MediaResult};

/// Frame-index sampling policy.
///
/// Scalar metrics run on every `scalar_stride`-th frame; person detection and
/// the cinematic classifiers run on every `detection_stride`-th frame. The
/// detection stride must be a multiple of the scalar stride so every
/// detection frame is also a scalar frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    pub scalar_stride: usize,
    pub detection_stride: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            scalar_stride: 3,
            detection_stride: 6,
        }
    }
}

impl SamplingPolicy {
    pub fn validate(&self) -> MediaResult<()> {
        if self.scalar_stride == 0 || self.detection_stride == 0 {
            return Err(MediaError::invalid_config("sampling strides must be positive"));
        }
        if self.detection_stride % self.scalar_stride != 0 {
            return Err(MediaError::invalid_config(format!(
                "detection stride {} is not a multiple of scalar stride {}",
                self.detection_stride, self.scalar_stride
            )));
        }
        Ok(())
    }

    /// Description persisted alongside the index.
    pub fn info(&self) -> SamplingInfo {
        SamplingInfo {
            scalar_stride: self.scalar_stride,
            detection_stride: self.detection_stride,
        }
    }
}

/// Camera movement cascade thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementThresholds {
    /// Mean flow magnitude below which the frame counts as still.
    pub motion_floor: f64,
    /// Flow std/mean ratio above which motion counts as shake.
    pub handheld_variance_ratio: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Deviation of the affine scale from 1.0.
    pub zoom_scale: f64,
    /// Absolute radial-flow median.
    pub zoom_radial: f64,
    /// Direction consistency above which a zoom is optical rather than a dolly.
    pub zoom_consistency: f64,
    /// Horizontal translation in pixels.
    pub pan: f64,
    /// Vertical translation in pixels.
    pub tilt: f64,
    /// Mean magnitude above which smoothness is measured.
    pub smoothness_floor: f64,
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            motion_floor: 0.3,
            handheld_variance_ratio: 1.5,
            rotation: 0.8,
            zoom_scale: 0.01,
            zoom_radial: 0.15,
            zoom_consistency: 0.6,
            pan: 0.8,
            tilt: 0.8,
            smoothness_floor: 0.1,
        }
    }
}

/// Stabilization tiers over motion consistency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizationThresholds {
    /// Minimum tracked correspondences for a judgment.
    pub min_correspondences: usize,
    pub tripod: f64,
    pub gimbal: f64,
    pub handheld_stabilized: f64,
}

impl Default for StabilizationThresholds {
    fn default() -> Self {
        Self {
            min_correspondences: 20,
            tripod: 0.95,
            gimbal: 0.85,
            handheld_stabilized: 0.70,
        }
    }
}

/// Focus change and depth-of-field thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusThresholds {
    /// Relative sharpness change (percent) that counts as a focus pull.
    pub change_pct: f64,
    /// Variance of the 3x3 cell sharpnesses that indicates shallow depth of field.
    pub bokeh_variance: f64,
}

impl Default for FocusThresholds {
    fn default() -> Self {
        Self {
            change_pct: 15.0,
            bokeh_variance: 1000.0,
        }
    }
}

/// Full analysis configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub sampling: SamplingPolicy,
    pub movement: MovementThresholds,
    pub stabilization: StabilizationThresholds,
    pub focus: FocusThresholds,
}

impl AnalysisConfig {
    /// Sparser sampling for quick passes over long footage.
    pub fn fast() -> Self {
        Self {
            sampling: SamplingPolicy {
                scalar_stride: 6,
                detection_stride: 12,
            },
            ..Default::default()
        }
    }

    /// Denser sampling for short clips.
    pub fn thorough() -> Self {
        Self {
            sampling: SamplingPolicy {
                scalar_stride: 1,
                detection_stride: 2,
            },
            ..Default::default()
        }
    }

    /// Override the sampling strides.
    pub fn with_sampling(mut self, scalar_stride: usize, detection_stride: usize) -> Self {
        self.sampling = SamplingPolicy {
            scalar_stride,
            detection_stride,
        };
        self
    }

    /// Override the minimum tracked correspondences for stabilization.
    pub fn with_min_correspondences(mut self, min: usize) -> Self {
        self.stabilization.min_correspondences = min;
        self
    }

    pub fn validate(&self) -> MediaResult<()> {
        self.sampling.validate()?;
        let s = &self.stabilization;
        if !(s.tripod >= s.gimbal && s.gimbal >= s.handheld_stabilized) {
            return Err(MediaError::invalid_config(
                "stabilization tiers must be non-increasing",
            ));
        }
        Ok(())
    }
}

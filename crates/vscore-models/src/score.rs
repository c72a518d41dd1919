//! Per-segment score record.
//!
//! `ScoreMetrics` is a flat, fixed-schema record. Continuous fields are
//! normalized to `[0.0, 1.0]`; categorical fields come from the closed label
//! sets in [`crate::labels`]. Every field falls back to its neutral default
//! when missing, so older index files keep deserializing as fields are added.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::labels::{
    CameraMovement, ColorGradingStyle, ExposureClass, LightingType, ShotSize, StabilizationType,
};

/// Aggregated scores for one video segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoreMetrics {
    /// Laplacian-variance sharpness.
    pub sharpness: f64,
    /// Exposure-balanced brightness (penalizes very dark and very bright).
    pub brightness: f64,
    /// Grayscale standard deviation, normalized.
    pub contrast: f64,
    /// Mean saturation.
    pub color_vibrancy: f64,
    /// Optical-flow motion, peaking at moderate movement.
    pub motion_score: f64,
    /// Edge balance across a 3x3 grid.
    pub composition_score: f64,
    /// Largest person's frame coverage.
    pub person_score: f64,
    /// Largest person's proximity to frame center.
    pub center_focus_score: f64,

    pub camera_movement_type: CameraMovement,
    pub camera_movement_confidence: f64,
    pub camera_movement_smoothness: f64,
    pub camera_movement_quality: f64,
    pub camera_direction_consistency: f64,

    pub stabilization_type: StabilizationType,
    pub stabilization_score: f64,

    pub focus_has_change: bool,
    pub focus_change_amount: f64,
    pub focus_has_shallow_dof: bool,

    pub lighting_type: LightingType,
    pub lighting_quality: f64,
    pub lighting_is_dramatic: bool,

    pub color_grading_style: ColorGradingStyle,
    pub color_grading_strength: f64,

    pub exposure_quality: ExposureClass,
    pub exposure_score: f64,
    pub exposure_is_well_exposed: bool,
    pub exposure_dynamic_range: f64,

    pub shot_size: ShotSize,
    pub shot_composition_score: f64,
    pub shot_subject_ratio: f64,
}

impl Default for ScoreMetrics {
    /// Neutral defaults, used when a metric family produced no value.
    fn default() -> Self {
        Self {
            sharpness: 0.0,
            brightness: 0.0,
            contrast: 0.0,
            color_vibrancy: 0.0,
            motion_score: 0.0,
            composition_score: 0.0,
            person_score: 0.5,
            center_focus_score: 0.5,
            camera_movement_type: CameraMovement::Static,
            camera_movement_confidence: 0.0,
            camera_movement_smoothness: 1.0,
            camera_movement_quality: 0.5,
            camera_direction_consistency: 1.0,
            stabilization_type: StabilizationType::Unknown,
            stabilization_score: 0.5,
            focus_has_change: false,
            focus_change_amount: 0.0,
            focus_has_shallow_dof: false,
            lighting_type: LightingType::Unknown,
            lighting_quality: 0.5,
            lighting_is_dramatic: false,
            color_grading_style: ColorGradingStyle::Neutral,
            color_grading_strength: 0.5,
            exposure_quality: ExposureClass::Unknown,
            exposure_score: 0.5,
            exposure_is_well_exposed: false,
            exposure_dynamic_range: 0.0,
            shot_size: ShotSize::Unknown,
            shot_composition_score: 0.5,
            shot_subject_ratio: 0.0,
        }
    }
}

/// Name and description of one persisted metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricInfo {
    pub name: &'static str,
    pub description: &'static str,
}

const fn info(name: &'static str, description: &'static str) -> MetricInfo {
    MetricInfo { name, description }
}

/// Every persisted metric, in schema order.
pub const METRIC_INFO: &[MetricInfo] = &[
    info("sharpness", "Image sharpness from Laplacian variance"),
    info("brightness", "Exposure-balanced brightness"),
    info("contrast", "Grayscale contrast"),
    info("color_vibrancy", "Mean color saturation"),
    info("motion_score", "Optical-flow motion, peaking at moderate movement"),
    info("composition_score", "Edge balance across a 3x3 grid"),
    info("person_score", "Frame coverage of the largest detected person"),
    info("center_focus_score", "Proximity of the largest person to frame center"),
    info("camera_movement_type", "Dominant camera movement label"),
    info("camera_movement_confidence", "Confidence in the movement label"),
    info("camera_movement_smoothness", "Smoothness of the camera movement"),
    info("camera_movement_quality", "Cinematic quality of the movement"),
    info("camera_direction_consistency", "Consistency of the flow direction"),
    info("stabilization_type", "Inferred camera support"),
    info("stabilization_score", "Consistency of tracked feature motion"),
    info("focus_has_change", "Any sampled focus pull or rack"),
    info("focus_change_amount", "Relative sharpness change between frames"),
    info("focus_has_shallow_dof", "Any sampled shallow depth of field"),
    info("lighting_type", "Dominant lighting setup"),
    info("lighting_quality", "Confidence in the lighting label"),
    info("lighting_is_dramatic", "Any sampled high-contrast lighting"),
    info("color_grading_style", "Dominant color grading look"),
    info("color_grading_strength", "Confidence in the grading label"),
    info("exposure_quality", "Exposure class"),
    info("exposure_score", "Exposure quality score"),
    info("exposure_is_well_exposed", "Every sampled frame properly exposed"),
    info("exposure_dynamic_range", "Luminance dynamic range"),
    info("shot_size", "Shot size from subject frame share"),
    info("shot_composition_score", "Rule-of-thirds composition score"),
    info("shot_subject_ratio", "Subject bounding box share of the frame"),
];

impl ScoreMetrics {
    /// Names of every persisted metric, in schema order.
    pub fn metric_names() -> Vec<&'static str> {
        METRIC_INFO.iter().map(|m| m.name).collect()
    }

    /// Continuous fields by name.
    pub fn continuous_fields(&self) -> [(&'static str, f64); 20] {
        [
            ("sharpness", self.sharpness),
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("color_vibrancy", self.color_vibrancy),
            ("motion_score", self.motion_score),
            ("composition_score", self.composition_score),
            ("person_score", self.person_score),
            ("center_focus_score", self.center_focus_score),
            ("camera_movement_confidence", self.camera_movement_confidence),
            ("camera_movement_smoothness", self.camera_movement_smoothness),
            ("camera_movement_quality", self.camera_movement_quality),
            ("camera_direction_consistency", self.camera_direction_consistency),
            ("stabilization_score", self.stabilization_score),
            ("focus_change_amount", self.focus_change_amount),
            ("lighting_quality", self.lighting_quality),
            ("color_grading_strength", self.color_grading_strength),
            ("exposure_score", self.exposure_score),
            ("exposure_dynamic_range", self.exposure_dynamic_range),
            ("shot_composition_score", self.shot_composition_score),
            ("shot_subject_ratio", self.shot_subject_ratio),
        ]
    }

    /// Check that every continuous field lies in `[0.0, 1.0]`.
    pub fn validate(&self) -> ModelResult<()> {
        for (field, value) in self.continuous_fields() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ModelError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

//! Per-frame metrics.
//!
//! Every metric turns raw extractor signals into a typed [`Judgment`], or
//! reports why it could not ([`Unavailable`]). Neutral defaults are applied
//! later, when a segment's observations are reduced.
//!
//! | Metric | Schedule |
//! |---|---|
//! | sharpness, brightness, contrast, vibrancy, composition | scalar frames |
//! | motion | scalar frames with a previous frame |
//! | person | detection frames |
//! | movement, stabilization, focus, lighting, grading, exposure, framing | detection frames with a previous frame |

pub mod board;
pub mod exposure;
pub mod focus;
pub mod framing;
pub mod grading;
pub mod lighting;
pub mod movement;
pub mod person;
pub mod registry;
pub mod scalar;
pub mod stabilization;

pub use board::ConfidenceBoard;
pub use exposure::{ExposureJudgment, ExposureMetric};
pub use focus::{FocusJudgment, FocusMetric};
pub use framing::{FramingJudgment, ShotFramingMetric};
pub use grading::{ColorGradingMetric, GradingJudgment};
pub use lighting::{LightingJudgment, LightingMetric};
pub use movement::{CameraMovementMetric, MovementJudgment};
pub use person::{PersonJudgment, PersonMetric};
pub use registry::MetricRegistry;
pub use scalar::{
    BrightnessMetric, ColorVibrancyMetric, CompositionMetric, ContrastMetric, MotionMetric,
    SharpnessMetric,
};
pub use stabilization::{StabilizationJudgment, StabilizationMetric};

use std::fmt;

use crate::error::MediaError;
use crate::extractor::FeatureExtractor;
use crate::frame::Frame;

/// Why a metric produced no value for a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Unavailable {
    /// The metric compares consecutive frames and this is the first one.
    NoPreviousFrame,
    /// The frame carries nothing to measure (no corners, no contour, ...).
    NoSignal(&'static str),
    /// The underlying detector returned an error at runtime.
    DetectorFailed(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::NoPreviousFrame => write!(f, "no previous frame"),
            Unavailable::NoSignal(reason) => write!(f, "no signal: {}", reason),
            Unavailable::DetectorFailed(message) => write!(f, "detector failed: {}", message),
        }
    }
}

impl From<MediaError> for Unavailable {
    fn from(err: MediaError) -> Self {
        match err {
            // The backend lacks the primitive; nothing failed.
            MediaError::DetectorUnavailable(_) => Unavailable::NoSignal("detector unavailable"),
            other => Unavailable::DetectorFailed(other.to_string()),
        }
    }
}

/// A metric's outcome for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    Found(T),
    Unavailable(Unavailable),
}

impl<T> Observation<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Observation::Found(value) => Some(value),
            Observation::Unavailable(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Observation::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Observation<U> {
        match self {
            Observation::Found(value) => Observation::Found(f(value)),
            Observation::Unavailable(reason) => Observation::Unavailable(reason),
        }
    }
}

impl<T> From<Result<T, Unavailable>> for Observation<T> {
    fn from(result: Result<T, Unavailable>) -> Self {
        match result {
            Ok(value) => Observation::Found(value),
            Err(reason) => Observation::Unavailable(reason),
        }
    }
}

/// When a metric runs within a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schedule {
    /// Every scalar-tier frame.
    Scalar,
    /// Scalar-tier frames that have a previous sampled frame.
    ScalarWithPrevious,
    /// Every detection-tier frame.
    Detection,
    /// Detection-tier frames that have a previous sampled frame.
    DetectionWithPrevious,
}

/// Metric families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Sharpness,
    Brightness,
    Contrast,
    ColorVibrancy,
    Composition,
    Motion,
    Person,
    CameraMovement,
    Stabilization,
    Focus,
    Lighting,
    ColorGrading,
    Exposure,
    ShotFraming,
}

impl MetricKind {
    /// All metric families, in evaluation order.
    pub const ALL: &'static [MetricKind] = &[
        MetricKind::Sharpness,
        MetricKind::Brightness,
        MetricKind::Contrast,
        MetricKind::ColorVibrancy,
        MetricKind::Composition,
        MetricKind::Motion,
        MetricKind::Person,
        MetricKind::CameraMovement,
        MetricKind::Stabilization,
        MetricKind::Focus,
        MetricKind::Lighting,
        MetricKind::ColorGrading,
        MetricKind::Exposure,
        MetricKind::ShotFraming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Sharpness => "sharpness",
            MetricKind::Brightness => "brightness",
            MetricKind::Contrast => "contrast",
            MetricKind::ColorVibrancy => "color_vibrancy",
            MetricKind::Composition => "composition",
            MetricKind::Motion => "motion",
            MetricKind::Person => "person",
            MetricKind::CameraMovement => "camera_movement",
            MetricKind::Stabilization => "stabilization",
            MetricKind::Focus => "focus",
            MetricKind::Lighting => "lighting",
            MetricKind::ColorGrading => "color_grading",
            MetricKind::Exposure => "exposure",
            MetricKind::ShotFraming => "shot_framing",
        }
    }

    pub fn schedule(&self) -> Schedule {
        match self {
            MetricKind::Sharpness
            | MetricKind::Brightness
            | MetricKind::Contrast
            | MetricKind::ColorVibrancy
            | MetricKind::Composition => Schedule::Scalar,
            MetricKind::Motion => Schedule::ScalarWithPrevious,
            MetricKind::Person => Schedule::Detection,
            MetricKind::CameraMovement
            | MetricKind::Stabilization
            | MetricKind::Focus
            | MetricKind::Lighting
            | MetricKind::ColorGrading
            | MetricKind::Exposure
            | MetricKind::ShotFraming => Schedule::DetectionWithPrevious,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A metric's per-frame judgment.
#[derive(Debug, Clone, PartialEq)]
pub enum Judgment {
    Sharpness(f64),
    Brightness(f64),
    Contrast(f64),
    ColorVibrancy(f64),
    Composition(f64),
    Motion(f64),
    Person(PersonJudgment),
    CameraMovement(MovementJudgment),
    Stabilization(StabilizationJudgment),
    Focus(FocusJudgment),
    Lighting(LightingJudgment),
    ColorGrading(GradingJudgment),
    Exposure(ExposureJudgment),
    ShotFraming(FramingJudgment),
}

impl Judgment {
    pub fn kind(&self) -> MetricKind {
        match self {
            Judgment::Sharpness(_) => MetricKind::Sharpness,
            Judgment::Brightness(_) => MetricKind::Brightness,
            Judgment::Contrast(_) => MetricKind::Contrast,
            Judgment::ColorVibrancy(_) => MetricKind::ColorVibrancy,
            Judgment::Composition(_) => MetricKind::Composition,
            Judgment::Motion(_) => MetricKind::Motion,
            Judgment::Person(_) => MetricKind::Person,
            Judgment::CameraMovement(_) => MetricKind::CameraMovement,
            Judgment::Stabilization(_) => MetricKind::Stabilization,
            Judgment::Focus(_) => MetricKind::Focus,
            Judgment::Lighting(_) => MetricKind::Lighting,
            Judgment::ColorGrading(_) => MetricKind::ColorGrading,
            Judgment::Exposure(_) => MetricKind::Exposure,
            Judgment::ShotFraming(_) => MetricKind::ShotFraming,
        }
    }
}

/// Frames visible to a metric.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub frame: &'a Frame,
    /// Previous sampled frame, if any
    pub prev: Option<&'a Frame>,
}

impl<'a> FrameInput<'a> {
    pub fn new(frame: &'a Frame, prev: Option<&'a Frame>) -> Self {
        Self { frame, prev }
    }

    /// The previous frame, or `NoPreviousFrame`.
    pub fn require_prev(&self) -> Result<&'a Frame, Unavailable> {
        self.prev.ok_or(Unavailable::NoPreviousFrame)
    }
}

/// A per-frame metric.
pub trait FrameMetric: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Compute the judgment, or the reason there is none.
    fn evaluate(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Judgment, Unavailable>;

    fn compute(
        &self,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Observation<Judgment> {
        self.evaluate(input, extractor).into()
    }
}

/// Clamp into `[lo, hi]`, mapping NaN to `lo`.
pub(crate) fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

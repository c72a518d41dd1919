//! The set of metrics run on each sampled frame.

use tracing::debug;

use super::{
    BrightnessMetric, CameraMovementMetric, ColorGradingMetric, ColorVibrancyMetric,
    CompositionMetric, ContrastMetric, ExposureMetric, FocusMetric, FrameInput, FrameMetric,
    Judgment, LightingMetric, MetricKind, MotionMetric, Observation, PersonMetric, Schedule,
    SharpnessMetric, ShotFramingMetric, StabilizationMetric, Unavailable,
};
use crate::config::AnalysisConfig;
use crate::extractor::FeatureExtractor;
use crate::sampler::FramePlan;
use crate::telemetry;

impl Schedule {
    /// Whether a metric with this schedule runs on a frame.
    pub fn applies(&self, plan: &FramePlan) -> bool {
        match self {
            Schedule::Scalar => plan.scalar,
            Schedule::ScalarWithPrevious => plan.scalar && plan.has_previous,
            Schedule::Detection => plan.detection,
            Schedule::DetectionWithPrevious => plan.detection && plan.has_previous,
        }
    }
}

/// Ordered collection of frame metrics.
pub struct MetricRegistry {
    metrics: Vec<Box<dyn FrameMetric>>,
}

impl MetricRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            metrics: Vec::new(),
        }
    }

    /// Every metric family, configured from `config`.
    pub fn standard(config: &AnalysisConfig) -> Self {
        let mut registry = Self::new();
        for kind in MetricKind::ALL {
            let metric: Box<dyn FrameMetric> = match kind {
                MetricKind::Sharpness => Box::new(SharpnessMetric),
                MetricKind::Brightness => Box::new(BrightnessMetric),
                MetricKind::Contrast => Box::new(ContrastMetric),
                MetricKind::ColorVibrancy => Box::new(ColorVibrancyMetric),
                MetricKind::Composition => Box::new(CompositionMetric),
                MetricKind::Motion => Box::new(MotionMetric),
                MetricKind::Person => Box::new(PersonMetric),
                MetricKind::CameraMovement => {
                    Box::new(CameraMovementMetric::new(config.movement.clone()))
                }
                MetricKind::Stabilization => {
                    Box::new(StabilizationMetric::new(config.stabilization.clone()))
                }
                MetricKind::Focus => Box::new(FocusMetric::new(config.focus.clone())),
                MetricKind::Lighting => Box::new(LightingMetric),
                MetricKind::ColorGrading => Box::new(ColorGradingMetric),
                MetricKind::Exposure => Box::new(ExposureMetric),
                MetricKind::ShotFraming => Box::new(ShotFramingMetric),
            };
            registry.register(metric);
        }
        registry
    }

    /// Append a metric; it runs after those already registered.
    pub fn register(&mut self, metric: Box<dyn FrameMetric>) {
        self.metrics.push(metric);
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn kinds(&self) -> Vec<MetricKind> {
        self.metrics.iter().map(|m| m.kind()).collect()
    }

    /// Run every metric whose schedule applies to `plan`.
    ///
    /// Runtime detector failures are logged and counted, then returned as
    /// unavailable observations like any other missing signal. A backend
    /// that lacks a primitive altogether yields `NoSignal` and is not
    /// counted.
    pub fn evaluate(
        &self,
        plan: &FramePlan,
        input: &FrameInput<'_>,
        extractor: &dyn FeatureExtractor,
    ) -> Vec<Observation<Judgment>> {
        self.metrics
            .iter()
            .filter(|metric| metric.kind().schedule().applies(plan))
            .map(|metric| {
                let observation = metric.compute(input, extractor);
                if let Observation::Unavailable(Unavailable::DetectorFailed(message)) =
                    &observation
                {
                    debug!(
                        metric = %metric.kind(),
                        frame = plan.index,
                        extractor = extractor.name(),
                        error = %message,
                        "Detector failed"
                    );
                    telemetry::record_detector_failure(metric.kind());
                }
                observation
            })
            .collect()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard(&AnalysisConfig::default())
    }
}

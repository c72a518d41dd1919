//! Reduction of per-frame observations into one [`ScoreMetrics`].
//!
//! | Field kind | Reduction | Nothing found |
//! |---|---|---|
//! | continuous | arithmetic mean | neutral default |
//! | categorical | mode, ties to first encountered | neutral default |
//! | "has" flags | any | `false` |
//! | "is well exposed" | all | `false` |
//!
//! Internal 0-100 scores are divided by 100 here, and every continuous field
//! is clamped to `[0, 1]` on the way out.

use vscore_models::{
    CameraMovement, ColorGradingStyle, ExposureClass, LightingType, ScoreMetrics, ShotSize,
    StabilizationType,
};

use crate::metrics::{clamp, Judgment, Observation};

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn or(&self, default: f64) -> f64 {
        if self.count == 0 {
            default
        } else {
            clamp(self.sum / self.count as f64, 0.0, 1.0)
        }
    }
}

/// Label counts in first-encounter order.
#[derive(Debug, Clone)]
struct Mode<L> {
    counts: Vec<(L, usize)>,
}

impl<L: Copy + PartialEq> Mode<L> {
    fn new() -> Self {
        Self { counts: Vec::new() }
    }

    fn push(&mut self, label: L) {
        match self.counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((label, 1)),
        }
    }

    fn or(&self, default: L) -> L {
        self.counts
            .iter()
            .fold(None, |best: Option<(L, usize)>, &(label, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
            .map(|(label, _)| label)
            .unwrap_or(default)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Any(bool);

impl Any {
    fn push(&mut self, value: bool) {
        self.0 |= value;
    }
}

/// Conjunction that is false when nothing was observed.
#[derive(Debug, Clone, Copy)]
struct All {
    seen: bool,
    all: bool,
}

impl Default for All {
    fn default() -> Self {
        Self {
            seen: false,
            all: true,
        }
    }
}

impl All {
    fn push(&mut self, value: bool) {
        self.seen = true;
        self.all &= value;
    }

    fn value(&self) -> bool {
        self.seen && self.all
    }
}

/// Accumulates observations for one segment.
#[derive(Debug, Clone)]
pub struct SegmentAggregator {
    sharpness: Mean,
    brightness: Mean,
    contrast: Mean,
    color_vibrancy: Mean,
    composition: Mean,
    motion: Mean,
    person: Mean,
    center_focus: Mean,

    movement_type: Mode<CameraMovement>,
    movement_confidence: Mean,
    movement_smoothness: Mean,
    movement_quality: Mean,
    direction_consistency: Mean,

    stabilization_type: Mode<StabilizationType>,
    stabilization_score: Mean,

    focus_has_change: Any,
    focus_change_amount: Mean,
    focus_shallow_dof: Any,

    lighting_type: Mode<LightingType>,
    lighting_quality: Mean,
    lighting_dramatic: Any,

    grading_style: Mode<ColorGradingStyle>,
    grading_strength: Mean,

    exposure_class: Mode<ExposureClass>,
    exposure_score: Mean,
    well_exposed: All,
    dynamic_range: Mean,

    shot_size: Mode<ShotSize>,
    shot_composition: Mean,
    subject_ratio: Mean,

    found: usize,
}

impl Default for SegmentAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentAggregator {
    pub fn new() -> Self {
        Self {
            sharpness: Mean::default(),
            brightness: Mean::default(),
            contrast: Mean::default(),
            color_vibrancy: Mean::default(),
            composition: Mean::default(),
            motion: Mean::default(),
            person: Mean::default(),
            center_focus: Mean::default(),
            movement_type: Mode::new(),
            movement_confidence: Mean::default(),
            movement_smoothness: Mean::default(),
            movement_quality: Mean::default(),
            direction_consistency: Mean::default(),
            stabilization_type: Mode::new(),
            stabilization_score: Mean::default(),
            focus_has_change: Any::default(),
            focus_change_amount: Mean::default(),
            focus_shallow_dof: Any::default(),
            lighting_type: Mode::new(),
            lighting_quality: Mean::default(),
            lighting_dramatic: Any::default(),
            grading_style: Mode::new(),
            grading_strength: Mean::default(),
            exposure_class: Mode::new(),
            exposure_score: Mean::default(),
            well_exposed: All::default(),
            dynamic_range: Mean::default(),
            shot_size: Mode::new(),
            shot_composition: Mean::default(),
            subject_ratio: Mean::default(),
            found: 0,
        }
    }

    /// Reduce a full list of observations.
    pub fn aggregate<'a>(
        observations: impl IntoIterator<Item = &'a Observation<Judgment>>,
    ) -> ScoreMetrics {
        let mut aggregator = Self::new();
        for observation in observations {
            aggregator.push(observation);
        }
        aggregator.finish()
    }

    /// Number of found judgments pushed so far.
    pub fn found(&self) -> usize {
        self.found
    }

    /// Add one observation; unavailable ones are ignored.
    pub fn push(&mut self, observation: &Observation<Judgment>) {
        if let Some(judgment) = observation.found() {
            self.push_judgment(judgment);
        }
    }

    pub fn push_judgment(&mut self, judgment: &Judgment) {
        self.found += 1;
        match judgment {
            Judgment::Sharpness(v) => self.sharpness.push(*v),
            Judgment::Brightness(v) => self.brightness.push(*v),
            Judgment::Contrast(v) => self.contrast.push(*v),
            Judgment::ColorVibrancy(v) => self.color_vibrancy.push(*v),
            Judgment::Composition(v) => self.composition.push(*v),
            Judgment::Motion(v) => self.motion.push(*v),
            Judgment::Person(p) => {
                self.person.push(p.score);
                self.center_focus.push(p.center_focus);
            }
            Judgment::CameraMovement(m) => {
                self.movement_type.push(m.movement);
                self.movement_confidence.push(m.confidence / 100.0);
                self.movement_smoothness.push(m.smoothness / 100.0);
                self.movement_quality.push(m.quality / 100.0);
                self.direction_consistency.push(m.direction_consistency);
            }
            Judgment::Stabilization(s) => {
                self.stabilization_type.push(s.stabilization);
                self.stabilization_score.push(s.score);
            }
            Judgment::Focus(f) => {
                self.focus_has_change.push(f.has_focus_change);
                self.focus_change_amount.push(f.change_amount());
                self.focus_shallow_dof.push(f.has_shallow_dof);
            }
            Judgment::Lighting(l) => {
                self.lighting_type.push(l.lighting);
                self.lighting_quality.push(l.quality());
                self.lighting_dramatic.push(l.is_dramatic);
            }
            Judgment::ColorGrading(g) => {
                self.grading_style.push(g.style);
                self.grading_strength.push(g.strength());
            }
            Judgment::Exposure(e) => {
                self.exposure_class.push(e.class);
                self.exposure_score.push(e.score / 100.0);
                self.well_exposed.push(e.is_well_exposed);
                self.dynamic_range.push(e.dynamic_range);
            }
            Judgment::ShotFraming(f) => {
                self.shot_size.push(f.shot_size);
                self.shot_composition.push(f.composition / 100.0);
                self.subject_ratio.push(f.subject_ratio);
            }
        }
    }

    /// Produce the segment record, filling neutral defaults.
    pub fn finish(&self) -> ScoreMetrics {
        let d = ScoreMetrics::default();
        ScoreMetrics {
            sharpness: self.sharpness.or(d.sharpness),
            brightness: self.brightness.or(d.brightness),
            contrast: self.contrast.or(d.contrast),
            color_vibrancy: self.color_vibrancy.or(d.color_vibrancy),
            motion_score: self.motion.or(d.motion_score),
            composition_score: self.composition.or(d.composition_score),
            person_score: self.person.or(d.person_score),
            center_focus_score: self.center_focus.or(d.center_focus_score),

            camera_movement_type: self.movement_type.or(d.camera_movement_type),
            camera_movement_confidence: self.movement_confidence.or(d.camera_movement_confidence),
            camera_movement_smoothness: self.movement_smoothness.or(d.camera_movement_smoothness),
            camera_movement_quality: self.movement_quality.or(d.camera_movement_quality),
            camera_direction_consistency: self
                .direction_consistency
                .or(d.camera_direction_consistency),

            stabilization_type: self.stabilization_type.or(d.stabilization_type),
            stabilization_score: self.stabilization_score.or(d.stabilization_score),

            focus_has_change: self.focus_has_change.0,
            focus_change_amount: self.focus_change_amount.or(d.focus_change_amount),
            focus_has_shallow_dof: self.focus_shallow_dof.0,

            lighting_type: self.lighting_type.or(d.lighting_type),
            lighting_quality: self.lighting_quality.or(d.lighting_quality),
            lighting_is_dramatic: self.lighting_dramatic.0,

            color_grading_style: self.grading_style.or(d.color_grading_style),
            color_grading_strength: self.grading_strength.or(d.color_grading_strength),

            exposure_quality: self.exposure_class.or(d.exposure_quality),
            exposure_score: self.exposure_score.or(d.exposure_score),
            exposure_is_well_exposed: self.well_exposed.value(),
            exposure_dynamic_range: self.dynamic_range.or(d.exposure_dynamic_range),

            shot_size: self.shot_size.or(d.shot_size),
            shot_composition_score: self.shot_composition.or(d.shot_composition_score),
            shot_subject_ratio: self.subject_ratio.or(d.shot_subject_ratio),
        }
    }
}

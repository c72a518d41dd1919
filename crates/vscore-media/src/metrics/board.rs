//! Multi-label confidence scoring.
//!
//! Predicates are evaluated in a fixed order; each one that fires records a
//! label with a confidence in `0..=100`. The dominant label is the first
//! maximum in evaluation order. When nothing fires the caller's neutral
//! label is returned with confidence [`NEUTRAL_CONFIDENCE`].

/// Confidence assigned to the neutral label when no predicate fires.
pub const NEUTRAL_CONFIDENCE: f64 = 50.0;

/// Ordered record of fired predicates.
#[derive(Debug, Clone)]
pub struct ConfidenceBoard<L> {
    entries: Vec<(L, f64)>,
}

impl<L: Copy> ConfidenceBoard<L> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record `label` with `confidence` (clamped to `0..=100`).
    pub fn record(&mut self, label: L, confidence: f64) {
        self.entries.push((label, super::clamp(confidence, 0.0, 100.0)));
    }

    /// Record `label` when `fired`, computing the confidence lazily.
    /// Returns whether it fired, so callers can chain `else` branches.
    pub fn record_if(&mut self, fired: bool, label: L, confidence: impl FnOnce() -> f64) -> bool {
        if fired {
            self.record(label, confidence());
        }
        fired
    }

    /// First label with the highest confidence.
    pub fn dominant(&self) -> Option<(L, f64)> {
        self.entries.iter().copied().fold(None, |best, (label, conf)| match best {
            Some((_, best_conf)) if best_conf >= conf => best,
            _ => Some((label, conf)),
        })
    }

    /// Dominant label, or `neutral` at [`NEUTRAL_CONFIDENCE`].
    pub fn resolve(&self, neutral: L) -> (L, f64) {
        self.dominant().unwrap_or((neutral, NEUTRAL_CONFIDENCE))
    }

    /// Every fired label, in evaluation order.
    pub fn labels(&self) -> Vec<L> {
        self.entries.iter().map(|(label, _)| *label).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<L: Copy> Default for ConfidenceBoard<L> {
    fn default() -> Self {
        Self::new()
    }
}

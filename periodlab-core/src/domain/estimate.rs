//! Per-trial period estimates and the ordered result set.

use serde::{Deserialize, Serialize};

/// Outcome of one trial's period extraction.
///
/// Two explicit variants instead of a zero-period sentinel: a rejected
/// periodogram can never be mistaken for a real period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    Detected { period: f64 },
    NoDetection,
}

impl Detection {
    pub fn period(&self) -> Option<f64> {
        match self {
            Detection::Detected { period } => Some(*period),
            Detection::NoDetection => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Detection::Detected { .. })
    }
}

/// Where a trial's magnitudes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialSource {
    /// Trial 0: the measured magnitudes, never resampled.
    Baseline,
    /// Trials 1.. : a noise-perturbed realization.
    Perturbed,
}

impl TrialSource {
    pub fn for_trial(trial: usize) -> Self {
        if trial == 0 {
            TrialSource::Baseline
        } else {
            TrialSource::Perturbed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrialSource::Baseline => "baseline",
            TrialSource::Perturbed => "perturbed",
        }
    }
}

/// A detection tagged with the trial that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodEstimate {
    pub trial: usize,
    pub source: TrialSource,
    pub detection: Detection,
}

impl PeriodEstimate {
    pub fn new(trial: usize, detection: Detection) -> Self {
        Self {
            trial,
            source: TrialSource::for_trial(trial),
            detection,
        }
    }

    /// Positive, finite period if this trial detected one.
    pub fn usable_period(&self) -> Option<f64> {
        self.detection
            .period()
            .filter(|p| p.is_finite() && *p > 0.0)
    }
}

/// Ordered estimates, one per completed trial; index 0 is the baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    estimates: Vec<PeriodEstimate>,
}

impl ResultSet {
    /// Build a result set; estimates are ordered by trial index.
    pub fn new(mut estimates: Vec<PeriodEstimate>) -> Self {
        estimates.sort_by_key(|e| e.trial);
        Self { estimates }
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn estimates(&self) -> &[PeriodEstimate] {
        &self.estimates
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeriodEstimate> {
        self.estimates.iter()
    }

    pub fn baseline(&self) -> Option<&PeriodEstimate> {
        self.estimates
            .first()
            .filter(|e| e.source == TrialSource::Baseline)
    }

    /// Detections as a plain list, `None` for non-detections.
    pub fn detections(&self) -> Vec<Option<f64>> {
        self.estimates.iter().map(|e| e.detection.period()).collect()
    }

    /// Positive, finite periods in trial order.
    pub fn periods(&self) -> Vec<f64> {
        self.estimates
            .iter()
            .filter_map(PeriodEstimate::usable_period)
            .collect()
    }

    pub fn no_detection_count(&self) -> usize {
        self.estimates
            .iter()
            .filter(|e| !e.detection.is_detected())
            .count()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a PeriodEstimate;
    type IntoIter = std::slice::Iter<'a, PeriodEstimate>;

    fn into_iter(self) -> Self::IntoIter {
        self.estimates.iter()
    }
}

//! Spectral estimation capability.
//!
//! The trial loop only needs two operations from a periodogram backend, so
//! they live behind [`SpectralEstimator`]. Production runs use
//! [`LombScargle`]; tests and benchmarks use [`FixedSpectrum`].

pub mod fixed;
pub mod lomb_scargle;

pub use fixed::FixedSpectrum;
pub use lomb_scargle::{LombScargle, MAX_GRID};

use serde::{Deserialize, Serialize};

use crate::domain::SeriesView;
use crate::error::EstimationError;

/// Periodogram backend.
///
/// Implementations must be deterministic: identical inputs give identical
/// outputs. They must fail with an [`EstimationError`] rather than return a
/// grid they could not compute.
pub trait SpectralEstimator: Send + Sync {
    /// Short identifier recorded in run manifests.
    fn name(&self) -> &str;

    /// Power over an automatically chosen frequency grid.
    fn periodogram(
        &self,
        series: SeriesView<'_>,
        nyquist_factor: u32,
    ) -> Result<Periodogram, EstimationError>;

    /// Period of maximum power restricted to the inclusive band `(lo, hi)`.
    fn best_period(
        &self,
        series: SeriesView<'_>,
        range: (f64, f64),
    ) -> Result<f64, EstimationError>;
}

/// Paired (period, power) sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Periodogram {
    periods: Vec<f64>,
    powers: Vec<f64>,
}

impl Periodogram {
    /// Pair periods with powers. Lengths must match and every value must be
    /// finite; an empty periodogram is representable so callers can reject it.
    pub fn new(periods: Vec<f64>, powers: Vec<f64>) -> Result<Self, EstimationError> {
        if periods.len() != powers.len() {
            return Err(EstimationError::MalformedPeriodogram(format!(
                "{} periods but {} powers",
                periods.len(),
                powers.len()
            )));
        }
        if let Some(i) = powers.iter().position(|p| !p.is_finite()) {
            return Err(EstimationError::MalformedPeriodogram(format!(
                "non-finite power at index {i}"
            )));
        }
        if let Some(i) = periods.iter().position(|p| !p.is_finite() || *p <= 0.0) {
            return Err(EstimationError::MalformedPeriodogram(format!(
                "non-positive or non-finite period at index {i}"
            )));
        }
        Ok(Self { periods, powers })
    }

    pub fn periods(&self) -> &[f64] {
        &self.periods
    }

    pub fn powers(&self) -> &[f64] {
        &self.powers
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// Largest power, or `None` for an empty periodogram.
    pub fn max_power(&self) -> Option<f64> {
        self.powers.iter().copied().reduce(f64::max)
    }

    /// (period, power) of the highest peak; first occurrence wins ties.
    pub fn peak(&self) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for (&period, &power) in self.periods.iter().zip(&self.powers) {
            if best.map_or(true, |(_, p)| power > p) {
                best = Some((period, power));
            }
        }
        best
    }
}

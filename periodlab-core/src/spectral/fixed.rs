//! Deterministic estimator that ignores its input.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Periodogram, SpectralEstimator};
use crate::domain::SeriesView;
use crate::error::EstimationError;

/// Returns the same periodogram and best period for every series.
///
/// Counts calls so tests can assert which operations a trial used.
#[derive(Debug)]
pub struct FixedSpectrum {
    periodogram: Periodogram,
    best_period: f64,
    periodogram_calls: AtomicUsize,
    best_period_calls: AtomicUsize,
}

impl FixedSpectrum {
    pub fn new(periodogram: Periodogram, best_period: f64) -> Self {
        Self {
            periodogram,
            best_period,
            periodogram_calls: AtomicUsize::new(0),
            best_period_calls: AtomicUsize::new(0),
        }
    }

    /// Three-point spectrum whose highest power is `max_power`.
    pub fn with_peak(max_power: f64, best_period: f64) -> Self {
        let periodogram = Periodogram {
            periods: vec![best_period * 2.0, best_period, best_period / 2.0],
            powers: vec![max_power / 4.0, max_power, max_power / 2.0],
        };
        Self::new(periodogram, best_period)
    }

    pub fn periodogram_calls(&self) -> usize {
        self.periodogram_calls.load(Ordering::Relaxed)
    }

    pub fn best_period_calls(&self) -> usize {
        self.best_period_calls.load(Ordering::Relaxed)
    }
}

impl SpectralEstimator for FixedSpectrum {
    fn name(&self) -> &str {
        "fixed"
    }

    fn periodogram(
        &self,
        _series: SeriesView<'_>,
        _nyquist_factor: u32,
    ) -> Result<Periodogram, EstimationError> {
        self.periodogram_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.periodogram.clone())
    }

    fn best_period(
        &self,
        _series: SeriesView<'_>,
        range: (f64, f64),
    ) -> Result<f64, EstimationError> {
        self.best_period_calls.fetch_add(1, Ordering::Relaxed);
        let (lo, hi) = range;
        if !(lo..=hi).contains(&self.best_period) {
            return Err(EstimationError::EmptySearchRange { lo, hi });
        }
        Ok(self.best_period)
    }
}

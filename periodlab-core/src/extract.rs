//! PeriodExtractor: quality-gated best-period selection for one series.

use tracing::trace;

use crate::config::Configuration;
use crate::domain::{Detection, SeriesView};
use crate::error::EstimationError;
use crate::spectral::{Periodogram, SpectralEstimator};

/// Applies the detection gate, then searches the configured period band.
///
/// 1. Compute the automatic periodogram.
/// 2. If its highest power is strictly below `detection_threshold`, the trial
///    recovered no credible periodicity: [`Detection::NoDetection`].
/// 3. Otherwise return the best period inside `period_search_range`.
///
/// An empty or malformed periodogram is an [`EstimationError`], never a
/// non-detection.
#[derive(Clone, Copy)]
pub struct PeriodExtractor<'e> {
    estimator: &'e dyn SpectralEstimator,
    detection_threshold: f64,
    period_search_range: (f64, f64),
    nyquist_factor: u32,
}

impl<'e> PeriodExtractor<'e> {
    pub fn new(estimator: &'e dyn SpectralEstimator, config: &Configuration) -> Self {
        Self {
            estimator,
            detection_threshold: config.detection_threshold,
            period_search_range: config.period_search_range,
            nyquist_factor: config.nyquist_factor,
        }
    }

    pub fn estimator(&self) -> &'e dyn SpectralEstimator {
        self.estimator
    }

    pub fn extract(&self, series: SeriesView<'_>) -> Result<Detection, EstimationError> {
        self.extract_with_periodogram(series).map(|(d, _)| d)
    }

    /// Like [`extract`](Self::extract) but also hands back the periodogram
    /// the gate was applied to.
    pub fn extract_with_periodogram(
        &self,
        series: SeriesView<'_>,
    ) -> Result<(Detection, Periodogram), EstimationError> {
        let periodogram = self.estimator.periodogram(series, self.nyquist_factor)?;
        let max_power = periodogram
            .max_power()
            .ok_or(EstimationError::EmptyPeriodogram)?;

        if max_power < self.detection_threshold {
            trace!(max_power, threshold = self.detection_threshold, "below detection gate");
            return Ok((Detection::NoDetection, periodogram));
        }

        let period = self
            .estimator
            .best_period(series, self.period_search_range)?;
        if !period.is_finite() || period <= 0.0 {
            return Err(EstimationError::MalformedPeriodogram(format!(
                "best period {period} is not a positive finite value"
            )));
        }

        trace!(max_power, period, "detection");
        Ok((Detection::Detected { period }, periodogram))
    }
}

impl std::fmt::Debug for PeriodExtractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodExtractor")
            .field("estimator", &self.estimator.name())
            .field("detection_threshold", &self.detection_threshold)
            .field("period_search_range", &self.period_search_range)
            .field("nyquist_factor", &self.nyquist_factor)
            .finish()
    }
}

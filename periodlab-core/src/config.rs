//! Monte Carlo configuration.

use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

/// Everything that shapes a period robustness run.
///
/// Defaults reproduce the survey setup this tool was built for: a 0.1 power
/// gate, a 500–2000 day search band and a Nyquist factor of 10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// Minimum periodogram peak power for a trial to count as a detection.
    /// A peak exactly at the threshold passes.
    pub detection_threshold: f64,
    /// Inclusive (lo, hi) band searched for the best period.
    pub period_search_range: (f64, f64),
    /// Highest searched frequency as a multiple of the average Nyquist frequency.
    pub nyquist_factor: u32,
    /// Total trials including the unperturbed baseline.
    pub trial_count: usize,
    /// Master seed; each trial derives its own stream from it.
    pub master_seed: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            detection_threshold: 0.1,
            period_search_range: (500.0, 2000.0),
            nyquist_factor: 10,
            trial_count: 100,
            master_seed: 42,
        }
    }
}

impl Configuration {
    /// Reject any configuration the trial loop cannot run with.
    pub fn validate(&self) -> Result<(), PeriodError> {
        if self.trial_count < 1 {
            return Err(PeriodError::InvalidConfiguration(
                "trial_count must be at least 1 (trial 0 is the baseline)".into(),
            ));
        }

        let (lo, hi) = self.period_search_range;
        if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 {
            return Err(PeriodError::InvalidConfiguration(format!(
                "period_search_range bounds must be positive and finite, got ({lo}, {hi})"
            )));
        }
        if lo >= hi {
            return Err(PeriodError::InvalidConfiguration(format!(
                "period_search_range lower bound {lo} must be below upper bound {hi}"
            )));
        }

        if self.nyquist_factor == 0 {
            return Err(PeriodError::InvalidConfiguration(
                "nyquist_factor must be a positive integer".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(PeriodError::InvalidConfiguration(format!(
                "detection_threshold must lie in [0, 1], got {}",
                self.detection_threshold
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Configuration::default();
        assert_eq!(config.detection_threshold, 0.1);
        assert_eq!(config.period_search_range, (500.0, 2000.0));
        assert_eq!(config.nyquist_factor, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_trials_rejected() {
        let config = Configuration {
            trial_count: 0,
            ..Configuration::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PeriodError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        let config = Configuration {
            period_search_range: (2000.0, 500.0),
            ..Configuration::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PeriodError::InvalidConfiguration(_))
        ));

        let equal = Configuration {
            period_search_range: (10.0, 10.0),
            ..Configuration::default()
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn nan_threshold_rejected() {
        let config = Configuration {
            detection_threshold: f64::NAN,
            ..Configuration::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_nyquist_factor_rejected() {
        let config = Configuration {
            nyquist_factor: 0,
            ..Configuration::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_field_fails_to_parse() {
        let json = r#"{"trial_count": 5, "detection_treshold": 0.2}"#;
        assert!(serde_json::from_str::<Configuration>(json).is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Configuration = serde_json::from_str(r#"{"trial_count": 5}"#).unwrap();
        assert_eq!(config.trial_count, 5);
        assert_eq!(config.nyquist_factor, 10);
    }
}

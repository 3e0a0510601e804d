//! Distribution summary of recovered periods.
//!
//! Keeps the uncertainty of the Monte Carlo ensemble next to the histogram:
//! robust centre and spread plus a 95% interval.

use serde::{Deserialize, Serialize};

use periodlab_core::ResultSet;

/// Summary statistics over the detected periods of a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Number of trials with a usable period.
    pub detected: usize,
    /// Period recovered from the unperturbed curve, if it passed the gate.
    pub baseline_period: Option<f64>,
    pub median: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    /// Interquartile range (Q3 - Q1).
    pub iqr: Option<f64>,
    /// 2.5th and 97.5th percentiles; needs at least two detections.
    pub ci_95: Option<(f64, f64)>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PeriodSummary {
    pub fn from_result_set(result_set: &ResultSet) -> Self {
        let baseline_period = result_set
            .baseline()
            .and_then(|e| e.usable_period());
        let mut periods = result_set.periods();
        periods.sort_by(f64::total_cmp);

        if periods.is_empty() {
            return Self {
                detected: 0,
                baseline_period,
                median: None,
                mean: None,
                std_dev: None,
                iqr: None,
                ci_95: None,
                min: None,
                max: None,
            };
        }

        let n = periods.len() as f64;
        let mean = periods.iter().sum::<f64>() / n;
        let variance = periods.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let ci_95 = (periods.len() >= 2).then(|| {
            (
                percentile_sorted(&periods, 2.5),
                percentile_sorted(&periods, 97.5),
            )
        });

        Self {
            detected: periods.len(),
            baseline_period,
            median: Some(percentile_sorted(&periods, 50.0)),
            mean: Some(mean),
            std_dev: Some(variance.sqrt()),
            iqr: Some(iqr_sorted(&periods)),
            ci_95,
            min: periods.first().copied(),
            max: periods.last().copied(),
        }
    }
}

/// Percentile of a sorted slice using linear interpolation.
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

pub(crate) fn iqr_sorted(sorted: &[f64]) -> f64 {
    percentile_sorted(sorted, 75.0) - percentile_sorted(sorted, 25.0)
}

//! Aggregator: histogram of recovered periods plus the non-detection rate.
//!
//! Non-detections are dropped before binning and reported as a rate instead.
//! A high rate means the candidate period is not reliably recoverable under
//! the measurement uncertainties.
//!
//! # Bin-count rules
//!
//! For `n` detected periods spanning `[min, max]`:
//!
//! | Rule | Bins |
//! | --- | --- |
//! | `Sqrt` | `ceil(sqrt(n))` |
//! | `Sturges` | `ceil(log2(n)) + 1` |
//! | `FreedmanDiaconis` | `ceil((max - min) / (2 · IQR · n^(-1/3)))`, Sturges when IQR = 0 |
//! | `Auto` (default) | `max(Sturges, FreedmanDiaconis)` |
//!
//! Bins are equal width over `[min, max]`; the last bin is closed on the
//! right. When every period is identical the histogram is one bin
//! `[v - 0.5, v + 0.5]`.

use serde::{Deserialize, Serialize};

use periodlab_core::ResultSet;

use crate::stats::iqr_sorted;

/// Upper bound on bin count; guards against extreme outliers under FD.
pub const MAX_BINS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinRule {
    Sqrt,
    Sturges,
    FreedmanDiaconis,
    #[default]
    Auto,
}

impl BinRule {
    /// Number of bins for sorted, non-empty `values`.
    pub fn bin_count(&self, sorted: &[f64]) -> usize {
        let n = sorted.len();
        if n == 0 {
            return 0;
        }
        let bins = match self {
            BinRule::Sqrt => (n as f64).sqrt().ceil() as usize,
            BinRule::Sturges => sturges(n),
            BinRule::FreedmanDiaconis => freedman_diaconis(sorted).unwrap_or_else(|| sturges(n)),
            BinRule::Auto => freedman_diaconis(sorted).map_or(sturges(n), |fd| fd.max(sturges(n))),
        };
        bins.clamp(1, MAX_BINS)
    }
}

impl std::str::FromStr for BinRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqrt" => Ok(BinRule::Sqrt),
            "sturges" => Ok(BinRule::Sturges),
            "fd" | "freedman_diaconis" => Ok(BinRule::FreedmanDiaconis),
            "auto" => Ok(BinRule::Auto),
            other => Err(format!(
                "unknown bin rule '{other}'. Valid: sqrt, sturges, fd, auto"
            )),
        }
    }
}

fn sturges(n: usize) -> usize {
    (n as f64).log2().ceil() as usize + 1
}

fn freedman_diaconis(sorted: &[f64]) -> Option<usize> {
    let n = sorted.len() as f64;
    let width = 2.0 * iqr_sorted(sorted) * n.powf(-1.0 / 3.0);
    if width <= 0.0 {
        return None;
    }
    let span = sorted[sorted.len() - 1] - sorted[0];
    Some((span / width).ceil() as usize)
}

/// Binned detected periods and the fraction of trials without a detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `counts.len() + 1` edges, or none when nothing was detected.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub rule: BinRule,
    pub total_trials: usize,
    pub no_detection_count: usize,
    /// `no_detection_count / total_trials`; 0.0 for an empty result set.
    pub non_detection_rate: f64,
}

impl Histogram {
    /// Bin a result set with the default rule.
    pub fn build(result_set: &ResultSet) -> Self {
        Self::build_with_rule(result_set, BinRule::default())
    }

    pub fn build_with_rule(result_set: &ResultSet, rule: BinRule) -> Self {
        let total_trials = result_set.len();
        let no_detection_count = result_set.no_detection_count();
        let non_detection_rate = if total_trials == 0 {
            0.0
        } else {
            no_detection_count as f64 / total_trials as f64
        };

        let mut periods = result_set.periods();
        periods.sort_by(f64::total_cmp);
        let (edges, counts) = bin(&periods, rule);

        Self {
            edges,
            counts,
            rule,
            total_trials,
            no_detection_count,
            non_detection_rate,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of periods that landed in some bin.
    pub fn binned(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.binned() == 0
    }

    /// (lo, hi, count) per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(w, &c)| (w[0], w[1], c))
    }

    /// Centre of the fullest bin; first one wins ties.
    pub fn mode(&self) -> Option<f64> {
        let mut best: Option<(usize, usize)> = None;
        for (i, &c) in self.counts.iter().enumerate() {
            if c > 0 && best.map_or(true, |(_, bc)| c > bc) {
                best = Some((i, c));
            }
        }
        best.map(|(i, _)| 0.5 * (self.edges[i] + self.edges[i + 1]))
    }
}

fn bin(sorted: &[f64], rule: BinRule) -> (Vec<f64>, Vec<usize>) {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return (Vec::new(), Vec::new());
    };

    if max == min {
        return (vec![min - 0.5, min + 0.5], vec![sorted.len()]);
    }

    let bins = rule.bin_count(sorted);
    let width = (max - min) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| min + width * i as f64).collect();
    edges.push(max);

    let mut counts = vec![0usize; bins];
    for &v in sorted {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    (edges, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use periodlab_core::{Detection, PeriodEstimate};

    fn result_set(periods: &[Option<f64>]) -> ResultSet {
        ResultSet::new(
            periods
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let d = p.map_or(Detection::NoDetection, |period| Detection::Detected { period });
                    PeriodEstimate::new(i, d)
                })
                .collect(),
        )
    }

    #[test]
    fn all_non_detections_give_empty_histogram() {
        let h = Histogram::build(&result_set(&[None, None, None]));
        assert!(h.is_empty());
        assert_eq!(h.bin_count(), 0);
        assert_eq!(h.non_detection_rate, 1.0);
        assert_eq!(h.mode(), None);
    }

    #[test]
    fn non_detection_rate_over_all_trials() {
        let h = Histogram::build(&result_set(&[Some(1000.0), None, Some(1010.0), None]));
        assert_eq!(h.total_trials, 4);
        assert_eq!(h.no_detection_count, 2);
        assert_eq!(h.non_detection_rate, 0.5);
        assert_eq!(h.binned(), 2);
    }

    #[test]
    fn identical_periods_single_unit_bin() {
        let h = Histogram::build(&result_set(&[Some(3.0), Some(3.0)]));
        assert_eq!(h.edges, vec![2.5, 3.5]);
        assert_eq!(h.counts, vec![2]);
        assert_eq!(h.mode(), Some(3.0));
    }

    #[test]
    fn maximum_lands_in_last_bin() {
        let periods: Vec<Option<f64>> = (0..9).map(|i| Some(100.0 + i as f64)).collect();
        let h = Histogram::build_with_rule(&result_set(&periods), BinRule::Sqrt);
        assert_eq!(h.bin_count(), 3);
        assert_eq!(h.binned(), 9);
        assert_eq!(*h.edges.last().unwrap(), 108.0);
        assert_eq!(h.counts, vec![3, 3, 3]);
    }

    #[test]
    fn sturges_counts() {
        let v: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(BinRule::Sturges.bin_count(&v), 8);
        assert_eq!(BinRule::Sqrt.bin_count(&v), 10);
    }

    #[test]
    fn auto_is_max_of_sturges_and_fd() {
        let v: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let fd = BinRule::FreedmanDiaconis.bin_count(&v);
        let st = BinRule::Sturges.bin_count(&v);
        assert_eq!(BinRule::Auto.bin_count(&v), fd.max(st));
        // IQR = 499.5, width = 2 * 499.5 / 10 = 99.9, span 999
        assert!((10..=11).contains(&fd));
    }

    #[test]
    fn fd_falls_back_to_sturges_when_iqr_is_zero() {
        let mut v = vec![5.0; 20];
        v.push(6.0);
        assert_eq!(
            BinRule::FreedmanDiaconis.bin_count(&v),
            BinRule::Sturges.bin_count(&v)
        );
    }

    #[test]
    fn build_is_idempotent() {
        let rs = result_set(&[Some(900.0), Some(1100.0), None, Some(1000.0), Some(1050.0)]);
        assert_eq!(Histogram::build(&rs), Histogram::build(&rs));
    }

    #[test]
    fn parses_rule_names() {
        assert_eq!("fd".parse::<BinRule>(), Ok(BinRule::FreedmanDiaconis));
        assert_eq!("auto".parse::<BinRule>(), Ok(BinRule::Auto));
        assert!("scott".parse::<BinRule>().is_err());
    }
}

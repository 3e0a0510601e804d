//! Floating-mean, error-weighted Lomb–Scargle periodogram.
//!
//! Power is the fraction of weighted variance explained by a sinusoid plus
//! offset at each frequency, so it lies in [0, 1]:
//!
//! ```text
//! P(f) = (SS·YC² + CC·YS² − 2·CS·YC·YS) / (YY · (CC·SS − CS²))
//! ```
//!
//! with every sum weighted by normalised `w_i ∝ 1/σ_i²` and centred on the
//! weighted means. Grids are regular in frequency, and sin/cos are advanced
//! by rotation instead of being recomputed at every grid step.

use std::f64::consts::TAU;

use tracing::debug;

use super::{Periodogram, SpectralEstimator};
use crate::domain::SeriesView;
use crate::error::EstimationError;

/// Steps between exact sin/cos re-anchoring in the rotation recurrence.
const REANCHOR_EVERY: usize = 512;

/// Relative variance below which the magnitudes count as constant.
const CONSTANT_TOLERANCE: f64 = 1e-20;

/// Upper bound on the points of any one frequency scan.
pub const MAX_GRID: usize = 10_000_000;

/// Weighted sin/cos variance below this is rounding noise: over the baseline
/// the sinusoid is indistinguishable from the offset.
const DEGENERATE_VARIANCE: f64 = 1e-12;

/// `CC·SS − CS²` below this fraction of `CC·SS` means a singular fit.
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Points needed to cover `span` at `step`, endpoints included.
fn grid_points(span: f64, step: f64) -> Result<usize, EstimationError> {
    let requested = (span / step).ceil() + 1.0;
    if !(requested <= MAX_GRID as f64) {
        return Err(EstimationError::GridTooLarge {
            requested,
            max: MAX_GRID,
        });
    }
    Ok((requested as usize).max(2))
}

#[derive(Debug, Clone)]
pub struct LombScargle {
    /// Frequency grid points per peak width (1/T) in the automatic periodogram.
    pub oversampling: f64,
    /// Grid points per peak width on the coarse best-period scan.
    pub first_pass_coverage: f64,
    /// Grid points per peak width when zooming on candidates.
    pub final_pass_coverage: f64,
    /// Number of coarse peaks refined by the zoom pass.
    pub refine_candidates: usize,
}

impl Default for LombScargle {
    fn default() -> Self {
        Self {
            oversampling: 5.0,
            first_pass_coverage: 5.0,
            final_pass_coverage: 500.0,
            refine_candidates: 5,
        }
    }
}

/// Centred, weighted series ready for repeated power evaluation.
struct Prepared {
    t: Vec<f64>,
    y: Vec<f64>,
    w: Vec<f64>,
    yy: f64,
    baseline: f64,
}

impl Prepared {
    fn new(series: SeriesView<'_>) -> Result<Self, EstimationError> {
        for (column, values) in [
            ("time", series.time),
            ("magnitude", series.magnitude),
            ("magnitude_error", series.magnitude_error),
        ] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(EstimationError::NonFiniteInput { column, index });
            }
        }

        let n = series.len();
        if n == 0 || series.magnitude.len() != n || series.magnitude_error.len() != n {
            return Err(EstimationError::InsufficientTimeSpan { distinct: 0 });
        }

        let t_min = series.time.iter().copied().fold(f64::INFINITY, f64::min);
        let t_max = series.time.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let baseline = t_max - t_min;
        if baseline <= 0.0 {
            return Err(EstimationError::InsufficientTimeSpan { distinct: 1 });
        }

        let mut w: Vec<f64> = if series.magnitude_error.iter().all(|&s| s > 0.0) {
            series.magnitude_error.iter().map(|s| 1.0 / (s * s)).collect()
        } else {
            debug!("zero magnitude errors present; using uniform weights");
            vec![1.0; n]
        };
        let w_sum: f64 = w.iter().sum();
        w.iter_mut().for_each(|wi| *wi /= w_sum);

        let mean: f64 = w.iter().zip(series.magnitude).map(|(wi, m)| wi * m).sum();
        let scale: f64 = w.iter().zip(series.magnitude).map(|(wi, m)| wi * m * m).sum();
        let y: Vec<f64> = series.magnitude.iter().map(|m| m - mean).collect();
        let mut yy: f64 = w.iter().zip(&y).map(|(wi, yi)| wi * yi * yi).sum();
        if yy <= scale * CONSTANT_TOLERANCE {
            yy = 0.0;
        }

        Ok(Self {
            t: series.time.iter().map(|t| t - t_min).collect(),
            y,
            w,
            yy,
            baseline,
        })
    }

    /// Power at `nf` frequencies `f0, f0 + df, ...`.
    fn scan(&self, f0: f64, df: f64, nf: usize) -> Vec<f64> {
        if self.yy == 0.0 {
            return vec![0.0; nf];
        }

        let n = self.t.len();
        let mut cos_t = vec![0.0; n];
        let mut sin_t = vec![0.0; n];
        let (step_sin, step_cos): (Vec<f64>, Vec<f64>) =
            self.t.iter().map(|&t| (TAU * df * t).sin_cos()).unzip();

        let mut powers = Vec::with_capacity(nf);
        for k in 0..nf {
            if k % REANCHOR_EVERY == 0 {
                let f = f0 + df * k as f64;
                for i in 0..n {
                    let (s, c) = (TAU * f * self.t[i]).sin_cos();
                    sin_t[i] = s;
                    cos_t[i] = c;
                }
            } else {
                for i in 0..n {
                    let c = cos_t[i] * step_cos[i] - sin_t[i] * step_sin[i];
                    let s = sin_t[i] * step_cos[i] + cos_t[i] * step_sin[i];
                    cos_t[i] = c;
                    sin_t[i] = s;
                }
            }
            powers.push(self.power_from(&cos_t, &sin_t));
        }
        powers
    }

    fn power_from(&self, cos_t: &[f64], sin_t: &[f64]) -> f64 {
        let (mut c, mut s, mut yc, mut ys, mut cc, mut cs) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        for i in 0..self.t.len() {
            let (wi, yi, ci, si) = (self.w[i], self.y[i], cos_t[i], sin_t[i]);
            c += wi * ci;
            s += wi * si;
            yc += wi * yi * ci;
            ys += wi * yi * si;
            cc += wi * ci * ci;
            cs += wi * ci * si;
        }
        let ss = (1.0 - cc) - s * s;
        let cc = cc - c * c;
        let cs = cs - c * s;
        if cc <= DEGENERATE_VARIANCE || ss <= DEGENERATE_VARIANCE {
            return 0.0;
        }

        let d = cc * ss - cs * cs;
        if d <= SINGULAR_TOLERANCE * cc * ss {
            return 0.0;
        }
        let p = (ss * yc * yc + cc * ys * ys - 2.0 * cs * yc * ys) / (self.yy * d);
        p.clamp(0.0, 1.0)
    }
}

impl LombScargle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequency grid `(f0, df, nf)` for the automatic periodogram.
    fn auto_grid(
        &self,
        n: usize,
        baseline: f64,
        nyquist_factor: u32,
    ) -> Result<(f64, f64, usize), EstimationError> {
        let df = 1.0 / (baseline * self.oversampling);
        let requested = (0.5 * self.oversampling * f64::from(nyquist_factor) * n as f64).floor();
        if !(requested <= MAX_GRID as f64) {
            return Err(EstimationError::GridTooLarge {
                requested,
                max: MAX_GRID,
            });
        }
        Ok((df, df, (requested as usize).max(1)))
    }
}

impl SpectralEstimator for LombScargle {
    fn name(&self) -> &str {
        "lomb-scargle"
    }

    fn periodogram(
        &self,
        series: SeriesView<'_>,
        nyquist_factor: u32,
    ) -> Result<Periodogram, EstimationError> {
        let prepared = Prepared::new(series)?;
        let (f0, df, nf) = self.auto_grid(series.len(), prepared.baseline, nyquist_factor)?;
        let powers = prepared.scan(f0, df, nf);
        let periods = (0..nf).map(|k| 1.0 / (f0 + df * k as f64)).collect();
        Periodogram::new(periods, powers)
    }

    fn best_period(
        &self,
        series: SeriesView<'_>,
        range: (f64, f64),
    ) -> Result<f64, EstimationError> {
        let (lo, hi) = range;
        if !(lo > 0.0 && lo < hi && hi.is_finite()) {
            return Err(EstimationError::EmptySearchRange { lo, hi });
        }
        let prepared = Prepared::new(series)?;

        // Coarse linear scan over [1/hi, 1/lo], endpoints included.
        let (f_min, f_max) = (1.0 / hi, 1.0 / lo);
        let coarse_step_target = 1.0 / (prepared.baseline * self.first_pass_coverage);
        let n_coarse = grid_points(f_max - f_min, coarse_step_target)?;
        let coarse_df = (f_max - f_min) / (n_coarse - 1) as f64;
        let coarse = prepared.scan(f_min, coarse_df, n_coarse);

        let mut order: Vec<usize> = (0..n_coarse).collect();
        order.sort_by(|&a, &b| coarse[b].total_cmp(&coarse[a]).then(a.cmp(&b)));

        let fine_target = 1.0 / (prepared.baseline * self.final_pass_coverage);
        let mut best = (f_min + coarse_df * order[0] as f64, coarse[order[0]]);

        for &k in order.iter().take(self.refine_candidates.max(1)) {
            let center = f_min + coarse_df * k as f64;
            let start = (center - coarse_df).max(f_min);
            let stop = (center + coarse_df).min(f_max);
            let n_fine = grid_points(stop - start, fine_target)?;
            let fine_df = (stop - start) / (n_fine - 1) as f64;
            let fine = prepared.scan(start, fine_df, n_fine);

            for (j, &p) in fine.iter().enumerate() {
                if p > best.1 {
                    best = (start + fine_df * j as f64, p);
                }
            }
        }

        // Non-constant data with no power anywhere: the baseline resolves no
        // frequency in the band.
        if best.1 <= 0.0 && prepared.yy > 0.0 {
            return Err(EstimationError::EmptySearchRange { lo, hi });
        }

        debug!(period = 1.0 / best.0, power = best.1, "best period in range");
        Ok(1.0 / best.0)
    }
}

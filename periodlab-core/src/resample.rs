//! Resampler: one Gaussian realization of the measured magnitudes.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::domain::{LightCurve, Realization};

/// Draw `magnitude'_i ~ N(magnitude_i, magnitude_error_i)` independently for every point.
///
/// Exactly one standard-normal variate is consumed per point, so point `i`
/// always sees the `i`-th draw of the stream. A zero error returns the
/// measured magnitude unchanged.
pub fn perturb<'a, R: Rng>(light_curve: &'a LightCurve, rng: &mut R) -> Realization<'a> {
    let magnitude = light_curve
        .magnitude()
        .iter()
        .zip(light_curve.magnitude_error())
        .map(|(&m, &sigma)| {
            let z: f64 = rng.sample(StandardNormal);
            if sigma == 0.0 {
                m
            } else {
                m + sigma * z
            }
        })
        .collect();

    Realization::new(light_curve, magnitude)
}

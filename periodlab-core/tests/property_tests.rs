//! Property tests for core invariants.
//!
//! Uses proptest to verify:
//! 1. Zero-error curves resample to themselves
//! 2. Light-curve validation rejects exactly the malformed inputs
//! 3. The extraction gate agrees with the threshold comparison
//! 4. Lomb–Scargle power stays in [0, 1]

use periodlab_core::rng::PERTURB_STREAM;
use periodlab_core::{
    perturb, Configuration, Detection, FixedSpectrum, LightCurve, LombScargle, PeriodError,
    PeriodExtractor, RngHierarchy, SpectralEstimator,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_magnitudes(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(5.0..25.0_f64, n)
}

fn arb_curve() -> impl Strategy<Value = LightCurve> {
    (2usize..40).prop_flat_map(|n| {
        (
            prop::collection::vec(0.01..5.0_f64, n),
            arb_magnitudes(n),
            prop::collection::vec(0.0..0.5_f64, n),
        )
            .prop_map(|(gaps, mag, err)| {
                let time: Vec<f64> = gaps
                    .iter()
                    .scan(0.0, |t, g| {
                        *t += g;
                        Some(*t)
                    })
                    .collect();
                LightCurve::new(time, mag, err).unwrap()
            })
    })
}

// ── 1. Zero-error identity ───────────────────────────────────────────

proptest! {
    #[test]
    fn zero_error_realization_is_identity(
        mag in (1usize..50).prop_flat_map(arb_magnitudes),
        seed in any::<u64>(),
        trial in 1u64..1000,
    ) {
        let n = mag.len();
        let lc = LightCurve::new((0..n).map(|i| i as f64).collect(), mag, vec![0.0; n]).unwrap();
        let mut rng = RngHierarchy::new(seed).rng_for(PERTURB_STREAM, trial);
        let r = perturb(&lc, &mut rng);
        prop_assert_eq!(r.magnitude(), lc.magnitude());
    }

    #[test]
    fn realization_is_reproducible_from_seed(lc in arb_curve(), seed in any::<u64>()) {
        let h = RngHierarchy::new(seed);
        let a = perturb(&lc, &mut h.rng_for(PERTURB_STREAM, 1)).magnitude().to_vec();
        let b = perturb(&lc, &mut h.rng_for(PERTURB_STREAM, 1)).magnitude().to_vec();
        prop_assert_eq!(a, b);
    }
}

// ── 2. Input validation ──────────────────────────────────────────────

proptest! {
    #[test]
    fn mismatched_lengths_rejected(n in 1usize..30, extra in 1usize..5) {
        let result = LightCurve::new(
            (0..n + extra).map(|i| i as f64).collect(),
            vec![10.0; n],
            vec![0.1; n],
        );
        prop_assert!(matches!(result, Err(PeriodError::InvalidInput(_))));
    }

    #[test]
    fn any_negative_error_rejected(n in 1usize..30, at in 0usize..30, neg in -5.0..-1e-9_f64) {
        let at = at % n;
        let mut err = vec![0.1; n];
        err[at] = neg;
        let result = LightCurve::new((0..n).map(|i| i as f64).collect(), vec![10.0; n], err);
        prop_assert!(matches!(result, Err(PeriodError::InvalidInput(_))));
    }
}

// ── 3. Extraction gate ───────────────────────────────────────────────

proptest! {
    #[test]
    fn gate_matches_threshold(power in 0.0..1.0_f64, threshold in 0.0..1.0_f64) {
        let lc = LightCurve::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 1.5], vec![0.1; 3]).unwrap();
        let est = FixedSpectrum::with_peak(power, 3.0);
        let config = Configuration {
            detection_threshold: threshold,
            period_search_range: (1.0, 10.0),
            trial_count: 1,
            ..Configuration::default()
        };
        let d = PeriodExtractor::new(&est, &config).extract(lc.view()).unwrap();
        if power < threshold {
            prop_assert_eq!(d, Detection::NoDetection);
        } else {
            prop_assert_eq!(d, Detection::Detected { period: 3.0 });
        }
    }
}

// ── 4. Lomb–Scargle power range ──────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn lomb_scargle_power_in_unit_interval(lc in arb_curve()) {
        let pg = LombScargle::new().periodogram(lc.view(), 3).unwrap();
        prop_assert!(!pg.is_empty());
        prop_assert!(pg.powers().iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

//! Orchestrator — drives the Monte Carlo trials over one light curve.
//!
//! Trial 0 extracts a period from the measured magnitudes as they are; trials
//! 1..N each extract from a fresh Gaussian realization. Each trial draws from
//! its own RNG stream derived from `(master_seed, trial)`, and no trial reads
//! another's output, so trials may run in any order on any number of threads
//! and still produce the same ResultSet.
//!
//! Cooperative cancellation stops new trials from starting; everything that
//! already finished is returned as a partial result.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use periodlab_core::rng::PERTURB_STREAM;
use periodlab_core::{
    perturb, Configuration, Detection, LightCurve, PeriodError, PeriodEstimate, PeriodExtractor,
    Periodogram, ResultSet, RngHierarchy, SeriesView, SpectralEstimator, TrialSource,
};

// ─── Options & hooks ─────────────────────────────────────────────────

/// Execution knobs that do not affect results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOptions {
    /// Worker threads; 1 runs trials sequentially on the calling thread.
    pub threads: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

/// Progress update sent after every completed trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialProgress {
    pub completed: usize,
    pub total: usize,
    pub detections: usize,
    pub elapsed_secs: f64,
}

/// What one trial looked at, handed to an observer before it is discarded.
#[derive(Debug, Clone, Copy)]
pub struct TrialArtifacts<'a> {
    pub trial: usize,
    pub source: TrialSource,
    pub series: SeriesView<'a>,
    pub periodogram: &'a Periodogram,
    pub detection: Detection,
}

pub type ProgressFn<'a> = &'a (dyn Fn(&TrialProgress) + Sync);
pub type ObserverFn<'a> = &'a (dyn Fn(&TrialArtifacts<'_>) + Sync);

/// Optional callbacks and the cancellation flag.
#[derive(Clone, Copy, Default)]
pub struct RunHooks<'a> {
    pub progress: Option<ProgressFn<'a>>,
    pub observer: Option<ObserverFn<'a>>,
    pub cancel: Option<&'a AtomicBool>,
}

// ─── Result & error types ────────────────────────────────────────────

/// Outcome of a run: the (possibly partial) ResultSet plus bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRun {
    pub result_set: ResultSet,
    pub requested_trials: usize,
    /// True when cancellation left some trials unrun.
    pub cancelled: bool,
    pub elapsed_secs: f64,
    pub estimator: String,
}

impl TrialRun {
    pub fn completed_trials(&self) -> usize {
        self.result_set.len()
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

// ─── Trial loop ──────────────────────────────────────────────────────

/// Run all trials with default options and no hooks.
pub fn run(
    light_curve: &LightCurve,
    config: &Configuration,
    estimator: &dyn SpectralEstimator,
) -> Result<ResultSet, RunError> {
    run_trials(
        light_curve,
        config,
        estimator,
        &RunOptions::default(),
        RunHooks::default(),
    )
    .map(|run| run.result_set)
}

/// Run `config.trial_count` trials and collect one estimate per trial.
///
/// Configuration is validated before any trial starts. An estimation failure
/// stops trials above it from starting and aborts the run with the lowest
/// failing trial index, whatever the thread count; no partial ResultSet is
/// produced for errors.
pub fn run_trials(
    light_curve: &LightCurve,
    config: &Configuration,
    estimator: &dyn SpectralEstimator,
    options: &RunOptions,
    hooks: RunHooks<'_>,
) -> Result<TrialRun, RunError> {
    config.validate()?;
    if options.threads == 0 {
        return Err(PeriodError::InvalidConfiguration("threads must be at least 1".into()).into());
    }

    let _run = info_span!(
        "monte_carlo",
        trials = config.trial_count,
        seed = config.master_seed,
        estimator = estimator.name()
    )
    .entered();

    let zero_error_points = light_curve
        .magnitude_error()
        .iter()
        .filter(|&&e| e == 0.0)
        .count();
    if zero_error_points > 0 {
        warn!(
            points = zero_error_points,
            "points with zero magnitude error are never perturbed"
        );
    }

    let start = Instant::now();
    let rngs = RngHierarchy::new(config.master_seed);
    let extractor = PeriodExtractor::new(estimator, config);
    let total = config.trial_count;
    let completed = AtomicUsize::new(0);
    let detections = AtomicUsize::new(0);
    // Lowest trial index that has failed so far; trials above it are skipped,
    // trials below it still run so the reported failure is schedule-independent.
    let failed_at = AtomicUsize::new(usize::MAX);

    let step = |trial: usize| -> Option<Result<PeriodEstimate, PeriodError>> {
        if trial > failed_at.load(Ordering::Relaxed)
            || hooks.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
        {
            return None;
        }

        let result = run_trial(trial, light_curve, &extractor, &rngs, hooks.observer);
        match &result {
            Ok(estimate) => {
                let found = if estimate.detection.is_detected() {
                    detections.fetch_add(1, Ordering::Relaxed) + 1
                } else {
                    detections.load(Ordering::Relaxed)
                };
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(cb) = hooks.progress {
                    cb(&TrialProgress {
                        completed: done,
                        total,
                        detections: found,
                        elapsed_secs: start.elapsed().as_secs_f64(),
                    });
                }
            }
            Err(_) => {
                failed_at.fetch_min(trial, Ordering::Relaxed);
            }
        }
        Some(result)
    };

    let outcomes: Vec<Option<Result<PeriodEstimate, PeriodError>>> = if options.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .build()?;
        pool.install(|| (0..total).into_par_iter().map(&step).collect())
    } else {
        (0..total).map(&step).collect()
    };

    // Outcomes are in trial order, so the first error is the lowest trial.
    let mut estimates = Vec::with_capacity(total);
    for outcome in outcomes.into_iter().flatten() {
        estimates.push(outcome?);
    }

    let elapsed_secs = start.elapsed().as_secs_f64();
    let cancelled = estimates.len() < total;
    let result_set = ResultSet::new(estimates);

    if cancelled {
        info!(
            completed = result_set.len(),
            requested = total,
            "run cancelled; returning completed trials"
        );
    } else {
        info!(
            trials = total,
            no_detections = result_set.no_detection_count(),
            elapsed_secs,
            "monte carlo run complete"
        );
    }

    Ok(TrialRun {
        result_set,
        requested_trials: total,
        cancelled,
        elapsed_secs,
        estimator: estimator.name().to_string(),
    })
}

/// One independent trial: baseline or perturbed realization, then extraction.
fn run_trial(
    trial: usize,
    light_curve: &LightCurve,
    extractor: &PeriodExtractor<'_>,
    rngs: &RngHierarchy,
    observer: Option<ObserverFn<'_>>,
) -> Result<PeriodEstimate, PeriodError> {
    let source = TrialSource::for_trial(trial);
    let detection = match source {
        TrialSource::Baseline => extract_and_observe(trial, light_curve.view(), extractor, observer)?,
        TrialSource::Perturbed => {
            let mut rng = rngs.rng_for(PERTURB_STREAM, trial as u64);
            let realization = perturb(light_curve, &mut rng);
            extract_and_observe(trial, realization.view(), extractor, observer)?
        }
    };

    debug!(trial, source = source.as_str(), period = detection.period(), "trial complete");
    Ok(PeriodEstimate::new(trial, detection))
}

fn extract_and_observe(
    trial: usize,
    series: SeriesView<'_>,
    extractor: &PeriodExtractor<'_>,
    observer: Option<ObserverFn<'_>>,
) -> Result<Detection, PeriodError> {
    let (detection, periodogram) = extractor
        .extract_with_periodogram(series)
        .map_err(|e| PeriodError::in_trial(trial, e))?;

    if let Some(observe) = observer {
        observe(&TrialArtifacts {
            trial,
            source: TrialSource::for_trial(trial),
            series,
            periodogram: &periodogram,
            detection,
        });
    }
    Ok(detection)
}

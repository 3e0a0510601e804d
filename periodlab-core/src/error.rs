//! Error taxonomy for the period robustness core.
//!
//! `NoDetection` is never an error: it is a normal [`Detection`](crate::domain::Detection)
//! outcome. Everything here is fail-fast and raised before or during a trial
//! with a description of the violated precondition.

use thiserror::Error;

/// Failures of the spectral estimation step.
///
/// A genuine estimation failure is distinct from "no significant periodicity"
/// and is never silently converted into a non-detection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("time series spans no time: need at least 2 distinct time points, got {distinct}")]
    InsufficientTimeSpan { distinct: usize },

    #[error("non-finite value in {column} at index {index}")]
    NonFiniteInput { column: &'static str, index: usize },

    #[error("periodogram is empty")]
    EmptyPeriodogram,

    #[error("malformed periodogram: {0}")]
    MalformedPeriodogram(String),

    #[error("no frequencies fall inside the search range ({lo}, {hi})")]
    EmptySearchRange { lo: f64, hi: f64 },

    #[error("frequency grid of {requested} points exceeds the limit of {max}")]
    GridTooLarge { requested: f64, max: usize },
}

/// Errors surfaced by validation and by the trial loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeriodError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("estimation failed: {0}")]
    Estimation(#[from] EstimationError),

    #[error("trial {trial} failed: {source}")]
    Trial {
        trial: usize,
        #[source]
        source: EstimationError,
    },
}

impl PeriodError {
    /// Attach the originating trial index to an estimation failure.
    pub fn in_trial(trial: usize, source: EstimationError) -> Self {
        PeriodError::Trial { trial, source }
    }

    /// The estimation failure behind this error, if any.
    pub fn estimation(&self) -> Option<&EstimationError> {
        match self {
            PeriodError::Estimation(e) | PeriodError::Trial { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

//! PeriodLab Core — light-curve types, noise resampling, and period extraction.
//!
//! This crate contains the per-trial building blocks of a period robustness
//! study:
//! - Domain types (light curves, realizations, per-trial period estimates)
//! - Configuration and its validation
//! - Deterministic per-trial RNG streams derived from a master seed
//! - The `SpectralEstimator` capability with a Lomb–Scargle backend
//! - The Gaussian resampler and the threshold-gated period extractor

pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod resample;
pub mod rng;
pub mod spectral;

pub use config::Configuration;
pub use domain::{Detection, LightCurve, PeriodEstimate, Realization, ResultSet, SeriesView, TrialSource};
pub use error::{EstimationError, PeriodError};
pub use extract::PeriodExtractor;
pub use resample::perturb;
pub use rng::RngHierarchy;
pub use spectral::{FixedSpectrum, LombScargle, Periodogram, SpectralEstimator};

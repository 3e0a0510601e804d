//! PeriodLab Runner — Monte Carlo orchestration, aggregation, and I/O.
//!
//! This crate builds on `periodlab-core` to provide:
//! - The trial loop (sequential or on a rayon pool) with progress, per-trial
//!   observers and cooperative cancellation
//! - Histogram of recovered periods, non-detection rate, distribution summary
//! - Light-curve CSV loading and TOML analysis settings
//! - JSON / CSV / Markdown export of a run

pub mod export;
pub mod histogram;
pub mod loader;
pub mod orchestrator;
pub mod settings;
pub mod stats;

pub use export::{
    generate_report, load_artifacts, save_artifacts, FigureWriter, RunManifest, SCHEMA_VERSION,
};
pub use histogram::{BinRule, Histogram, MAX_BINS};
pub use loader::{load_light_curve, read_light_curve, LoadError};
pub use orchestrator::{
    run, run_trials, RunError, RunHooks, RunOptions, TrialArtifacts, TrialProgress, TrialRun,
};
pub use settings::{AnalysisSettings, ExecutionSettings, OutputSettings, SettingsError};
pub use stats::PeriodSummary;

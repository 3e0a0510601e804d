//! Domain types: light curves, realizations, and per-trial period estimates.

pub mod estimate;
pub mod light_curve;

pub use estimate::{Detection, PeriodEstimate, ResultSet, TrialSource};
pub use light_curve::{LightCurve, Realization, SeriesView};

//! LightCurve — the immutable measured time series every trial reads from.

use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

/// Brightness measurements of one object: three parallel columns of equal length.
///
/// Construction validates every invariant the trial loop relies on, so a
/// `LightCurve` that exists is always usable as input:
/// - all three columns share length N > 0
/// - every value is finite
/// - `magnitude_error` entries are non-negative (1-sigma uncertainties)
/// - `time` is non-decreasing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLightCurve")]
pub struct LightCurve {
    time: Vec<f64>,
    magnitude: Vec<f64>,
    magnitude_error: Vec<f64>,
}

/// Unvalidated wire shape used only for deserialization.
#[derive(Deserialize)]
struct RawLightCurve {
    time: Vec<f64>,
    magnitude: Vec<f64>,
    magnitude_error: Vec<f64>,
}

impl TryFrom<RawLightCurve> for LightCurve {
    type Error = PeriodError;

    fn try_from(raw: RawLightCurve) -> Result<Self, Self::Error> {
        LightCurve::new(raw.time, raw.magnitude, raw.magnitude_error)
    }
}

impl LightCurve {
    pub fn new(
        time: Vec<f64>,
        magnitude: Vec<f64>,
        magnitude_error: Vec<f64>,
    ) -> Result<Self, PeriodError> {
        let n = time.len();
        if magnitude.len() != n || magnitude_error.len() != n {
            return Err(PeriodError::InvalidInput(format!(
                "column lengths differ: time={}, magnitude={}, magnitude_error={}",
                n,
                magnitude.len(),
                magnitude_error.len()
            )));
        }
        if n == 0 {
            return Err(PeriodError::InvalidInput(
                "light curve has no measurements".into(),
            ));
        }

        for (column, values) in [
            ("time", &time),
            ("magnitude", &magnitude),
            ("magnitude_error", &magnitude_error),
        ] {
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                return Err(PeriodError::InvalidInput(format!(
                    "non-finite {column} at index {i}"
                )));
            }
        }

        if let Some(i) = magnitude_error.iter().position(|&e| e < 0.0) {
            return Err(PeriodError::InvalidInput(format!(
                "negative magnitude_error {} at index {i}",
                magnitude_error[i]
            )));
        }

        if let Some(i) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(PeriodError::InvalidInput(format!(
                "time is not ascending at index {}: {} follows {}",
                i + 1,
                time[i + 1],
                time[i]
            )));
        }

        Ok(Self {
            time,
            magnitude,
            magnitude_error,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always false for a constructed curve; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn magnitude(&self) -> &[f64] {
        &self.magnitude
    }

    pub fn magnitude_error(&self) -> &[f64] {
        &self.magnitude_error
    }

    /// Time span between the first and last measurement.
    pub fn baseline(&self) -> f64 {
        self.time[self.time.len() - 1] - self.time[0]
    }

    /// The unperturbed measurements as a series view.
    pub fn view(&self) -> SeriesView<'_> {
        SeriesView {
            time: &self.time,
            magnitude: &self.magnitude,
            magnitude_error: &self.magnitude_error,
        }
    }
}

/// Borrowed (time, magnitude, error) triple handed to the spectral estimator.
///
/// Both the baseline light curve and every realization are viewed through
/// this type, so estimators never care where the magnitudes came from.
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    pub time: &'a [f64],
    pub magnitude: &'a [f64],
    pub magnitude_error: &'a [f64],
}

impl SeriesView<'_> {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// One noise-perturbed draw of the magnitudes.
///
/// Shares `time` and `magnitude_error` with its source curve; only the
/// magnitudes are owned. Created per trial and dropped once extracted.
#[derive(Debug, Clone)]
pub struct Realization<'a> {
    source: &'a LightCurve,
    magnitude: Vec<f64>,
}

impl<'a> Realization<'a> {
    pub(crate) fn new(source: &'a LightCurve, magnitude: Vec<f64>) -> Self {
        debug_assert_eq!(source.len(), magnitude.len());
        Self { source, magnitude }
    }

    pub fn magnitude(&self) -> &[f64] {
        &self.magnitude
    }

    pub fn source(&self) -> &'a LightCurve {
        self.source
    }

    pub fn view(&self) -> SeriesView<'_> {
        SeriesView {
            time: self.source.time(),
            magnitude: &self.magnitude,
            magnitude_error: self.source.magnitude_error(),
        }
    }
}

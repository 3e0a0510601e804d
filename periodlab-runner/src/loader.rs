//! Light-curve loading from CSV.
//!
//! Expects a header row. Column names follow either the survey export
//! (`MJD`, `Mag`, `Magerr`) or the long form (`time`, `magnitude`,
//! `magnitude_error`); any other columns are ignored. Rows are sorted by
//! time before validation, since some exports are not in time order.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use periodlab_core::{LightCurve, PeriodError};

/// Errors from the CSV loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read light curve from {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid light curve in {origin}: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: PeriodError,
    },
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(alias = "MJD", alias = "mjd", alias = "t")]
    time: f64,
    #[serde(alias = "Mag", alias = "mag")]
    magnitude: f64,
    #[serde(alias = "Magerr", alias = "magerr", alias = "mag_err", alias = "error")]
    magnitude_error: f64,
}

/// Load a light curve from a CSV file on disk.
pub fn load_light_curve(path: &Path) -> Result<LightCurve, LoadError> {
    let origin = path.display().to_string();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            origin: origin.clone(),
            source,
        })?;
    let lc = collect(reader, &origin)?;
    info!(path = %origin, points = lc.len(), baseline = lc.baseline(), "loaded light curve");
    Ok(lc)
}

/// Load a light curve from any CSV source; `origin` names it in errors.
pub fn read_light_curve<R: Read>(source: R, origin: &str) -> Result<LightCurve, LoadError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    collect(reader, origin)
}

fn collect<R: Read>(mut reader: csv::Reader<R>, origin: &str) -> Result<LightCurve, LoadError> {
    let mut rows = reader
        .deserialize::<Row>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Csv {
            origin: origin.to_string(),
            source,
        })?;

    if rows.windows(2).any(|w| w[1].time < w[0].time) {
        debug!(origin, "rows out of time order; sorting");
        rows.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    let mut time = Vec::with_capacity(rows.len());
    let mut magnitude = Vec::with_capacity(rows.len());
    let mut magnitude_error = Vec::with_capacity(rows.len());
    for row in rows {
        time.push(row.time);
        magnitude.push(row.magnitude);
        magnitude_error.push(row.magnitude_error);
    }

    LightCurve::new(time, magnitude, magnitude_error).map_err(|source| LoadError::Invalid {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_survey_column_names() {
        let data = "MJD,Mag,Magerr,Flag\n53000.1,15.2,0.02,0\n53001.3,15.4,0.03,1\n";
        let lc = read_light_curve(data.as_bytes(), "inline").unwrap();
        assert_eq!(lc.time(), &[53000.1, 53001.3]);
        assert_eq!(lc.magnitude(), &[15.2, 15.4]);
        assert_eq!(lc.magnitude_error(), &[0.02, 0.03]);
    }

    #[test]
    fn reads_long_column_names_with_padding() {
        let data = "time, magnitude, magnitude_error\n1.0, 10.0, 0.1\n2.0, 10.5, 0.1\n";
        let lc = read_light_curve(data.as_bytes(), "inline").unwrap();
        assert_eq!(lc.len(), 2);
    }

    #[test]
    fn sorts_rows_by_time() {
        let data = "MJD,Mag,Magerr\n3.0,12.0,0.1\n1.0,10.0,0.2\n2.0,11.0,0.3\n";
        let lc = read_light_curve(data.as_bytes(), "inline").unwrap();
        assert_eq!(lc.time(), &[1.0, 2.0, 3.0]);
        assert_eq!(lc.magnitude(), &[10.0, 11.0, 12.0]);
        assert_eq!(lc.magnitude_error(), &[0.2, 0.3, 0.1]);
    }

    #[test]
    fn missing_column_is_csv_error() {
        let data = "MJD,Mag\n1.0,10.0\n";
        let err = read_light_curve(data.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn negative_error_is_invalid_input() {
        let data = "MJD,Mag,Magerr\n1.0,10.0,-0.1\n";
        let err = read_light_curve(data.as_bytes(), "inline").unwrap_err();
        match err {
            LoadError::Invalid { source, .. } => {
                assert!(matches!(source, PeriodError::InvalidInput(_)))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn header_only_is_invalid_input() {
        let err = read_light_curve("MJD,Mag,Magerr\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, LoadError::Invalid { .. }));
    }
}

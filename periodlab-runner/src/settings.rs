//! TOML analysis settings.
//!
//! ```toml
//! [analysis]
//! detection_threshold = 0.1
//! period_search_range = [500.0, 2000.0]
//! nyquist_factor = 10
//! trial_count = 100
//! master_seed = 42
//!
//! [output]
//! output_figures = false
//! output_directory = "periodlab-out"
//! bin_rule = "auto"
//!
//! [execution]
//! threads = 4
//! ```
//!
//! Every table and key is optional. Unknown keys are rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use periodlab_core::{Configuration, PeriodError};

use crate::histogram::BinRule;
use crate::orchestrator::RunOptions;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Invalid(#[from] PeriodError),
}

/// Where and how results are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Write per-trial light-curve and periodogram CSVs.
    pub output_figures: bool,
    pub output_directory: PathBuf,
    pub bin_rule: BinRule,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_figures: false,
            output_directory: PathBuf::from("periodlab-out"),
            bin_rule: BinRule::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSettings {
    pub threads: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

/// Complete settings file: analysis configuration plus output and execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSettings {
    pub analysis: Configuration,
    pub output: OutputSettings,
    pub execution: ExecutionSettings,
}

impl AnalysisSettings {
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate. Syntax errors and unknown keys surface as
    /// `InvalidConfiguration`.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)
            .map_err(|e| PeriodError::InvalidConfiguration(e.message().to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), PeriodError> {
        self.analysis.validate()?;
        if self.execution.threads == 0 {
            return Err(PeriodError::InvalidConfiguration(
                "execution.threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            threads: self.execution.threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let s = AnalysisSettings::from_toml_str("").unwrap();
        assert_eq!(s, AnalysisSettings::default());
        assert_eq!(s.analysis.trial_count, 100);
        assert_eq!(s.output.bin_rule, BinRule::Auto);
        assert_eq!(s.run_options().threads, 1);
    }

    #[test]
    fn parses_all_tables() {
        let s = AnalysisSettings::from_toml_str(
            r#"
            [analysis]
            detection_threshold = 0.2
            period_search_range = [100.0, 900.0]
            trial_count = 25
            master_seed = 7

            [output]
            output_figures = true
            output_directory = "out/pg1302"
            bin_rule = "sturges"

            [execution]
            threads = 4
            "#,
        )
        .unwrap();
        assert_eq!(s.analysis.detection_threshold, 0.2);
        assert_eq!(s.analysis.period_search_range, (100.0, 900.0));
        assert_eq!(s.analysis.nyquist_factor, 10);
        assert_eq!(s.analysis.trial_count, 25);
        assert!(s.output.output_figures);
        assert_eq!(s.output.output_directory, PathBuf::from("out/pg1302"));
        assert_eq!(s.output.bin_rule, BinRule::Sturges);
        assert_eq!(s.execution.threads, 4);
    }

    #[test]
    fn unknown_key_is_invalid_configuration() {
        let err = AnalysisSettings::from_toml_str("[analysis]\niterations = 5\n").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid(PeriodError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        let err = AnalysisSettings::from_toml_str(
            "[analysis]\nperiod_search_range = [2000.0, 500.0]\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid(PeriodError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(AnalysisSettings::from_toml_str("[execution]\nthreads = 0\n").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AnalysisSettings::from_file(Path::new("/nonexistent/periodlab.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}

//! Reporting and export — JSON, CSV, and Markdown artifacts.
//!
//! A run directory holds:
//! - `manifest.json` — settings, ResultSet, histogram and summary, versioned
//! - `periods.csv` — one row per trial
//! - `histogram.csv` — bin edges and counts of the detected periods
//! - `report.md` — human-readable summary
//! - `light_curve_{trial}.csv` / `periodogram_{trial}.csv` — per-trial figure
//!   data when enabled; the baseline trial is written as `_org`
//!
//! Manifests with a newer `schema_version` than this build are rejected on load.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use periodlab_core::{Periodogram, ResultSet, SeriesView, TrialSource};

use crate::histogram::Histogram;
use crate::orchestrator::{TrialArtifacts, TrialRun};
use crate::settings::AnalysisSettings;
use crate::stats::PeriodSummary;

/// Current manifest schema version.
pub const SCHEMA_VERSION: u32 = 1;

// ─── Manifest ───────────────────────────────────────────────────────

/// Everything needed to inspect or re-plot a run without re-running it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
    pub input: Option<String>,
    pub estimator: String,
    pub settings: AnalysisSettings,
    pub requested_trials: usize,
    pub cancelled: bool,
    pub elapsed_secs: f64,
    pub result_set: ResultSet,
    pub histogram: Histogram,
    pub summary: PeriodSummary,
}

impl RunManifest {
    pub fn new(run: &TrialRun, settings: &AnalysisSettings, input: Option<&Path>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: chrono::Utc::now().to_rfc3339(),
            input: input.map(|p| p.display().to_string()),
            estimator: run.estimator.clone(),
            settings: settings.clone(),
            requested_trials: run.requested_trials,
            cancelled: run.cancelled,
            elapsed_secs: run.elapsed_secs,
            result_set: run.result_set.clone(),
            histogram: Histogram::build_with_rule(&run.result_set, settings.output.bin_rule),
            summary: PeriodSummary::from_result_set(&run.result_set),
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize RunManifest to JSON")
}

/// Deserialize a manifest, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize RunManifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: trial, source, detected, period (empty for a non-detection).
pub fn export_periods_csv(result_set: &ResultSet) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trial", "source", "detected", "period"])?;
    for e in result_set {
        wtr.write_record([
            e.trial.to_string(),
            e.source.as_str().to_string(),
            e.detection.is_detected().to_string(),
            e.detection
                .period()
                .map(|p| format!("{p:.6}"))
                .unwrap_or_default(),
        ])?;
    }
    finish_csv(wtr)
}

/// Columns: bin_lo, bin_hi, count.
pub fn export_histogram_csv(histogram: &Histogram) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bin_lo", "bin_hi", "count"])?;
    for (lo, hi, count) in histogram.bins() {
        wtr.write_record([format!("{lo:.6}"), format!("{hi:.6}"), count.to_string()])?;
    }
    finish_csv(wtr)
}

/// Columns: time, magnitude, magnitude_error.
pub fn export_light_curve_csv(series: SeriesView<'_>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["time", "magnitude", "magnitude_error"])?;
    for i in 0..series.len() {
        wtr.write_record([
            series.time[i].to_string(),
            series.magnitude[i].to_string(),
            series.magnitude_error[i].to_string(),
        ])?;
    }
    finish_csv(wtr)
}

/// Columns: period, power.
pub fn export_periodogram_csv(periodogram: &Periodogram) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["period", "power"])?;
    for (period, power) in periodogram.periods().iter().zip(periodogram.powers()) {
        wtr.write_record([period.to_string(), power.to_string()])?;
    }
    finish_csv(wtr)
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write manifest, periods, histogram and report into `output_dir`.
pub fn save_artifacts(manifest: &RunManifest, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    write_file(&output_dir.join("manifest.json"), &export_json(manifest)?)?;
    write_file(
        &output_dir.join("periods.csv"),
        &export_periods_csv(&manifest.result_set)?,
    )?;
    write_file(
        &output_dir.join("histogram.csv"),
        &export_histogram_csv(&manifest.histogram)?,
    )?;
    write_file(&output_dir.join("report.md"), &generate_report(manifest))?;

    info!(dir = %output_dir.display(), "saved run artifacts");
    Ok(output_dir.to_path_buf())
}

/// Load a manifest back from a run directory.
pub fn load_artifacts(dir: &Path) -> Result<RunManifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Per-trial figure data ──────────────────────────────────────────

/// File stem suffix for a trial: `org` for the baseline, else the index.
pub fn figure_suffix(trial: usize) -> String {
    match TrialSource::for_trial(trial) {
        TrialSource::Baseline => "org".to_string(),
        TrialSource::Perturbed => trial.to_string(),
    }
}

/// Trial observer that writes each trial's series and periodogram as CSV.
///
/// Safe to call from worker threads; each trial writes its own files. The
/// first write failure is kept and later trials are skipped, and `finish`
/// reports it.
#[derive(Debug)]
pub struct FigureWriter {
    dir: PathBuf,
    written: AtomicUsize,
    error: Mutex<Option<anyhow::Error>>,
}

impl FigureWriter {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create figure dir: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: AtomicUsize::new(0),
            error: Mutex::new(None),
        })
    }

    pub fn observe(&self, artifacts: &TrialArtifacts<'_>) {
        if self.has_failed() {
            return;
        }
        if let Err(e) = self.write_trial(artifacts) {
            if let Ok(mut slot) = self.error.lock() {
                slot.get_or_insert(e);
            }
        }
    }

    fn has_failed(&self) -> bool {
        self.error.lock().map_or(true, |slot| slot.is_some())
    }

    fn write_trial(&self, artifacts: &TrialArtifacts<'_>) -> Result<()> {
        let suffix = figure_suffix(artifacts.trial);
        write_file(
            &self.dir.join(format!("light_curve_{suffix}.csv")),
            &export_light_curve_csv(artifacts.series)?,
        )?;
        write_file(
            &self.dir.join(format!("periodogram_{suffix}.csv")),
            &export_periodogram_csv(artifacts.periodogram)?,
        )?;
        self.written.fetch_add(1, Ordering::Relaxed);
        debug!(trial = artifacts.trial, "wrote figure data");
        Ok(())
    }

    /// Number of trials written, or the first write failure.
    pub fn finish(self) -> Result<usize> {
        let error = self
            .error
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match error {
            Some(e) => Err(e),
            None => Ok(self.written.into_inner()),
        }
    }
}

// ─── Markdown report ────────────────────────────────────────────────

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"))
}

/// Markdown summary of a run.
pub fn generate_report(manifest: &RunManifest) -> String {
    let mut md = String::with_capacity(2048);
    let cfg = &manifest.settings.analysis;
    let rs = &manifest.result_set;
    let h = &manifest.histogram;
    let s = &manifest.summary;

    md.push_str("# Period Robustness Report\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    if let Some(input) = &manifest.input {
        md.push_str(&format!("| Input | {input} |\n"));
    }
    md.push_str(&format!("| Created | {} |\n", manifest.created_at));
    md.push_str(&format!("| Estimator | {} |\n", manifest.estimator));
    md.push_str(&format!(
        "| Trials | {} of {} |\n",
        rs.len(),
        manifest.requested_trials
    ));
    if manifest.cancelled {
        md.push_str("| Status | **CANCELLED** (partial results) |\n");
    }
    md.push_str(&format!("| Master Seed | {} |\n", cfg.master_seed));
    md.push_str(&format!(
        "| Detection Threshold | {} |\n",
        cfg.detection_threshold
    ));
    md.push_str(&format!(
        "| Search Range | {} to {} |\n",
        cfg.period_search_range.0, cfg.period_search_range.1
    ));
    md.push_str(&format!("| Nyquist Factor | {} |\n", cfg.nyquist_factor));
    md.push_str(&format!("| Elapsed | {:.2}s |\n", manifest.elapsed_secs));
    md.push('\n');

    md.push_str("## Detections\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Detected | {} |\n", s.detected));
    md.push_str(&format!("| Zero Counts | {} |\n", h.no_detection_count));
    md.push_str(&format!(
        "| Non-detection Rate | {:.1}% |\n",
        h.non_detection_rate * 100.0
    ));
    md.push_str(&format!("| Baseline Period | {} |\n", fmt_opt(s.baseline_period)));
    md.push_str(&format!("| Median | {} |\n", fmt_opt(s.median)));
    md.push_str(&format!("| Mean | {} |\n", fmt_opt(s.mean)));
    md.push_str(&format!("| Std Dev | {} |\n", fmt_opt(s.std_dev)));
    md.push_str(&format!("| IQR | {} |\n", fmt_opt(s.iqr)));
    if let Some((lo, hi)) = s.ci_95 {
        md.push_str(&format!("| 95% Interval | {lo:.2} to {hi:.2} |\n"));
    }
    md.push('\n');

    md.push_str("## Histogram\n\n");
    if h.is_empty() {
        md.push_str("No trial produced a detection.\n");
    } else {
        md.push_str(&format!("Bin rule: `{:?}`\n\n", h.rule));
        md.push_str("| Period | Count |\n");
        md.push_str("| --- | ---: |\n");
        for (lo, hi, count) in h.bins() {
            md.push_str(&format!("| {lo:.2} to {hi:.2} | {count} |\n"));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use periodlab_core::{Detection, PeriodEstimate};

    fn run() -> TrialRun {
        let estimates = vec![
            PeriodEstimate::new(0, Detection::Detected { period: 1000.0 }),
            PeriodEstimate::new(1, Detection::NoDetection),
            PeriodEstimate::new(2, Detection::Detected { period: 1040.5 }),
        ];
        TrialRun {
            result_set: ResultSet::new(estimates),
            requested_trials: 3,
            cancelled: false,
            elapsed_secs: 0.25,
            estimator: "fixed".into(),
        }
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let m = RunManifest::new(&run(), &AnalysisSettings::default(), None);
        let back = import_json(&export_json(&m).unwrap()).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.result_set, m.result_set);
        assert_eq!(back.settings, m.settings);
        assert_eq!(back.histogram.counts, m.histogram.counts);
        assert_eq!(back.summary.detected, 2);
    }

    #[test]
    fn newer_schema_rejected() {
        let mut m = RunManifest::new(&run(), &AnalysisSettings::default(), None);
        m.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&m).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn periods_csv_leaves_non_detection_empty() {
        let csv = export_periods_csv(&run().result_set).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "trial,source,detected,period");
        assert_eq!(lines[1], "0,baseline,true,1000.000000");
        assert_eq!(lines[2], "1,perturbed,false,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn report_mentions_zero_counts() {
        let m = RunManifest::new(&run(), &AnalysisSettings::default(), Some(Path::new("pg1302.csv")));
        let md = generate_report(&m);
        assert!(md.contains("| Input | pg1302.csv |"));
        assert!(md.contains("| Zero Counts | 1 |"));
        assert!(md.contains("| Non-detection Rate | 33.3% |"));
        assert!(!md.contains("CANCELLED"));
    }

    #[test]
    fn baseline_figures_named_org() {
        assert_eq!(figure_suffix(0), "org");
        assert_eq!(figure_suffix(7), "7");
    }
}

//! Artifact round-trips on disk: loader input, per-trial figure data,
//! manifest / CSV / report output.

use std::path::Path;

use periodlab_core::FixedSpectrum;
use periodlab_runner::{
    load_artifacts, load_light_curve, run_trials, save_artifacts, AnalysisSettings, FigureWriter,
    LoadError, RunHooks, RunManifest, TrialArtifacts,
};

const PG1302_SAMPLE: &str = "\
MJD,Mag,Magerr
53466.19,15.09,0.03
53470.22,15.11,0.03
53489.17,15.02,0.02
53503.14,15.05,0.04
53522.11,15.13,0.03
53531.13,15.10,0.03
";

fn write_sample(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("pg1302.csv");
    std::fs::write(&path, PG1302_SAMPLE).unwrap();
    path
}

fn settings(output_dir: &Path) -> AnalysisSettings {
    let mut s = AnalysisSettings::default();
    s.analysis.trial_count = 4;
    s.analysis.period_search_range = (1.0, 10.0);
    s.output.output_figures = true;
    s.output.output_directory = output_dir.to_path_buf();
    s
}

#[test]
fn loads_light_curve_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let lc = load_light_curve(&write_sample(tmp.path())).unwrap();
    assert_eq!(lc.len(), 6);
    assert_eq!(lc.time()[0], 53466.19);
    assert!((lc.baseline() - 64.94).abs() < 1e-9);
}

#[test]
fn missing_input_is_load_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_light_curve(&tmp.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Csv { .. }));
}

#[test]
fn figure_writer_emits_one_pair_per_trial() {
    let tmp = tempfile::tempdir().unwrap();
    let lc = load_light_curve(&write_sample(tmp.path())).unwrap();
    let out = tmp.path().join("figures");
    let s = settings(&out);

    let writer = FigureWriter::new(&out).unwrap();
    let observer = |a: &TrialArtifacts<'_>| writer.observe(a);
    let hooks = RunHooks {
        observer: Some(&observer),
        ..RunHooks::default()
    };
    let est = FixedSpectrum::with_peak(0.5, 3.0);
    run_trials(&lc, &s.analysis, &est, &s.run_options(), hooks).unwrap();
    assert_eq!(writer.finish().unwrap(), 4);

    for suffix in ["org", "1", "2", "3"] {
        assert!(out.join(format!("light_curve_{suffix}.csv")).is_file());
        assert!(out.join(format!("periodogram_{suffix}.csv")).is_file());
    }
    assert!(!out.join("light_curve_0.csv").exists());

    let org = std::fs::read_to_string(out.join("light_curve_org.csv")).unwrap();
    assert!(org.starts_with("time,magnitude,magnitude_error\n53466.19,15.09,0.03\n"));
    let pg = std::fs::read_to_string(out.join("periodogram_1.csv")).unwrap();
    assert_eq!(pg.lines().count(), 4);
}

#[test]
fn saved_run_reloads() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_sample(tmp.path());
    let lc = load_light_curve(&input).unwrap();
    let out = tmp.path().join("run");
    let s = settings(&out);

    let est = FixedSpectrum::with_peak(0.05, 3.0);
    let run = run_trials(&lc, &s.analysis, &est, &s.run_options(), RunHooks::default()).unwrap();
    let manifest = RunManifest::new(&run, &s, Some(&input));
    let dir = save_artifacts(&manifest, &out).unwrap();

    for name in ["manifest.json", "periods.csv", "histogram.csv", "report.md"] {
        assert!(dir.join(name).is_file(), "missing {name}");
    }

    let loaded = load_artifacts(&dir).unwrap();
    assert_eq!(loaded.result_set, run.result_set);
    assert_eq!(loaded.histogram.no_detection_count, 4);
    assert_eq!(loaded.histogram.non_detection_rate, 1.0);
    assert_eq!(loaded.estimator, "fixed");

    let periods = std::fs::read_to_string(dir.join("periods.csv")).unwrap();
    assert_eq!(periods.lines().count(), 5);
    let histogram = std::fs::read_to_string(dir.join("histogram.csv")).unwrap();
    assert_eq!(histogram.trim_end(), "bin_lo,bin_hi,count");
    let report = std::fs::read_to_string(dir.join("report.md")).unwrap();
    assert!(report.contains("No trial produced a detection."));
}

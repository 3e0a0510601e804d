//! PeriodLab CLI — period robustness analysis for light curves.
//!
//! Commands:
//! - `run` — Monte Carlo trials over a light-curve CSV; writes the period
//!   histogram, non-detection rate, manifest and report
//! - `periodogram` — single Lomb–Scargle periodogram of the measured curve

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

use periodlab_core::{LombScargle, SpectralEstimator};
use periodlab_runner::export::export_periodogram_csv;
use periodlab_runner::{
    load_light_curve, run_trials, save_artifacts, AnalysisSettings, BinRule, FigureWriter,
    RunHooks, RunManifest, TrialArtifacts, TrialProgress,
};

#[derive(Parser)]
#[command(
    name = "periodlab",
    version,
    about = "PeriodLab CLI — Monte Carlo robustness of light-curve periods"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Monte Carlo trials and aggregate the recovered periods.
    Run {
        /// Light-curve CSV (MJD,Mag,Magerr or time,magnitude,magnitude_error).
        #[arg(long)]
        input: PathBuf,

        /// TOML settings file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of trials including the unperturbed baseline.
        #[arg(long)]
        trials: Option<usize>,

        /// Master seed for the per-trial noise streams.
        #[arg(long)]
        seed: Option<u64>,

        /// Minimum peak power for a detection.
        #[arg(long)]
        threshold: Option<f64>,

        /// Worker threads (1 = sequential).
        #[arg(long)]
        threads: Option<usize>,

        /// Output directory for manifest, CSVs and report.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also write per-trial light-curve and periodogram CSVs.
        #[arg(long, default_value_t = false)]
        figures: bool,

        /// Histogram bin rule: sqrt, sturges, fd, auto.
        #[arg(long)]
        bins: Option<BinRule>,
    },
    /// Compute the periodogram of the measured light curve.
    Periodogram {
        /// Light-curve CSV.
        #[arg(long)]
        input: PathBuf,

        /// Highest frequency as a multiple of the average Nyquist frequency.
        #[arg(long, default_value_t = 10)]
        nyquist_factor: u32,

        /// Lower bound of the best-period search.
        #[arg(long, default_value_t = 500.0)]
        min_period: f64,

        /// Upper bound of the best-period search.
        #[arg(long, default_value_t = 2000.0)]
        max_period: f64,

        /// Write period,power CSV here instead of printing a summary only.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Command-line overrides layered on top of the settings file.
struct Overrides {
    trials: Option<usize>,
    seed: Option<u64>,
    threshold: Option<f64>,
    threads: Option<usize>,
    output_dir: Option<PathBuf>,
    figures: bool,
    bins: Option<BinRule>,
}

impl Overrides {
    fn apply(self, settings: &mut AnalysisSettings) {
        if let Some(t) = self.trials {
            settings.analysis.trial_count = t;
        }
        if let Some(s) = self.seed {
            settings.analysis.master_seed = s;
        }
        if let Some(th) = self.threshold {
            settings.analysis.detection_threshold = th;
        }
        if let Some(n) = self.threads {
            settings.execution.threads = n;
        }
        if let Some(dir) = self.output_dir {
            settings.output.output_directory = dir;
        }
        if self.figures {
            settings.output.output_figures = true;
        }
        if let Some(rule) = self.bins {
            settings.output.bin_rule = rule;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            config,
            trials,
            seed,
            threshold,
            threads,
            output_dir,
            figures,
            bins,
        } => {
            let overrides = Overrides {
                trials,
                seed,
                threshold,
                threads,
                output_dir,
                figures,
                bins,
            };
            run_analysis(&input, config.as_deref(), overrides)
        }
        Commands::Periodogram {
            input,
            nyquist_factor,
            min_period,
            max_period,
            output,
        } => run_periodogram(
            &input,
            nyquist_factor,
            (min_period, max_period),
            output.as_deref(),
        ),
    }
}

fn run_analysis(input: &Path, config: Option<&Path>, overrides: Overrides) -> Result<()> {
    let mut settings = match config {
        Some(path) => AnalysisSettings::from_file(path)?,
        None => AnalysisSettings::default(),
    };
    overrides.apply(&mut settings);
    settings.validate()?;

    let light_curve = load_light_curve(input)?;
    let estimator = LombScargle::new();
    let out_dir = settings.output.output_directory.clone();

    let figures = if settings.output.output_figures {
        Some(FigureWriter::new(&out_dir)?)
    } else {
        None
    };
    let observer = |a: &TrialArtifacts<'_>| {
        if let Some(writer) = &figures {
            writer.observe(a);
        }
    };

    let total = settings.analysis.trial_count;
    let step = (total / 10).max(1);
    let progress = |p: &TrialProgress| {
        if p.completed % step == 0 || p.completed == p.total {
            eprintln!(
                "  trial {}/{} ({} detections, {:.1}s)",
                p.completed, p.total, p.detections, p.elapsed_secs
            );
        }
    };

    let hooks = RunHooks {
        progress: Some(&progress),
        observer: Some(&observer),
        cancel: None,
    };

    println!(
        "Running {} trials on {} ({} points, {:.1} day baseline)",
        total,
        input.display(),
        light_curve.len(),
        light_curve.baseline()
    );
    let run = run_trials(
        &light_curve,
        &settings.analysis,
        &estimator,
        &settings.run_options(),
        hooks,
    )?;

    if let Some(writer) = figures {
        let written = writer.finish().context("failed to write per-trial figure data")?;
        info!(trials = written, "figure data written");
    }

    let manifest = RunManifest::new(&run, &settings, Some(input));
    print_summary(&manifest);

    let dir = save_artifacts(&manifest, &out_dir)?;
    println!("Artifacts saved to: {}", dir.display());
    Ok(())
}

fn print_summary(manifest: &RunManifest) {
    let h = &manifest.histogram;
    let s = &manifest.summary;

    println!();
    println!("Estimator:          {}", manifest.estimator);
    println!(
        "Trials:             {}/{}",
        manifest.result_set.len(),
        manifest.requested_trials
    );
    println!("Zero counts:        {}", h.no_detection_count);
    println!("Non-detection rate: {:.1}%", h.non_detection_rate * 100.0);
    match s.baseline_period {
        Some(p) => println!("Baseline period:    {p:.2}"),
        None => println!("Baseline period:    none (below threshold)"),
    }
    if let (Some(median), Some(iqr)) = (s.median, s.iqr) {
        println!("Median period:      {median:.2} (IQR {iqr:.2})");
    }
    if let Some((lo, hi)) = s.ci_95 {
        println!("95% interval:       {lo:.2} to {hi:.2}");
    }
    if let Some(mode) = h.mode() {
        println!("Histogram mode:     {mode:.2} ({} bins)", h.bin_count());
    }
}

fn run_periodogram(
    input: &Path,
    nyquist_factor: u32,
    range: (f64, f64),
    output: Option<&Path>,
) -> Result<()> {
    let light_curve = load_light_curve(input)?;
    let estimator = LombScargle::new();

    let periodogram = estimator.periodogram(light_curve.view(), nyquist_factor)?;
    let best = estimator.best_period(light_curve.view(), range)?;

    println!("Frequencies:  {}", periodogram.len());
    if let Some(peak) = periodogram.max_power() {
        println!("Peak power:   {peak:.4}");
    }
    println!(
        "Best period:  {best:.2} (searched {} to {})",
        range.0, range.1
    );

    if let Some(path) = output {
        let csv = export_periodogram_csv(&periodogram)?;
        std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Periodogram saved to: {}", path.display());
    }
    Ok(())
}

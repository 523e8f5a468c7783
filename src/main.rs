//! SELFPROP - Waterjet Self-Propulsion Analysis
//!
//! Batch front end over the analysis core. Inputs are JSON files; the output
//! is a JSON `AnalysisReport` on stdout (or `--output`).
//!
//! # Usage
//! ```bash
//! selfprop rpm --input run_07.json
//! selfprop curves --input gross_thrust.json --level 0.425 --level 0.6 --speed 12
//! selfprop config --print
//! ```
//!
//! Configuration is read from `$SELFPROP_CONFIG` or `./selfprop.toml`.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use selfprop::config::{self, AnalysisConfig};
use selfprop::curve_fit::{BandInterpolator, CurveFitBank};
use selfprop::processing::{estimate_shaft_pair, RpmParams};
use selfprop::report::{AnalysisReport, CurveSummary, RunRpmSummary};
use selfprop::types::{CalibrationTable, TachometerRun};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "selfprop")]
#[command(about = "Waterjet catamaran self-propulsion analysis")]
#[command(version)]
struct CliArgs {
    /// Write the report here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Estimate both shaft speeds for one or more tachometer runs
    Rpm {
        /// Run JSON: one `{name, time, shaft_a, shaft_b}` object or an array of them
        #[arg(short, long)]
        input: PathBuf,

        /// Override the configured warm-up sample count
        #[arg(long)]
        warm_up: Option<usize>,
    },
    /// Fit a calibration table and resolve curves at operating levels
    Curves {
        /// Calibration JSON: `{quantity, rows: [{x, y}], bands: [{band_id, start, end}]}`
        #[arg(short, long)]
        input: PathBuf,

        /// Operating level (fraction of MCR) to resolve; repeatable
        #[arg(short, long = "level")]
        levels: Vec<f64>,

        /// Speed at which to log the resolved quantity; repeatable
        #[arg(short, long = "speed")]
        speeds: Vec<f64>,
    },
    /// Show the effective configuration
    Config {
        /// Print it as TOML
        #[arg(long)]
        print: bool,
    },
}

/// Run files hold either a single run or a batch.
#[derive(Deserialize)]
#[serde(untagged)]
enum RunInput {
    Batch(Vec<TachometerRun>),
    Single(TachometerRun),
}

impl RunInput {
    fn into_runs(self) -> Vec<TachometerRun> {
        match self {
            RunInput::Batch(runs) => runs,
            RunInput::Single(run) => vec![run],
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn run_rpm(input: &Path, warm_up: Option<usize>) -> Result<AnalysisReport> {
    let cfg = config::get();
    let mut params = RpmParams::from_config(&cfg.rpm);
    if let Some(w) = warm_up {
        params.warm_up_samples = w;
    }

    let runs = read_json::<RunInput>(input)?.into_runs();
    info!(runs = runs.len(), warm_up = params.warm_up_samples, "Estimating shaft RPM");

    let mut report = AnalysisReport::new(cfg.experiment.name.clone());
    for run in &runs {
        let pair = estimate_shaft_pair(&run.time, &run.shaft_a, &run.shaft_b, &params)
            .with_context(|| format!("Run '{}'", run.name))?;

        if pair.a.is_no_signal() || pair.b.is_no_signal() {
            warn!(run = %run.name, "Shaft without signal, reported as 0 rpm");
        }
        info!(
            run = %run.name,
            shaft_a = pair.a.value,
            shaft_b = pair.b.value,
            "Run RPM"
        );
        report.rpm.push(RunRpmSummary::new(run.name.clone(), &pair));
    }
    Ok(report)
}

fn run_curves(input: &Path, levels: &[f64], speeds: &[f64]) -> Result<AnalysisReport> {
    let cfg = config::get();
    let table: CalibrationTable = read_json(input)?;

    let bank = CurveFitBank::build(&table.rows, &table.bands, cfg.curve_fit.degree)
        .with_context(|| format!("Failed to fit calibration bands from {}", input.display()))?;
    for band in bank.bands() {
        info!(band = band.band_id, r_squared = %format!("{:.5}", band.r_squared), "Band fit");
    }

    let interpolator = BandInterpolator::from_config(cfg);
    let mut report = AnalysisReport::new(cfg.experiment.name.clone());
    report.curves = CurveSummary::from_bank(&bank);

    for &level in levels {
        let curve = bank
            .resolve(level, &interpolator)
            .with_context(|| format!("Cannot resolve level {level}"))?;
        if curve.is_interpolated() {
            report.curves.push(CurveSummary::from_resolved(level, &curve));
        }
        for &speed in speeds {
            let value = curve.evaluate(speed);
            info!(
                level = level,
                speed = speed,
                quantity = %table.quantity,
                value = %format!("{value:.2}"),
                "Resolved"
            );
        }
    }
    Ok(report)
}

fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    config::init(AnalysisConfig::load());

    let rendered = match &args.command {
        SubCommand::Rpm { input, warm_up } => run_rpm(input, *warm_up)?.to_json_pretty()?,
        SubCommand::Curves {
            input,
            levels,
            speeds,
        } => run_curves(input, levels, speeds)?.to_json_pretty()?,
        SubCommand::Config { print } => {
            let cfg = config::get();
            if !print {
                info!(
                    experiment = %cfg.experiment.name,
                    sample_rate_hz = cfg.rpm.sample_rate_hz,
                    degree = cfg.curve_fit.degree,
                    "Effective configuration (use --print for TOML)"
                );
                return Ok(());
            }
            cfg.to_toml().context("Failed to render config")?
        }
    };

    write_output(args.output.as_deref(), &rendered)
}

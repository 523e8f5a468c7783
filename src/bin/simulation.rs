//! Tachometer Run Simulation
//!
//! Generates synthetic proximity-sensor traces for both waterjet shafts in
//! the run JSON format `selfprop rpm` reads. Each shaft accelerates from rest
//! over the warm-up period, then turns at its set speed.
//!
//! # Usage
//! ```bash
//! tachometer-simulation --rpm-a 1450 --rpm-b 1440 --seconds 30 --seed 7 > run.json
//! selfprop rpm --input run.json --warm-up 4000
//! ```

use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;
use std::io::{self, Write};

use selfprop::config::defaults;
use selfprop::types::TachometerRun;

// ============================================================================
// Sensor Constants
// ============================================================================

/// Mid-scale of the 0-10 V proximity sensor (V)
const SENSOR_OFFSET_V: f64 = 5.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tachometer-simulation")]
#[command(about = "Synthetic waterjet shaft tachometer runs for selfprop testing")]
#[command(version = "1.0")]
struct Args {
    /// Run name written into the output
    #[arg(short, long, default_value = "simulated-run")]
    name: String,

    /// Steady speed of shaft A (rpm)
    #[arg(long, default_value = "1450")]
    rpm_a: f64,

    /// Steady speed of shaft B (rpm)
    #[arg(long, default_value = "1450")]
    rpm_b: f64,

    /// Run length in seconds, warm-up included
    #[arg(short, long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=600))]
    seconds: u32,

    /// Acquisition rate (Hz)
    #[arg(long, default_value_t = defaults::SAMPLE_RATE_HZ)]
    sample_rate: f64,

    /// Acceleration period from rest to steady speed (s)
    #[arg(long, default_value = "5")]
    warm_up: f64,

    /// Peak-to-mid-scale signal amplitude (V)
    #[arg(long, default_value = "2.0")]
    amplitude: f64,

    /// Standard deviation of the Gaussian sensor noise (V)
    #[arg(long, default_value = "0.05")]
    noise: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Signal Generation
// ============================================================================

/// Shaft angle integrator with a linear run-up.
struct ShaftSimulator {
    target_rpm: f64,
    warm_up_s: f64,
    phase: f64,
}

impl ShaftSimulator {
    fn new(target_rpm: f64, warm_up_s: f64) -> Self {
        Self {
            target_rpm,
            warm_up_s,
            phase: 0.0,
        }
    }

    fn rpm_at(&self, t: f64) -> f64 {
        if self.warm_up_s > 0.0 && t < self.warm_up_s {
            self.target_rpm * t / self.warm_up_s
        } else {
            self.target_rpm
        }
    }

    /// Advance by `dt` and return the clean sensor voltage.
    fn step(&mut self, t: f64, dt: f64, amplitude: f64) -> f64 {
        let voltage = SENSOR_OFFSET_V + amplitude * self.phase.sin();
        self.phase += 2.0 * PI * self.rpm_at(t) / 60.0 * dt;
        voltage
    }
}

fn generate(args: &Args, rng: &mut StdRng) -> anyhow::Result<TachometerRun> {
    let noise = Normal::new(0.0, args.noise.max(0.0))?;
    let dt = 1.0 / args.sample_rate;
    let n = (f64::from(args.seconds) * args.sample_rate).round() as usize;

    let mut shaft_a = ShaftSimulator::new(args.rpm_a, args.warm_up);
    let mut shaft_b = ShaftSimulator::new(args.rpm_b, args.warm_up);

    let mut run = TachometerRun {
        name: args.name.clone(),
        time: Vec::with_capacity(n),
        shaft_a: Vec::with_capacity(n),
        shaft_b: Vec::with_capacity(n),
    };

    for i in 0..n {
        let t = i as f64 * dt;
        run.time.push(t);
        run.shaft_a.push(shaft_a.step(t, dt, args.amplitude) + noise.sample(rng));
        run.shaft_b.push(shaft_b.step(t, dt, args.amplitude) + noise.sample(rng));
    }
    Ok(run)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if !(args.sample_rate.is_finite() && args.sample_rate > 0.0) {
        anyhow::bail!("--sample-rate must be a positive number (got {})", args.sample_rate);
    }

    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let run = generate(&args, &mut rng)?;
    let warm_up_samples = (args.warm_up.max(0.0) * args.sample_rate).round() as usize;
    tracing::info!(
        name = %run.name,
        samples = run.time.len(),
        rpm_a = args.rpm_a,
        rpm_b = args.rpm_b,
        warm_up_samples = warm_up_samples,
        "Simulated tachometer run"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, &run)?;
    writeln!(out)?;
    Ok(())
}

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use scg_capture::config::AppConfig;
use scg_capture::sensor::RawMotionEvent;
use scg_capture::signal::{BeatEvent, PeakDetector, TimestampNormalizer};
use scg_capture::testing::fixtures;

#[derive(Parser, Debug)]
#[command(
    name = "scg_replay",
    about = "Offline replay harness for the SCG capture pipeline"
)]
struct Cli {
    /// Override path to a capture config JSON (defaults to built-in values)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a recorded capture through the normalizer and detector
    Replay {
        /// JSON array of raw motion events ({ax, ay, az, timestamp})
        input: PathBuf,
        /// Emit every detected beat as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Generate a synthetic capture recording for experimentation
    Synth {
        /// Output path for the JSON recording
        output: PathBuf,
        /// Simulated heart rate in BPM
        #[arg(long, default_value_t = 72)]
        bpm: u32,
        /// Recording length in seconds
        #[arg(long, default_value_t = 60.0)]
        duration_s: f64,
        /// Standard deviation of added sensor noise
        #[arg(long, default_value_t = 0.05)]
        noise: f64,
        /// Fraction of timestamps coarsened into duplicate groups
        #[arg(long, default_value_t = 0.05)]
        duplicates: f64,
    },
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    samples_in: usize,
    samples_out: usize,
    beats: usize,
    mean_interval_ms: Option<f64>,
    estimated_bpm: Option<f64>,
    low_signal: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Replay { input, json } => run_replay(&config, &input, json),
        Commands::Synth {
            output,
            bpm,
            duration_s,
            noise,
            duplicates,
        } => run_synth(&output, bpm, duration_s, noise, duplicates),
    }
}

fn run_replay(config: &AppConfig, input: &PathBuf, json: bool) -> Result<ExitCode> {
    let contents = fs::read_to_string(input)
        .with_context(|| format!("reading recording {}", input.display()))?;
    let events: Vec<RawMotionEvent> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing recording {}", input.display()))?;

    let mut normalizer = TimestampNormalizer::new();
    let mut detector = PeakDetector::with_config(&config.detector);
    let mut beats: Vec<BeatEvent> = Vec::new();
    let mut samples_out = 0usize;

    for event in &events {
        for sample in normalizer.push(*event) {
            samples_out += 1;
            if let Some(beat) = detector.push(sample.az, sample.timestamp) {
                if json {
                    println!("{}", serde_json::to_string(&beat)?);
                }
                beats.push(beat);
            }
        }
    }
    samples_out += normalizer.flush().len();

    let intervals: Vec<f64> = beats
        .windows(2)
        .map(|pair| pair[1].timestamp_ms - pair[0].timestamp_ms)
        .collect();
    let mean_interval_ms = if intervals.is_empty() {
        None
    } else {
        Some(intervals.iter().sum::<f64>() / intervals.len() as f64)
    };
    let report = ReplayReport {
        samples_in: events.len(),
        samples_out,
        beats: beats.len(),
        mean_interval_ms,
        estimated_bpm: mean_interval_ms.map(|ms| 60_000.0 / ms),
        low_signal: samples_out < config.session.min_sample_len,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(ExitCode::from(0))
}

fn run_synth(
    output: &PathBuf,
    bpm: u32,
    duration_s: f64,
    noise: f64,
    duplicates: f64,
) -> Result<ExitCode> {
    anyhow::ensure!(bpm > 0, "BPM must be greater than 0 (got {})", bpm);

    let period_ms = 60_000.0 / bpm as f64;
    let signal = fixtures::pulse_waveform(duration_s, period_ms, 1.0);
    let signal = fixtures::with_noise(&signal, noise, 42);
    let mut events = fixtures::raw_events(&signal);
    fixtures::duplicate_timestamps(&mut events, duplicates, 42);

    let payload = serde_json::to_string(&events)?;
    fs::write(output, payload)
        .with_context(|| format!("writing recording {}", output.display()))?;
    println!(
        "Wrote {} events ({} BPM, {:.0} s) to {}",
        events.len(),
        bpm,
        duration_s,
        output.display()
    );

    Ok(ExitCode::from(0))
}

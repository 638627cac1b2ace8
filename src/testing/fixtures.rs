//! Synthetic SCG waveform generation.
//!
//! Deterministic accelerometer feeds for exercising the pipeline: a
//! quiet baseline with one sharp pulse per heartbeat, a plain sinusoid,
//! and helpers that degrade timestamps the way real mobile sensors do.
//! Noise and timestamp corruption use a fixed-seed RNG so identical
//! inputs produce identical fixtures across runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sensor::RawMotionEvent;

/// Nominal sensor period: 100 Hz sampling.
pub const SAMPLE_INTERVAL_MS: f64 = 10.0;

/// Resting chest-normal acceleration (gravity) in m/s^2.
pub const BASELINE_AZ: f64 = 9.8;

/// Width of the synthetic heartbeat pulse in milliseconds.
const PULSE_WIDTH_MS: f64 = 100.0;

/// Baseline signal with one half-sine pulse per beat period.
///
/// Approximates the sharp mechanical impulse of a heartbeat followed by
/// a quiet diastole, sampled at 100 Hz.
///
/// # Arguments
/// * `duration_s` - Total signal length in seconds
/// * `period_ms` - Beat period (e.g. 1000.0 for 60 BPM)
/// * `amplitude` - Pulse height above the baseline
pub fn pulse_waveform(duration_s: f64, period_ms: f64, amplitude: f64) -> Vec<f64> {
    let total = (duration_s * 1_000.0 / SAMPLE_INTERVAL_MS) as usize;
    let mut signal = Vec::with_capacity(total);
    for i in 0..total {
        let t_ms = i as f64 * SAMPLE_INTERVAL_MS;
        let phase_ms = t_ms % period_ms;
        let value = if phase_ms < PULSE_WIDTH_MS {
            BASELINE_AZ + amplitude * (std::f64::consts::PI * phase_ms / PULSE_WIDTH_MS).sin()
        } else {
            BASELINE_AZ
        };
        signal.push(value);
    }
    signal
}

/// Pure sinusoid riding the baseline, sampled at 100 Hz.
///
/// # Arguments
/// * `duration_s` - Total signal length in seconds
/// * `frequency_hz` - Oscillation frequency (1.2 Hz = 72 BPM)
/// * `amplitude` - Peak deviation from the baseline
pub fn sine_waveform(duration_s: f64, frequency_hz: f64, amplitude: f64) -> Vec<f64> {
    let total = (duration_s * 1_000.0 / SAMPLE_INTERVAL_MS) as usize;
    (0..total)
        .map(|i| {
            let t_s = i as f64 * SAMPLE_INTERVAL_MS / 1_000.0;
            BASELINE_AZ + amplitude * (2.0 * std::f64::consts::PI * frequency_hz * t_s).sin()
        })
        .collect()
}

/// Add seeded Gaussian-ish noise (sum of uniforms) to a waveform.
pub fn with_noise(values: &[f64], sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    values
        .iter()
        .map(|&v| {
            // Irwin-Hall approximation of a normal deviate
            let u: f64 = (0..12).map(|_| rng.gen_range(0.0..1.0)).sum::<f64>() - 6.0;
            v + u * sigma
        })
        .collect()
}

/// Wrap a z-axis waveform into raw motion events at the nominal rate.
pub fn raw_events(values: &[f64]) -> Vec<RawMotionEvent> {
    values
        .iter()
        .enumerate()
        .map(|(i, &az)| RawMotionEvent {
            ax: 0.02,
            ay: -0.01,
            az,
            timestamp: i as f64 * SAMPLE_INTERVAL_MS,
        })
        .collect()
}

/// Degrade timestamps the way coarse mobile sensor clocks do.
///
/// Roughly `fraction` of the events end up sharing a timestamp with
/// their predecessor, in runs of 2-3 readings. Event order and count
/// are unchanged; only timestamps are coarsened.
pub fn duplicate_timestamps(events: &mut [RawMotionEvent], fraction: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut i = 1;
    while i < events.len() {
        if rng.gen_range(0.0..1.0) < fraction {
            let group = rng.gen_range(2..=3usize).min(events.len() - i + 1);
            let shared = events[i - 1].timestamp;
            for event in events.iter_mut().skip(i).take(group - 1) {
                event.timestamp = shared;
            }
            i += group;
        } else {
            i += 1;
        }
    }
}

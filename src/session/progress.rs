// Progress and outcome types for the capture session
//
// These structs cross the embedding boundary: CaptureProgress feeds the
// UI during Measuring, CaptureOutcome is the exactly-once handoff of a
// finished capture.

use serde::{Deserialize, Serialize};

use crate::session::buffer::SamplePoint;

/// Lifecycle stage of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Armed and waiting for a user start action
    Ready,
    /// Counting down before sampling begins
    Countdown,
    /// Actively capturing motion samples
    Measuring,
    /// Capture finished; outcome available exactly once
    Complete,
    /// Session aborted with a caller-visible error
    Error,
}

impl Stage {
    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Ready => "READY",
            Stage::Countdown => "COUNTDOWN",
            Stage::Measuring => "MEASURING",
            Stage::Complete => "COMPLETE",
            Stage::Error => "ERROR",
        }
    }

    /// True while a started session is still running
    pub fn is_active(&self) -> bool {
        matches!(self, Stage::Countdown | Stage::Measuring)
    }
}

/// Advisory progress snapshot broadcast during Measuring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureProgress {
    /// Current session stage
    pub stage: Stage,
    /// Capture progress in percent, clamped to [0, 100]
    pub percent: f32,
    /// Wall-clock milliseconds since measuring started
    pub elapsed_ms: u64,
    /// Number of samples currently buffered
    pub samples_buffered: usize,
}

impl CaptureProgress {
    /// Create a new progress snapshot
    ///
    /// # Arguments
    /// * `stage` - Current session stage
    /// * `percent` - Progress percentage (clamped to [0, 100])
    /// * `elapsed_ms` - Milliseconds since measuring started
    /// * `samples_buffered` - Samples currently in the buffer
    pub fn new(stage: Stage, percent: f32, elapsed_ms: u64, samples_buffered: usize) -> Self {
        Self {
            stage,
            percent: percent.clamp(0.0, 100.0),
            elapsed_ms,
            samples_buffered,
        }
    }

    /// Compute the progress percentage for an elapsed/duration pair
    pub fn percent_for(elapsed_ms: u64, duration_ms: u64) -> f32 {
        if duration_ms == 0 {
            return 100.0;
        }
        ((elapsed_ms as f64 / duration_ms as f64) * 100.0).min(100.0) as f32
    }

    /// True once the capture window has fully elapsed
    pub fn is_complete(&self) -> bool {
        self.percent >= 100.0
    }
}

/// The finished capture, handed to the caller exactly once.
///
/// A short or empty sample list is a normal outcome: signal quality is
/// a data property the downstream analysis layer evaluates, never an
/// error raised here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOutcome {
    /// Ordered capture, timestamps rounded to integer milliseconds
    pub samples: Vec<SamplePoint>,
    /// Number of beats the live detector reported
    pub beat_count: u32,
    /// Timestamps of the detected beats, rounded like the samples
    pub peak_timestamps_ms: Vec<i64>,
}

impl CaptureOutcome {
    /// True when the capture is too short for reliable analysis.
    ///
    /// Callers compare against their configured minimum sample count
    /// before forwarding to the analysis endpoint.
    pub fn is_low_signal(&self, min_sample_len: usize) -> bool {
        self.samples.len() < min_sample_len
    }
}

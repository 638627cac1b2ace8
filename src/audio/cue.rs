//! Measurement audio cues - countdown ticks, beat ticks, completion tone
//!
//! Audio feedback is fire-and-forget: playback must never block or delay
//! sample ingestion, and a playback failure is swallowed by the sink,
//! never escalated to the session state machine. The crate ships a
//! logging sink; platform embeddings supply a real one.

use crate::config::AudioCueConfig;

/// The three audio cues a measurement session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// One tick per countdown decrement
    CountdownTick,
    /// One tick per detected heartbeat
    Heartbeat,
    /// Single tone when the capture completes
    Completion,
}

impl Cue {
    /// Tone frequency and duration for this cue under the given config.
    pub fn tone(&self, config: &AudioCueConfig) -> (f32, f32) {
        match self {
            Cue::CountdownTick => (config.countdown_hz, config.tick_duration_s),
            Cue::Heartbeat => (config.beat_hz, config.tick_duration_s),
            Cue::Completion => (config.completion_hz, config.completion_duration_s),
        }
    }
}

/// Trait implemented by platform tone generators.
///
/// `play_tone` is best-effort and must return promptly; implementations
/// swallow and log playback failures internally.
pub trait ToneSink: Send + Sync {
    fn play_tone(&self, frequency_hz: f32, duration_s: f32);
}

/// Default sink that logs cues instead of producing sound.
///
/// Useful on platforms without an audio path wired up and in tests.
#[derive(Default)]
pub struct LogToneSink {
    _unit: (),
}

impl ToneSink for LogToneSink {
    fn play_tone(&self, frequency_hz: f32, duration_s: f32) {
        log::debug!(
            "[Audio] tone {:.0} Hz for {:.2} s (no audio backend wired)",
            frequency_hz,
            duration_s
        );
    }
}

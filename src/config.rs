//! Configuration management for capture and detection tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Key parameters for
//! peak detection, session timing, and audio cues can be adjusted via
//! the config file for rapid experimentation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub session: SessionConfig,
    pub audio: AudioCueConfig,
}

/// Peak detection algorithm parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Window unit approximating 1/4 of an expected beat period, in samples
    pub quarter_period: usize,
    /// Minimum spacing between reported beats in milliseconds
    pub refractory_ms: f64,
    /// Number of deviation entries averaged into the smoothed signal
    pub smoothing_window: usize,
    /// Multiplier on quarter_period sizing the mean-deviation window
    pub mean_dev_window_factor: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            // 20 samples ~ one quarter beat at 120 BPM with a 100 Hz sensor
            quarter_period: 20,
            // 400 ms between beats caps the detectable rate at 150 BPM
            refractory_ms: 400.0,
            smoothing_window: 60,
            mean_dev_window_factor: 1.8,
        }
    }
}

/// Capture session timing and buffering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Total capture duration in milliseconds
    pub duration_ms: u64,
    /// Number of countdown steps before measuring starts
    pub countdown_start: u8,
    /// Interval between countdown decrements in milliseconds
    pub countdown_tick_ms: u64,
    /// Interval between progress broadcasts in milliseconds
    pub progress_interval_ms: u64,
    /// Sample buffer capacity; oldest samples evict first beyond this
    pub buffer_capacity: usize,
    /// Captures shorter than this many samples are flagged low-signal
    pub min_sample_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 60_000,
            countdown_start: 3,
            countdown_tick_ms: 1_000,
            progress_interval_ms: 50,
            buffer_capacity: 2_000,
            min_sample_len: 1_300,
        }
    }
}

/// Audio cue frequencies and durations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioCueConfig {
    /// Countdown tick frequency in Hz
    pub countdown_hz: f32,
    /// Heartbeat tick frequency in Hz
    pub beat_hz: f32,
    /// Completion tone frequency in Hz
    pub completion_hz: f32,
    /// Countdown/beat tick duration in seconds
    pub tick_duration_s: f32,
    /// Completion tone duration in seconds
    pub completion_duration_s: f32,
}

impl Default for AudioCueConfig {
    fn default() -> Self {
        Self {
            countdown_hz: 800.0,
            beat_hz: 1_000.0,
            completion_hz: 1_200.0,
            tick_duration_s: 0.10,
            completion_duration_s: 0.15,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            session: SessionConfig::default(),
            audio: AudioCueConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Loaded configuration
    /// * `Err` - If file doesn't exist or JSON is invalid, returns default config
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/capture_config.json")
    }
}

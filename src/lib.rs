// SCG Capture Core - Rust sensing engine
// Real-time seismocardiography capture and heartbeat detection

// Module declarations
pub mod audio;
pub mod config;
pub mod error;
pub mod managers;
pub mod sensor;
pub mod session;
pub mod signal;
pub mod testing;

// Re-exports for convenience
pub use audio::{Cue, LogToneSink, ToneSink};
pub use config::AppConfig;
pub use error::{ErrorCode, SensorError, SessionError};
pub use sensor::{MotionSensor, PermissionStatus, RawMotionEvent, TimeSource};
pub use session::{
    CaptureController, CaptureOutcome, CaptureProgress, SamplePoint, SessionEvent,
    SessionEventKind, Stage,
};
pub use signal::{BeatEvent, PeakDetector, Sample, TimestampNormalizer};

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_structure() {
        // Verify all modules are accessible
        // This ensures the crate compiles with proper module hierarchy
    }
}

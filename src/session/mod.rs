// Capture session module
//
// The session controller drives the measurement lifecycle; the buffer
// and progress types carry its owned data and advisory outputs.

pub mod buffer;
pub mod controller;
pub mod progress;

pub use buffer::{SampleBuffer, SamplePoint};
pub use controller::{CaptureController, SessionEvent, SessionEventKind};
pub use progress::{CaptureOutcome, CaptureProgress, Stage};

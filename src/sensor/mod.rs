//! Platform capability abstractions for the capture core.
//!
//! The motion sensor and the wall clock are trait-shaped inputs so the
//! session controller stays independent of any concrete platform layer
//! and fully testable with the stubs in [`stubs`].

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// One raw accelerometer reading as delivered by the platform callback.
///
/// Timestamps are monotonic device milliseconds and are NOT guaranteed
/// unique; several readings may share one coarse timestamp tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMotionEvent {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub timestamp: f64,
}

/// Outcome of a motion-sensor permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    /// User granted access
    Granted,
    /// User or platform refused access
    Denied,
    /// Platform delivers motion events without an explicit permission step
    NotRequired,
}

impl PermissionStatus {
    /// True if motion events may be subscribed to.
    pub fn allows_capture(&self) -> bool {
        matches!(self, PermissionStatus::Granted | PermissionStatus::NotRequired)
    }
}

/// Callback invoked for every raw motion event while subscribed.
pub type MotionCallback = Arc<dyn Fn(RawMotionEvent) + Send + Sync>;

/// Trait implemented by platform-specific motion sources.
///
/// Events are delivered at sensor-native rate (commonly 60-100 Hz, not
/// guaranteed uniform) on an effectively serialized callback context.
/// `unsubscribe` must be idempotent; double-stop is safe.
pub trait MotionSensor: Send + Sync {
    /// Ask the platform for motion access. A `Denied` result is a
    /// normal outcome, not an `Err`.
    fn request_permission(&self) -> Result<PermissionStatus, SensorError>;

    /// Register the callback and begin delivering events.
    fn subscribe(&self, callback: MotionCallback) -> Result<(), SensorError>;

    /// Stop delivering events. Safe to call repeatedly or while an
    /// event is being dispatched.
    fn unsubscribe(&self);
}

/// Trait representing a monotonic time source for elapsed-time math.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub mod stubs;
pub use stubs::ManualMotionSensor;

// Motion sensor error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log a sensor error with structured context
///
/// Logs sensor errors with the numeric error code, the component the
/// error originated from, and a human-readable message. Non-blocking;
/// never panics on failure.
pub fn log_sensor_error(err: &SensorError, context: &str) {
    error!(
        "Sensor error in {}: code={}, component=MotionSensor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Motion-sensor-related errors
///
/// These errors cover permission acquisition and callback registration
/// for the platform motion capability.
///
/// Error code range: 1101-1103
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Motion sensor permission denied by the user or platform
    PermissionDenied,

    /// Motion sensing is unavailable on this device
    Unavailable { details: String },

    /// Registering the motion callback with the platform failed
    CallbackRegistrationFailed { reason: String },
}

impl SensorError {
    /// Motion sensor permission denied
    pub const PERMISSION_DENIED: i32 = 1101;

    /// Motion sensing unavailable
    pub const UNAVAILABLE: i32 = 1102;

    /// Callback registration failed
    pub const CALLBACK_REGISTRATION_FAILED: i32 = 1103;
}

impl ErrorCode for SensorError {
    fn code(&self) -> i32 {
        match self {
            SensorError::PermissionDenied => Self::PERMISSION_DENIED,
            SensorError::Unavailable { .. } => Self::UNAVAILABLE,
            SensorError::CallbackRegistrationFailed { .. } => {
                Self::CALLBACK_REGISTRATION_FAILED
            }
        }
    }

    fn message(&self) -> String {
        match self {
            SensorError::PermissionDenied => {
                "Motion sensor permission denied. Please grant motion/sensor access.".to_string()
            }
            SensorError::Unavailable { details } => {
                format!("Motion sensing unavailable: {}", details)
            }
            SensorError::CallbackRegistrationFailed { reason } => {
                format!("Failed to register motion callback: {}", reason)
            }
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SensorError {}

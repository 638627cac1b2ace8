// Error types for the SCG capture core
//
// This module defines custom error types for sensor and session operations,
// providing structured error handling with error codes suitable for
// embedding-layer communication.

mod sensor;
mod session;

pub use sensor::{log_sensor_error, SensorError};
pub use session::{log_session_error, SessionError};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the embedding boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

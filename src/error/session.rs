// Capture session error types and constants

use crate::error::{ErrorCode, SensorError};
use log::error;
use std::fmt;

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=CaptureController, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Capture-session-related errors
///
/// These errors cover session lifecycle operations: starting a capture,
/// permission acquisition, and shared state access. Signal-quality
/// problems are never errors; a short or empty capture is a normal
/// Complete outcome the caller inspects.
///
/// Error code range: 2101-2105
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Motion sensor permission denied; the session stays in Ready
    PermissionDenied,

    /// A session is already counting down or measuring
    AlreadyRunning,

    /// No session is currently active
    NotRunning,

    /// The underlying motion sensor reported an error
    Sensor { source: SensorError },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl SessionError {
    /// Motion sensor permission denied
    pub const PERMISSION_DENIED: i32 = 2101;

    /// Session already running
    pub const ALREADY_RUNNING: i32 = 2102;

    /// Session not running
    pub const NOT_RUNNING: i32 = 2103;

    /// Underlying sensor error
    pub const SENSOR: i32 = 2104;

    /// Lock poisoned
    pub const LOCK_POISONED: i32 = 2105;
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::PermissionDenied => Self::PERMISSION_DENIED,
            SessionError::AlreadyRunning => Self::ALREADY_RUNNING,
            SessionError::NotRunning => Self::NOT_RUNNING,
            SessionError::Sensor { .. } => Self::SENSOR,
            SessionError::LockPoisoned { .. } => Self::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::PermissionDenied => {
                "Motion sensor permission denied. Please grant motion/sensor access and retry."
                    .to_string()
            }
            SessionError::AlreadyRunning => {
                "Capture session already running. Call close() first.".to_string()
            }
            SessionError::NotRunning => {
                "No capture session running. Call start() first.".to_string()
            }
            SessionError::Sensor { source } => {
                format!("Motion sensor error: {}", source.message())
            }
            SessionError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}

impl From<SensorError> for SessionError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::PermissionDenied => SessionError::PermissionDenied,
            other => SessionError::Sensor { source: other },
        }
    }
}

//! Manually driven motion sensor for tests and offline replay.
//!
//! `ManualMotionSensor` plays the role of the platform motion capability:
//! the embedding (or a test) scripts the permission result and pushes
//! events by hand with [`ManualMotionSensor::emit`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::SensorError;
use crate::sensor::{MotionCallback, MotionSensor, PermissionStatus, RawMotionEvent};

/// Script-driven motion sensor.
///
/// The registered callback is cloned out of the lock before dispatch,
/// so a callback may call `unsubscribe` on the sensor that is currently
/// delivering to it without deadlocking.
pub struct ManualMotionSensor {
    permission: PermissionStatus,
    callback: Mutex<Option<MotionCallback>>,
    emitted: AtomicUsize,
}

impl ManualMotionSensor {
    /// Sensor that reports the given permission status on request.
    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            permission,
            callback: Mutex::new(None),
            emitted: AtomicUsize::new(0),
        }
    }

    /// Sensor that always grants access.
    pub fn granted() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    /// Sensor that always denies access.
    pub fn denied() -> Self {
        Self::with_permission(PermissionStatus::Denied)
    }

    /// Deliver one event to the subscribed callback, if any.
    ///
    /// Returns true if a callback consumed the event.
    pub fn emit(&self, event: RawMotionEvent) -> bool {
        let callback = self.callback.lock().unwrap().clone();
        match callback {
            Some(callback) => {
                callback(event);
                self.emitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// True while a callback is registered.
    pub fn is_subscribed(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }

    /// Number of events delivered to a callback so far.
    pub fn emitted_count(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl MotionSensor for ManualMotionSensor {
    fn request_permission(&self) -> Result<PermissionStatus, SensorError> {
        Ok(self.permission)
    }

    fn subscribe(&self, callback: MotionCallback) -> Result<(), SensorError> {
        *self.callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn unsubscribe(&self) {
        *self.callback.lock().unwrap() = None;
    }
}

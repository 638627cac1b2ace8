// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::session::controller::SessionEvent;
use crate::session::progress::CaptureProgress;
use crate::signal::BeatEvent;

/// Manages all tokio broadcast channels
///
/// Single Responsibility: Broadcast channel lifecycle and subscription
///
/// This manager centralizes all broadcast channel creation, storage, and
/// subscription handling. It provides a clean interface for:
/// - Initializing broadcast channels with appropriate buffer sizes
/// - Subscribing to broadcast channels for multiple consumers
/// - Managing channel lifecycle (creation, cleanup)
///
/// # Channel Types
/// - Beats: Live heartbeat events from the detector (advisory)
/// - Progress: Capture progress updates during Measuring (advisory)
/// - Session events: Session lifecycle telemetry
pub struct BroadcastChannelManager {
    beats: Arc<Mutex<Option<broadcast::Sender<BeatEvent>>>>,
    progress: Arc<Mutex<Option<broadcast::Sender<CaptureProgress>>>>,
    session_events: Arc<Mutex<Option<broadcast::Sender<SessionEvent>>>>,
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with all channels uninitialized
    ///
    /// Channels must be explicitly initialized via init_* methods before use.
    pub fn new() -> Self {
        Self {
            beats: Arc::new(Mutex::new(None)),
            progress: Arc::new(Mutex::new(None)),
            session_events: Arc::new(Mutex::new(None)),
        }
    }

    // ========================================================================
    // BEAT CHANNEL
    // ========================================================================

    /// Initialize the beat broadcast channel
    ///
    /// Returns sender for the ingestion path to publish detected beats.
    /// Buffer size 100 comfortably covers burst traffic; at 150 BPM the
    /// detector cannot legally produce more than 3 beats per second.
    pub fn init_beats(&self) -> broadcast::Sender<BeatEvent> {
        let (tx, _) = broadcast::channel(100);
        *self.beats.lock().unwrap() = Some(tx.clone());
        tx
    }

    /// Subscribe to detected beats
    ///
    /// Returns None if init_beats() has not been called yet. Each
    /// subscriber gets an independent receiver.
    pub fn subscribe_beats(&self) -> Option<broadcast::Receiver<BeatEvent>> {
        self.beats.lock().unwrap().as_ref().map(|tx| tx.subscribe())
    }

    /// Get the current beat sender, if initialized
    pub fn get_beat_sender(&self) -> Option<broadcast::Sender<BeatEvent>> {
        self.beats.lock().unwrap().clone()
    }

    // ========================================================================
    // PROGRESS CHANNEL
    // ========================================================================

    /// Initialize the progress broadcast channel
    ///
    /// Returns sender for the progress timer to publish updates. At the
    /// default 50 ms tick a 100-message buffer holds 5 seconds of
    /// backlog for a lagging subscriber.
    pub fn init_progress(&self) -> broadcast::Sender<CaptureProgress> {
        let (tx, _) = broadcast::channel(100);
        *self.progress.lock().unwrap() = Some(tx.clone());
        tx
    }

    /// Subscribe to capture progress updates
    ///
    /// Returns None if init_progress() has not been called yet.
    pub fn subscribe_progress(&self) -> Option<broadcast::Receiver<CaptureProgress>> {
        self.progress
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Get the current progress sender, if initialized
    pub fn get_progress_sender(&self) -> Option<broadcast::Sender<CaptureProgress>> {
        self.progress.lock().unwrap().clone()
    }

    // ========================================================================
    // SESSION EVENT CHANNEL
    // ========================================================================

    /// Initialize the session event broadcast channel
    ///
    /// Returns sender for the controller to publish lifecycle events
    /// (countdown ticks, measuring start, completion).
    pub fn init_session_events(&self) -> broadcast::Sender<SessionEvent> {
        let (tx, _) = broadcast::channel(50);
        *self.session_events.lock().unwrap() = Some(tx.clone());
        tx
    }

    /// Subscribe to session lifecycle events
    ///
    /// Returns None if init_session_events() has not been called yet.
    pub fn subscribe_session_events(&self) -> Option<broadcast::Receiver<SessionEvent>> {
        self.session_events
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Get the current session event sender, if initialized
    pub fn get_session_event_sender(&self) -> Option<broadcast::Sender<SessionEvent>> {
        self.session_events.lock().unwrap().clone()
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

//! CaptureController: capture session orchestration layer.
//!
//! Drives the measurement lifecycle `Ready -> Countdown -> Measuring ->
//! Complete | Error`, owning the normalizer -> detector -> buffer
//! pipeline for exactly one session at a time. Collaborators (motion
//! sensor, tone sink, time source) are trait objects supplied by the
//! embedding layer; all live outputs flow through tokio broadcast
//! channels.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

use crate::audio::{Cue, ToneSink};
use crate::config::{AppConfig, AudioCueConfig, SessionConfig};
use crate::error::{log_session_error, SessionError};
use crate::managers::BroadcastChannelManager;
use crate::sensor::{MotionCallback, MotionSensor, RawMotionEvent, SystemTimeSource, TimeSource};
use crate::session::buffer::SampleBuffer;
use crate::session::progress::{CaptureOutcome, CaptureProgress, Stage};
use crate::signal::{BeatEvent, PeakDetector, TimestampNormalizer};

/// Session lifecycle event emitted by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub timestamp_ms: u64,
    pub kind: SessionEventKind,
}

/// Types of session events supported by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEventKind {
    CountdownStarted { from: u8 },
    CountdownTick { remaining: u8 },
    MeasuringStarted,
    Completed { samples: usize, beats: u32 },
    Closed,
    Warning { detail: String },
}

/// Mutable per-session state, owned behind one mutex.
///
/// Only the motion callback and the duration timer mutate this; the
/// progress task is read-only. A fresh session rebuilds all of it, so
/// nothing leaks across sessions.
struct SessionState {
    stage: Stage,
    countdown: u8,
    normalizer: TimestampNormalizer,
    detector: PeakDetector,
    buffer: SampleBuffer,
    /// Device timestamp of the first sample of this capture
    epoch_ms: Option<f64>,
    measuring_started: Option<Instant>,
    outcome: Option<CaptureOutcome>,
}

/// Collaborators and channel senders shared with the timer tasks and
/// the motion callback.
#[derive(Clone)]
struct SessionDeps {
    sensor: Arc<dyn MotionSensor>,
    tones: Arc<dyn ToneSink>,
    time_source: Arc<dyn TimeSource>,
    start_instant: Instant,
    session_config: SessionConfig,
    audio_config: AudioCueConfig,
    event_tx: broadcast::Sender<SessionEvent>,
    beat_tx: broadcast::Sender<BeatEvent>,
    progress_tx: broadcast::Sender<CaptureProgress>,
}

/// CaptureController orchestrates one measurement session at a time.
pub struct CaptureController {
    config: AppConfig,
    session: Arc<Mutex<SessionState>>,
    deps: SessionDeps,
    pub(crate) broadcasts: BroadcastChannelManager,
    timer_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    /// Dedicated worker runtime driving the countdown, progress, and
    /// duration timers so no ambient runtime is required of the caller
    timer_runtime: tokio::runtime::Runtime,
}

impl CaptureController {
    /// Create a controller with configuration from the default location.
    pub fn new(sensor: Arc<dyn MotionSensor>, tones: Arc<dyn ToneSink>) -> Self {
        Self::with_config(
            AppConfig::load(),
            sensor,
            tones,
            Arc::new(SystemTimeSource::default()),
        )
    }

    /// Create a controller with explicit configuration and collaborators.
    pub fn with_config(
        config: AppConfig,
        sensor: Arc<dyn MotionSensor>,
        tones: Arc<dyn ToneSink>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let broadcasts = BroadcastChannelManager::new();
        let beat_tx = broadcasts.init_beats();
        let progress_tx = broadcasts.init_progress();
        let event_tx = broadcasts.init_session_events();

        let timer_runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("scg-capture-timers")
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime for capture timers");

        let session = Arc::new(Mutex::new(SessionState {
            stage: Stage::Ready,
            countdown: config.session.countdown_start,
            normalizer: TimestampNormalizer::new(),
            detector: PeakDetector::with_config(&config.detector),
            buffer: SampleBuffer::with_capacity(config.session.buffer_capacity),
            epoch_ms: None,
            measuring_started: None,
            outcome: None,
        }));

        let deps = SessionDeps {
            sensor,
            tones,
            time_source,
            start_instant: Instant::now(),
            session_config: config.session.clone(),
            audio_config: config.audio.clone(),
            event_tx,
            beat_tx,
            progress_tx,
        };

        Self {
            config,
            session,
            deps,
            broadcasts,
            timer_tasks: Arc::new(Mutex::new(Vec::new())),
            timer_runtime,
        }
    }

    /// Controller configuration snapshot.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current session stage.
    pub fn stage(&self) -> Stage {
        self.session.lock().map(|s| s.stage).unwrap_or(Stage::Error)
    }

    /// Remaining countdown steps (meaningful during Countdown).
    pub fn countdown_remaining(&self) -> u8 {
        self.session.lock().map(|s| s.countdown).unwrap_or(0)
    }

    /// Number of samples currently buffered.
    pub fn samples_buffered(&self) -> usize {
        self.session.lock().map(|s| s.buffer.len()).unwrap_or(0)
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Begin a capture: acquire permission, then count down into Measuring.
    ///
    /// Permission denial aborts before Countdown with an actionable
    /// error; the session stays in Ready, no buffer is created and no
    /// timers are started.
    pub fn start(&self) -> Result<(), SessionError> {
        {
            let state = self.lock_session()?;
            if state.stage.is_active() {
                return Err(SessionError::AlreadyRunning);
            }
        }

        // A finished session may still own a sleeping duration timer;
        // drop all stale tasks so none can fire into this session
        for handle in self.timer_tasks.lock().unwrap().drain(..) {
            handle.abort();
        }

        let status = self.deps.sensor.request_permission()?;
        if !status.allows_capture() {
            let err = SessionError::PermissionDenied;
            log_session_error(&err, "start");
            return Err(err);
        }

        let from = self.deps.session_config.countdown_start;
        {
            let mut state = self.lock_session()?;
            state.stage = Stage::Countdown;
            state.countdown = from;
            state.outcome = None;
        }
        Self::publish_event(&self.deps, SessionEventKind::CountdownStarted { from });
        log::info!("[CaptureController] countdown started from {}", from);

        let session = Arc::clone(&self.session);
        let deps = self.deps.clone();
        let timer_tasks = Arc::clone(&self.timer_tasks);
        let handle = self.timer_runtime.spawn(async move {
            Self::run_countdown(session, deps, timer_tasks).await;
        });
        self.timer_tasks.lock().unwrap().push(handle);
        Ok(())
    }

    /// Re-arm a finished session. No data is kept in the controller.
    pub fn new_measurement(&self) -> Result<(), SessionError> {
        let mut state = self.lock_session()?;
        match state.stage {
            Stage::Complete | Stage::Error => {
                state.stage = Stage::Ready;
                state.countdown = self.deps.session_config.countdown_start;
                state.outcome = None;
                Ok(())
            }
            Stage::Ready => Ok(()),
            Stage::Countdown | Stage::Measuring => Err(SessionError::AlreadyRunning),
        }
    }

    /// Abort or finish the session, whatever stage it is in.
    ///
    /// Stops both timers and deregisters the motion callback; safe to
    /// call repeatedly. Closing during Measuring still produces the
    /// best-effort outcome so the caller never ends without a definite
    /// result.
    pub fn close(&self) {
        for handle in self.timer_tasks.lock().unwrap().drain(..) {
            handle.abort();
        }

        let mut emitted = false;
        if let Ok(mut state) = self.session.lock() {
            match state.stage {
                Stage::Measuring => {
                    Self::finalize_locked(&mut state, &self.deps);
                    emitted = true;
                }
                Stage::Countdown => {
                    state.stage = Stage::Ready;
                    state.countdown = self.deps.session_config.countdown_start;
                }
                _ => {}
            }
        }
        // Deregistration is idempotent even when finalize already ran
        self.deps.sensor.unsubscribe();
        if !emitted {
            Self::publish_event(&self.deps, SessionEventKind::Closed);
        }
        log::info!("[CaptureController] session closed");
    }

    /// Retrieve the finished capture. Yields the outcome exactly once;
    /// subsequent calls return None until another capture completes.
    pub fn take_outcome(&self) -> Option<CaptureOutcome> {
        self.session.lock().ok()?.outcome.take()
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    /// Subscribe to live beat events.
    pub fn subscribe_beats(&self) -> Option<broadcast::Receiver<BeatEvent>> {
        self.broadcasts.subscribe_beats()
    }

    /// Subscribe to capture progress updates.
    pub fn subscribe_progress(&self) -> Option<broadcast::Receiver<CaptureProgress>> {
        self.broadcasts.subscribe_progress()
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe_events(&self) -> Option<broadcast::Receiver<SessionEvent>> {
        self.broadcasts.subscribe_session_events()
    }

    /// Beat events as an async stream.
    pub fn beat_stream(&self) -> Option<BroadcastStream<BeatEvent>> {
        self.broadcasts.subscribe_beats().map(BroadcastStream::new)
    }

    /// Progress updates as an async stream.
    pub fn progress_stream(&self) -> Option<BroadcastStream<CaptureProgress>> {
        self.broadcasts.subscribe_progress().map(BroadcastStream::new)
    }

    /// Session events as an async stream.
    pub fn event_stream(&self) -> Option<BroadcastStream<SessionEvent>> {
        self.broadcasts
            .subscribe_session_events()
            .map(BroadcastStream::new)
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, SessionState>, SessionError> {
        self.session.lock().map_err(|_| SessionError::LockPoisoned {
            component: "session".to_string(),
        })
    }

    fn publish_event(deps: &SessionDeps, kind: SessionEventKind) {
        let timestamp_ms = deps
            .time_source
            .now()
            .saturating_duration_since(deps.start_instant)
            .as_millis() as u64;
        let _ = deps.event_tx.send(SessionEvent { timestamp_ms, kind });
    }

    fn play_cue(deps: &SessionDeps, cue: Cue) {
        let (frequency_hz, duration_s) = cue.tone(&deps.audio_config);
        deps.tones.play_tone(frequency_hz, duration_s);
    }

    /// Countdown task: one decrement and tick per configured interval,
    /// then hand over to measuring.
    async fn run_countdown(
        session: Arc<Mutex<SessionState>>,
        deps: SessionDeps,
        timer_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    ) {
        let tick = Duration::from_millis(deps.session_config.countdown_tick_ms);
        loop {
            tokio::time::sleep(tick).await;
            let remaining = {
                let Ok(mut state) = session.lock() else { return };
                if state.stage != Stage::Countdown {
                    return;
                }
                state.countdown = state.countdown.saturating_sub(1);
                state.countdown
            };
            Self::play_cue(&deps, Cue::CountdownTick);
            Self::publish_event(&deps, SessionEventKind::CountdownTick { remaining });
            if remaining == 0 {
                Self::begin_measuring(session, deps, timer_tasks);
                return;
            }
        }
    }

    /// Transition Countdown -> Measuring: rebuild all pipeline state,
    /// register the motion callback, and start both measuring timers.
    ///
    /// Runs inside the timer runtime (spawned from the countdown task).
    fn begin_measuring(
        session: Arc<Mutex<SessionState>>,
        deps: SessionDeps,
        timer_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    ) {
        {
            let Ok(mut state) = session.lock() else { return };
            state.stage = Stage::Measuring;
            state.normalizer.reset();
            state.detector.reset();
            state.buffer.clear();
            state.epoch_ms = None;
            state.measuring_started = Some(deps.time_source.now());
            state.outcome = None;
        }
        Self::publish_event(&deps, SessionEventKind::MeasuringStarted);
        log::info!(
            "[CaptureController] measuring for {} ms",
            deps.session_config.duration_ms
        );

        let callback: MotionCallback = {
            let session = Arc::clone(&session);
            let deps = deps.clone();
            Arc::new(move |event| Self::ingest(&session, &deps, event))
        };
        if let Err(err) = deps.sensor.subscribe(callback) {
            log::error!("[CaptureController] motion subscription failed: {}", err);
            if let Ok(mut state) = session.lock() {
                state.stage = Stage::Error;
            }
            Self::publish_event(
                &deps,
                SessionEventKind::Warning {
                    detail: format!("motion subscription failed: {}", err),
                },
            );
            return;
        }

        // Read-only progress timer; exits by itself once measuring ends
        let progress_handle = {
            let session = Arc::clone(&session);
            let deps = deps.clone();
            tokio::spawn(async move {
                let interval = Duration::from_millis(deps.session_config.progress_interval_ms);
                loop {
                    tokio::time::sleep(interval).await;
                    let snapshot = {
                        let Ok(state) = session.lock() else { return };
                        if state.stage != Stage::Measuring {
                            return;
                        }
                        let Some(started) = state.measuring_started else { return };
                        let elapsed_ms = deps
                            .time_source
                            .now()
                            .saturating_duration_since(started)
                            .as_millis() as u64;
                        CaptureProgress::new(
                            Stage::Measuring,
                            CaptureProgress::percent_for(
                                elapsed_ms,
                                deps.session_config.duration_ms,
                            ),
                            elapsed_ms,
                            state.buffer.len(),
                        )
                    };
                    let _ = deps.progress_tx.send(snapshot);
                }
            })
        };

        // Hard duration timer: the authority on session completion
        let duration_handle = {
            let session = Arc::clone(&session);
            let deps = deps.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(deps.session_config.duration_ms)).await;
                if let Ok(mut state) = session.lock() {
                    Self::finalize_locked(&mut state, &deps);
                }
            })
        };

        let mut tasks = timer_tasks.lock().unwrap();
        tasks.push(progress_handle);
        tasks.push(duration_handle);
    }

    /// Motion callback: normalize, buffer, and detect on one raw event.
    ///
    /// Events arriving outside Measuring are ignored. A sample whose
    /// device timestamp lands past the capture window forces completion
    /// and is not buffered, keeping the exported capture inside
    /// [epoch, epoch + duration).
    fn ingest(session: &Arc<Mutex<SessionState>>, deps: &SessionDeps, event: RawMotionEvent) {
        let Ok(mut state) = session.lock() else { return };
        if state.stage != Stage::Measuring {
            return;
        }

        let epoch = *state.epoch_ms.get_or_insert(event.timestamp);
        if event.timestamp - epoch >= deps.session_config.duration_ms as f64 {
            Self::finalize_locked(&mut state, deps);
            return;
        }

        let emitted = state.normalizer.push(event);
        for sample in emitted {
            state.buffer.push(sample);
            if let Some(beat) = state.detector.push(sample.az, sample.timestamp) {
                Self::play_cue(deps, Cue::Heartbeat);
                let _ = deps.beat_tx.send(beat);
            }
        }
    }

    /// Complete the capture: deregister, flush, freeze, notify.
    ///
    /// Idempotent; callable from the duration timer, the ingestion
    /// path, and close(). The caller holds the session lock.
    fn finalize_locked(state: &mut SessionState, deps: &SessionDeps) {
        if state.stage != Stage::Measuring {
            return;
        }
        deps.sensor.unsubscribe();

        let flushed = state.normalizer.flush();
        for sample in flushed {
            state.buffer.push(sample);
        }

        let outcome = CaptureOutcome {
            samples: state.buffer.export(),
            beat_count: state.detector.beat_count(),
            peak_timestamps_ms: state
                .detector
                .peak_timestamps()
                .iter()
                .map(|t| t.round() as i64)
                .collect(),
        };
        let samples = outcome.samples.len();
        let beats = outcome.beat_count;
        state.outcome = Some(outcome);
        state.stage = Stage::Complete;

        Self::play_cue(deps, Cue::Completion);
        Self::publish_event(deps, SessionEventKind::Completed { samples, beats });
        log::info!(
            "[CaptureController] capture complete: {} samples, {} beats",
            samples,
            beats
        );
    }
}

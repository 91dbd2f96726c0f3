//! Live monitoring loop
//!
//! Continuous chunked capture and dispatch: the capture session feeds raw
//! samples to the chunk scheduler, which seals a chunk every window and
//! hands it to the dispatch pipeline for remote classification. The
//! `MonitorController` glues these together behind a small lifecycle API
//! and fans lifecycle and result events out to subscribers.
//!
//! # Architecture
//!
//! ```text
//! Mic (cpal) ──samples──▶ Chunk Scheduler ──sealed chunks──▶ Dispatch
//!                              │ window tick                 Pipeline
//!                              │                                │ per-chunk task
//!                              ▼                                ▼
//!                      MonitorController ◀──verdict / error── Detector (HTTP)
//!                        │ lifecycle events      result events │
//!                        ▼                                     ▼
//!                     lifecycle subscribers        result subscribers
//! ```

pub mod chunk;
pub mod dispatch;
pub mod scheduler;
pub mod state;
pub mod subscribers;

pub use chunk::{AudioChunk, ChunkBuffer};
pub use dispatch::{AnalysisEvent, DispatchPipeline};
pub use state::{SessionInfo, SessionState};
pub use subscribers::{SubscriberId, SubscriberRegistry};

use crate::audio::{self, AudioCapture};
use crate::config::{Config, MonitorConfig, StopPolicy};
use crate::detect::{self, Detector};
use crate::error::{MonitorError, VoxguardError};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle events emitted to lifecycle subscribers
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// Monitoring started; a new session is active
    Started { info: SessionInfo },
    /// Monitoring stopped; the session is over
    Stopped { info: SessionInfo },
}

/// Coordinates one monitoring session at a time.
///
/// Owns its dependencies (capture session, detector, scheduler, pipeline)
/// via constructor injection; there is no global instance. Cloning the
/// controller clones a handle to the same session.
#[derive(Clone)]
pub struct MonitorController {
    inner: Arc<Inner>,
}

struct Inner {
    config: MonitorConfig,
    sample_rate: u32,
    /// Serializes start/stop; a second call while one is in flight waits
    transition: tokio::sync::Mutex<Session>,
    state: std::sync::Mutex<SessionState>,
    session_info: std::sync::Mutex<Option<SessionInfo>>,
    lifecycle: Arc<SubscriberRegistry<MonitorEvent>>,
    pipeline: DispatchPipeline,
}

/// Per-session resources, guarded by the transition lock
struct Session {
    capture: Box<dyn AudioCapture>,
    scheduler: Option<scheduler::SchedulerHandle>,
}

impl MonitorController {
    /// Create a controller with injected dependencies
    pub fn new(
        config: MonitorConfig,
        sample_rate: u32,
        capture: Box<dyn AudioCapture>,
        detector: Arc<dyn Detector>,
    ) -> Self {
        let results = Arc::new(SubscriberRegistry::new());
        let pipeline = DispatchPipeline::new(detector, results);

        Self {
            inner: Arc::new(Inner {
                config,
                sample_rate,
                transition: tokio::sync::Mutex::new(Session {
                    capture,
                    scheduler: None,
                }),
                state: std::sync::Mutex::new(SessionState::Idle),
                session_info: std::sync::Mutex::new(None),
                lifecycle: Arc::new(SubscriberRegistry::new()),
                pipeline,
            }),
        }
    }

    /// Build a controller with the configured cpal capture and remote
    /// detector
    pub fn from_config(config: &Config) -> Result<Self, VoxguardError> {
        config.validate()?;
        let capture = audio::create_capture(&config.audio)?;
        let detector = detect::create_detector(&config.detector)?;
        Ok(Self::new(
            config.monitor.clone(),
            config.audio.sample_rate,
            capture,
            detector,
        ))
    }

    /// Subscribe to lifecycle events (started/stopped)
    pub fn on_lifecycle(
        &self,
        handler: impl Fn(&MonitorEvent) + Send + Sync + 'static,
    ) -> SubscriberId {
        self.inner.lifecycle.subscribe(handler)
    }

    /// Remove a lifecycle subscription
    pub fn unsubscribe_lifecycle(&self, id: SubscriberId) -> bool {
        self.inner.lifecycle.unsubscribe(id)
    }

    /// Subscribe to per-chunk analysis results
    pub fn on_result(
        &self,
        handler: impl Fn(&AnalysisEvent) + Send + Sync + 'static,
    ) -> SubscriberId {
        self.inner.pipeline.results().subscribe(handler)
    }

    /// Remove a result subscription
    pub fn unsubscribe_result(&self, id: SubscriberId) -> bool {
        self.inner.pipeline.results().unsubscribe(id)
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().unwrap()
    }

    /// Whether a session is currently active
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Snapshot of the current or last session
    pub fn session_info(&self) -> Option<SessionInfo> {
        self.inner.session_info.lock().unwrap().clone()
    }

    fn set_state(&self, state: SessionState) {
        *self.inner.state.lock().unwrap() = state;
    }

    /// Start monitoring.
    ///
    /// No-op if already active. On acquisition failure the state stays
    /// `Idle`, no lifecycle event fires, and the error is returned to the
    /// caller.
    pub async fn start(&self) -> Result<(), MonitorError> {
        let mut session = self.inner.transition.lock().await;

        if self.state().is_active() {
            tracing::debug!("start() while already active; ignoring");
            return Ok(());
        }

        self.set_state(SessionState::Starting);

        let samples_rx = match session.capture.open().await {
            Ok(rx) => rx,
            Err(e) => {
                self.set_state(SessionState::Idle);
                return Err(MonitorError::Acquisition(e));
            }
        };

        // Sequence numbers reset to 0 inside the freshly spawned scheduler
        let window = Duration::from_millis(self.inner.config.window_ms);
        session.scheduler = Some(scheduler::spawn(
            window,
            self.inner.sample_rate,
            samples_rx,
            self.inner.pipeline.clone(),
        ));

        let info = SessionInfo::started_now(self.inner.config.source_label.clone());
        *self.inner.session_info.lock().unwrap() = Some(info.clone());
        self.set_state(SessionState::Active);

        tracing::info!(
            "Monitoring started: {} ({} ms windows)",
            info.source_label,
            self.inner.config.window_ms
        );
        self.inner.lifecycle.notify(&MonitorEvent::Started { info });

        Ok(())
    }

    /// Stop monitoring.
    ///
    /// No-op if already idle. Stops the scheduler (no tick fires after
    /// this returns), closes the capture session, and discards the
    /// partial buffer. In-flight classifications either keep running and
    /// deliver their results later (`drain`, the default) or are aborted
    /// (`cancel`).
    pub async fn stop(&self) -> Result<(), MonitorError> {
        let mut session = self.inner.transition.lock().await;

        if self.state().is_idle() {
            tracing::debug!("stop() while already idle; ignoring");
            return Ok(());
        }

        self.set_state(SessionState::Stopping);

        if let Some(handle) = session.scheduler.take() {
            let sealed = handle.stop().await;
            tracing::info!("Session produced {} chunk(s)", sealed);
        }

        let close_result = session.capture.close().await;

        if self.inner.config.stop_policy == StopPolicy::Cancel {
            self.inner.pipeline.cancel_in_flight();
        }

        let info = {
            let mut guard = self.inner.session_info.lock().unwrap();
            if let Some(ref mut info) = *guard {
                info.is_active = false;
            }
            guard.clone()
        };

        self.set_state(SessionState::Idle);
        tracing::info!("Monitoring stopped");

        if let Some(info) = info {
            self.inner.lifecycle.notify(&MonitorEvent::Stopped { info });
        }

        close_result.map_err(MonitorError::Teardown)
    }

    /// Wait for any still-running classifications to finish and deliver
    /// their events. Intended for graceful process shutdown after `stop`.
    pub async fn join_in_flight(&self) {
        self.inner.pipeline.join_in_flight().await;
    }
}

//! Tracking session: permission flow, stream lifecycle, and distance state.
//!
//! All mutable session state lives in one task. The [`Tracker`] handle sends
//! it commands over an unbounded channel, and provider callbacks push fixes
//! into the same channel, so commands and fixes are applied strictly in
//! arrival order by a single writer.
//!
//! Every fix stream is tagged with a generation number. Releasing a stream
//! retires its generation, and a fix that was already in flight when that
//! happened is dropped on arrival instead of touching the new session.

use crate::error::{TrackingError, TrackingResult};
use crate::motion::{MotionAggregator, DEFAULT_MOTION_INTERVAL};
use crate::notice::{Notice, NoticeSink};
use crate::persistence::PositionRecovery;
use crate::provider::{
    FixCallback, GeolocationProvider, MotionProvider, PermissionStatus, ProviderError,
    SubscriptionHandle, WatchConfig,
};
use crate::reducer::{FixOutcome, FixReducer};
use crate::types::{
    Coordinate, MotionSample, PermissionState, PersistedPosition, SessionId, SessionSnapshot,
    SessionState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, info_span, warn, Instrument};
use tracker_storage::KeyValueStore;

/// Tracker tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub watch: WatchConfig,
    pub motion_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            motion_interval: DEFAULT_MOTION_INTERVAL,
        }
    }
}

/// Everything the tracker talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub geolocation: Arc<dyn GeolocationProvider>,
    pub motion: Arc<dyn MotionProvider>,
    pub store: Arc<dyn KeyValueStore>,
    pub notices: Arc<dyn NoticeSink>,
}

enum SessionEvent {
    Start(oneshot::Sender<SessionState>),
    Retry(oneshot::Sender<SessionState>),
    Stop(oneshot::Sender<SessionState>),
    ClearSavedLocation(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<()>),
    Fix {
        generation: u64,
        result: Result<Coordinate, ProviderError>,
    },
}

/// Handle to a running tracker.
///
/// Dropping every handle stops the tracker task and releases its
/// subscriptions.
#[derive(Clone)]
pub struct Tracker {
    session_id: SessionId,
    events: mpsc::UnboundedSender<SessionEvent>,
    motion: watch::Receiver<Option<MotionSample>>,
}

impl Tracker {
    /// Spawn the tracker task in the `Idle` state.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: TrackerConfig, collaborators: Collaborators) -> Self {
        let session_id = SessionId::new();
        let (events, receiver) = mpsc::unbounded_channel();
        let motion = MotionAggregator::new(collaborators.motion, config.motion_interval);
        let motion_rx = motion.subscribe();

        let actor = SessionActor {
            session: TrackingSession::new(session_id),
            config,
            geolocation: collaborators.geolocation,
            motion,
            recovery: PositionRecovery::new(collaborators.store),
            notices: collaborators.notices,
            events: events.downgrade(),
            generations: 0,
        };

        let span = info_span!("tracker", session_id = %session_id);
        tokio::spawn(actor.run(receiver).instrument(span));

        Self {
            session_id,
            events,
            motion: motion_rx,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Begin tracking from `Idle`. In any other state this is a no-op that
    /// reports the current state.
    pub async fn start(&self) -> TrackingResult<SessionState> {
        self.request(SessionEvent::Start).await
    }

    /// Release everything, zero the distance, and run the permission flow
    /// again.
    pub async fn retry(&self) -> TrackingResult<SessionState> {
        self.request(SessionEvent::Retry).await
    }

    /// Release the fix stream and motion subscription and return to `Idle`.
    /// The accumulated distance is kept.
    pub async fn stop(&self) -> TrackingResult<SessionState> {
        self.request(SessionEvent::Stop).await
    }

    /// Delete the saved location. Returns whether the store confirmed it;
    /// either way the outcome is reported through the notice sink.
    pub async fn clear_saved_location(&self) -> TrackingResult<bool> {
        self.request(SessionEvent::ClearSavedLocation).await
    }

    pub async fn snapshot(&self) -> TrackingResult<SessionSnapshot> {
        self.request(SessionEvent::Snapshot).await
    }

    /// Latest motion sample feed.
    pub fn motion(&self) -> watch::Receiver<Option<MotionSample>> {
        self.motion.clone()
    }

    /// Stop tracking and end the task. Other handles become inert.
    pub async fn shutdown(self) -> TrackingResult<()> {
        self.request(SessionEvent::Shutdown).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionEvent,
    ) -> TrackingResult<T> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(make(reply))
            .map_err(|_| TrackingError::ActorGone)?;
        response.await.map_err(|_| TrackingError::ActorGone)
    }
}

struct ActiveStream {
    generation: u64,
    handle: Box<dyn SubscriptionHandle>,
}

/// Mutable state owned by the tracker task.
struct TrackingSession {
    id: SessionId,
    state: SessionState,
    permission: PermissionState,
    stream: Option<ActiveStream>,
    reducer: FixReducer,
    current_position: Option<Coordinate>,
    last_saved_location: Option<PersistedPosition>,
    loaded_from_storage: bool,
    fixes_accepted: u64,
    fixes_rejected: u64,
}

impl TrackingSession {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            permission: PermissionState::Pending,
            stream: None,
            reducer: FixReducer::new(),
            current_position: None,
            last_saved_location: None,
            loaded_from_storage: false,
            fixes_accepted: 0,
            fixes_rejected: 0,
        }
    }
}

struct SessionActor {
    session: TrackingSession,
    config: TrackerConfig,
    geolocation: Arc<dyn GeolocationProvider>,
    motion: MotionAggregator,
    recovery: PositionRecovery,
    notices: Arc<dyn NoticeSink>,
    /// Weak so that a live provider callback does not keep the task alive
    /// after the last handle is dropped.
    events: mpsc::WeakUnboundedSender<SessionEvent>,
    generations: u64,
}

impl SessionActor {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<SessionEvent>) {
        debug!("Tracker task started");

        while let Some(event) = receiver.recv().await {
            match event {
                SessionEvent::Start(reply) => {
                    if self.session.state == SessionState::Idle {
                        self.activate().await;
                    } else {
                        debug!(state = %self.session.state, "Start ignored");
                    }
                    let _ = reply.send(self.session.state);
                }
                SessionEvent::Retry(reply) => {
                    self.release_subscriptions();
                    self.session.reducer.reset();
                    self.session.fixes_accepted = 0;
                    self.session.fixes_rejected = 0;
                    info!("Retrying location tracking");
                    self.activate().await;
                    let _ = reply.send(self.session.state);
                }
                SessionEvent::Stop(reply) => {
                    self.release_subscriptions();
                    self.session.state = SessionState::Idle;
                    info!(
                        distance_meters = self.session.reducer.cumulative_distance_meters(),
                        "Tracking stopped"
                    );
                    let _ = reply.send(self.session.state);
                }
                SessionEvent::ClearSavedLocation(reply) => {
                    let cleared = self.clear_saved_location().await;
                    let _ = reply.send(cleared);
                }
                SessionEvent::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
                SessionEvent::Fix { generation, result } => {
                    self.handle_fix(generation, result);
                }
                SessionEvent::Shutdown(reply) => {
                    self.release_subscriptions();
                    self.session.state = SessionState::Idle;
                    let _ = reply.send(());
                    break;
                }
            }
        }

        self.release_subscriptions();
        debug!("Tracker task exited");
    }

    /// Permission, initial fix, saved position, stream, motion; in that order.
    async fn activate(&mut self) {
        self.session.state = SessionState::RequestingPermission;
        self.session.permission = PermissionState::Pending;

        match self.geolocation.request_permission().await {
            Ok(PermissionStatus::Granted) => {
                self.session.permission = PermissionState::Granted;
            }
            Ok(PermissionStatus::Denied) => {
                self.session.permission = PermissionState::Denied;
                self.fail_activation(TrackingError::PermissionDenied);
                return;
            }
            Err(e) => {
                self.fail_activation(e.into());
                return;
            }
        }

        match self.geolocation.current_fix().await {
            Ok(fix) if fix.is_valid() => self.session.current_position = Some(fix),
            Ok(fix) => {
                let error = TrackingError::InvalidFixData(format!(
                    "{}, {}",
                    fix.latitude, fix.longitude
                ));
                debug!(error = %error, "Ignoring initial fix");
            }
            Err(e) => {
                self.fail_activation(e.into());
                return;
            }
        }

        let saved = self.recovery.load_last_position().await;
        self.session.loaded_from_storage = saved.is_some();
        self.session.last_saved_location = saved;

        self.session.reducer.clear_baseline();

        self.generations += 1;
        let generation = self.generations;
        let handle = match self
            .geolocation
            .watch(self.config.watch, fix_callback(self.events.clone(), generation))
        {
            Ok(handle) => handle,
            Err(e) => {
                self.fail_activation(e.into());
                return;
            }
        };
        self.session.stream = Some(ActiveStream { generation, handle });

        if let Err(e) = self.motion.start() {
            warn!(error = %e, "Motion sampling unavailable");
            self.notices.emit(Notice::MotionUnavailable {
                reason: e.to_string(),
            });
        }

        self.session.state = SessionState::Active;
        info!(
            generation,
            loaded_from_storage = self.session.loaded_from_storage,
            "Tracking active"
        );
    }

    fn fail_activation(&mut self, error: TrackingError) {
        self.release_subscriptions();
        self.session.state = SessionState::Denied;
        warn!(error = %error, "Tracking could not start");
        if let Some(notice) = Notice::for_error(&error) {
            self.notices.emit(notice);
        }
    }

    fn release_subscriptions(&mut self) {
        if let Some(mut stream) = self.session.stream.take() {
            stream.handle.release();
            debug!(generation = stream.generation, "Fix stream released");
        }
        self.motion.stop();
    }

    fn handle_fix(&mut self, generation: u64, result: Result<Coordinate, ProviderError>) {
        let live = self.session.state == SessionState::Active
            && self
                .session
                .stream
                .as_ref()
                .is_some_and(|s| s.generation == generation);
        if !live {
            debug!(generation, "Dropping fix from a released stream");
            return;
        }

        let fix = match result {
            Ok(fix) => fix,
            Err(e) => {
                let error = TrackingError::from(e);
                warn!(error = %error, "Fix stream reported an error");
                if let Some(notice) = Notice::for_error(&error) {
                    self.notices.emit(notice);
                }
                return;
            }
        };

        match self.session.reducer.accept(fix) {
            FixOutcome::Baseline => {
                debug!(latitude = fix.latitude, longitude = fix.longitude, "Baseline fix");
            }
            FixOutcome::Accepted { delta_meters } => {
                debug!(
                    delta_meters,
                    distance_meters = self.session.reducer.cumulative_distance_meters(),
                    "Fix accepted"
                );
            }
            FixOutcome::Rejected(reason) => {
                self.session.fixes_rejected += 1;
                let error = TrackingError::InvalidFixData(reason.to_string());
                debug!(error = %error, "Fix rejected");
                return;
            }
        }

        self.session.fixes_accepted += 1;
        self.session.current_position = Some(fix);
        // Detached; the handle is not awaited.
        self.recovery.save_last_position(&fix);
    }

    async fn clear_saved_location(&mut self) -> bool {
        match self.recovery.clear_last_position().await {
            Ok(()) => {
                self.session.last_saved_location = None;
                self.session.loaded_from_storage = false;
                info!("Saved location cleared");
                self.notices.emit(Notice::SavedLocationCleared);
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear saved location");
                if let Some(notice) = Notice::for_error(&e) {
                    self.notices.emit(notice);
                }
                false
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let session = &self.session;
        SessionSnapshot {
            session_id: session.id,
            state: session.state,
            permission: session.permission,
            cumulative_distance_meters: session.reducer.cumulative_distance_meters(),
            last_accepted: session.reducer.previous().copied(),
            current_position: session.current_position,
            last_saved_location: session.last_saved_location,
            loaded_from_storage: session.loaded_from_storage,
            stream_open: session.stream.is_some(),
            motion_active: self.motion.is_running(),
            fixes_accepted: session.fixes_accepted,
            fixes_rejected: session.fixes_rejected,
        }
    }
}

fn fix_callback(events: mpsc::WeakUnboundedSender<SessionEvent>, generation: u64) -> FixCallback {
    Box::new(move |result| {
        if let Some(events) = events.upgrade() {
            let _ = events.send(SessionEvent::Fix { generation, result });
        }
    })
}

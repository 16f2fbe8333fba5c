//! Scripted providers and stores for scenario tests.

use crate::notice::RecordingSink;
use crate::provider::{
    FixCallback, GeolocationProvider, MotionProvider, PermissionStatus, ProviderError,
    SampleCallback, SubscriptionHandle, WatchConfig,
};
use crate::session::{Collaborators, Tracker, TrackerConfig};
use crate::types::{Coordinate, MotionSample};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracker_storage::{KeyValueStore, MemoryStore, StorageError, StorageKeys, StorageResult};

pub struct FlagHandle(Arc<AtomicBool>);

impl SubscriptionHandle for FlagHandle {
    fn release(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct FixSubscription {
    callback: FixCallback,
    released: Arc<AtomicBool>,
}

/// Geolocation provider driven by the test.
///
/// Permission answers are consumed in order and default to granted.
pub struct ScriptedGeolocation {
    permissions: Mutex<VecDeque<Result<PermissionStatus, ProviderError>>>,
    initial_fix: Mutex<Result<Coordinate, ProviderError>>,
    watch_error: Mutex<Option<ProviderError>>,
    subscriptions: Mutex<Vec<FixSubscription>>,
    watch_configs: Mutex<Vec<WatchConfig>>,
}

impl ScriptedGeolocation {
    pub fn new() -> Self {
        Self {
            permissions: Mutex::new(VecDeque::new()),
            initial_fix: Mutex::new(Ok(Coordinate::new(0.0, 0.0))),
            watch_error: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
            watch_configs: Mutex::new(Vec::new()),
        }
    }

    pub fn deny_next(&self) {
        self.permissions
            .lock()
            .unwrap()
            .push_back(Ok(PermissionStatus::Denied));
    }

    pub fn fail_next_permission(&self, error: ProviderError) {
        self.permissions.lock().unwrap().push_back(Err(error));
    }

    pub fn set_initial_fix(&self, fix: Result<Coordinate, ProviderError>) {
        *self.initial_fix.lock().unwrap() = fix;
    }

    pub fn fail_watch(&self, error: Option<ProviderError>) {
        *self.watch_error.lock().unwrap() = error;
    }

    /// Deliver a fix on the newest live subscription.
    pub fn emit(&self, latitude: f64, longitude: f64) {
        self.emit_result(Ok(Coordinate::new(latitude, longitude)));
    }

    pub fn emit_error(&self, error: ProviderError) {
        self.emit_result(Err(error));
    }

    fn emit_result(&self, result: Result<Coordinate, ProviderError>) {
        let subscriptions = self.subscriptions.lock().unwrap();
        let live = subscriptions
            .iter()
            .rev()
            .find(|s| !s.released.load(Ordering::SeqCst))
            .expect("no live fix subscription");
        (live.callback)(result);
    }

    /// Deliver a fix through a specific subscription, released or not, as
    /// a platform callback already in flight would.
    pub fn emit_to(&self, index: usize, latitude: f64, longitude: f64) {
        let subscriptions = self.subscriptions.lock().unwrap();
        (subscriptions[index].callback)(Ok(Coordinate::new(latitude, longitude)));
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.released.load(Ordering::SeqCst))
            .count()
    }

    pub fn is_released(&self, index: usize) -> bool {
        self.subscriptions.lock().unwrap()[index]
            .released
            .load(Ordering::SeqCst)
    }

    pub fn watch_configs(&self) -> Vec<WatchConfig> {
        self.watch_configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeolocationProvider for ScriptedGeolocation {
    async fn request_permission(&self) -> Result<PermissionStatus, ProviderError> {
        self.permissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(PermissionStatus::Granted))
    }

    async fn current_fix(&self) -> Result<Coordinate, ProviderError> {
        self.initial_fix.lock().unwrap().clone()
    }

    fn watch(
        &self,
        config: WatchConfig,
        on_fix: FixCallback,
    ) -> Result<Box<dyn SubscriptionHandle>, ProviderError> {
        if let Some(error) = self.watch_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.watch_configs.lock().unwrap().push(config);
        let released = Arc::new(AtomicBool::new(false));
        self.subscriptions.lock().unwrap().push(FixSubscription {
            callback: on_fix,
            released: released.clone(),
        });
        Ok(Box::new(FlagHandle(released)))
    }
}

struct SampleSubscription {
    callback: SampleCallback,
    released: Arc<AtomicBool>,
}

/// Motion provider driven by the test.
pub struct ManualMotion {
    interval: Mutex<Option<Duration>>,
    failure: Mutex<Option<ProviderError>>,
    subscriptions: Mutex<Vec<SampleSubscription>>,
}

impl ManualMotion {
    pub fn new() -> Self {
        Self {
            interval: Mutex::new(None),
            failure: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, error: ProviderError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn interval(&self) -> Option<Duration> {
        *self.interval.lock().unwrap()
    }

    pub fn push_to(&self, index: usize, sample: MotionSample) {
        let subscriptions = self.subscriptions.lock().unwrap();
        (subscriptions[index].callback)(sample);
    }

    pub fn live_subscriptions(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.released.load(Ordering::SeqCst))
            .count()
    }
}

impl MotionProvider for ManualMotion {
    fn set_sample_interval(&self, interval: Duration) {
        *self.interval.lock().unwrap() = Some(interval);
    }

    fn subscribe(
        &self,
        on_sample: SampleCallback,
    ) -> Result<Box<dyn SubscriptionHandle>, ProviderError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        let released = Arc::new(AtomicBool::new(false));
        self.subscriptions.lock().unwrap().push(SampleSubscription {
            callback: on_sample,
            released: released.clone(),
        });
        Ok(Box::new(FlagHandle(released)))
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Backend("injected read failure".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Backend("injected write failure".to_string()))
    }

    async fn remove(&self, _key: &str) -> StorageResult<bool> {
        Err(StorageError::Backend("injected remove failure".to_string()))
    }
}

/// A tracker wired to scripted collaborators.
pub struct Harness {
    pub tracker: Tracker,
    pub geo: Arc<ScriptedGeolocation>,
    pub motion: Arc<ManualMotion>,
    pub store: Arc<dyn KeyValueStore>,
    pub notices: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self::build(store, ScriptedGeolocation::new(), ManualMotion::new())
    }

    /// Build with providers scripted before the tracker exists.
    pub fn build(
        store: Arc<dyn KeyValueStore>,
        geo: ScriptedGeolocation,
        motion: ManualMotion,
    ) -> Self {
        let geo = Arc::new(geo);
        let motion = Arc::new(motion);
        let notices = Arc::new(RecordingSink::new());
        let tracker = Tracker::spawn(
            TrackerConfig::default(),
            Collaborators {
                geolocation: geo.clone(),
                motion: motion.clone(),
                store: store.clone(),
                notices: notices.clone(),
            },
        );
        Self {
            tracker,
            geo,
            motion,
            store,
            notices,
        }
    }
}

/// Poll `check` until it returns true or roughly a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

/// Wait for the detached write of the saved location to land.
pub async fn saved_location_becomes(store: &Arc<dyn KeyValueStore>, expected: Option<&str>) -> bool {
    for _ in 0..200 {
        if let Ok(value) = store.get(StorageKeys::LAST_LOCATION).await {
            if value.as_deref() == expected {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} +/- {tolerance}, got {actual}"
    );
}

//! Stand-in sensors for running the tracker off-device.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;
use tracking_core::{
    Coordinate, FixCallback, GeolocationProvider, MotionProvider, MotionSample,
    PermissionStatus, ProviderError, SampleCallback, SubscriptionHandle, WatchConfig,
    DEFAULT_MOTION_INTERVAL,
};

/// Subscription backed by a spawned task; releasing aborts it.
struct TaskHandle(JoinHandle<()>);

impl SubscriptionHandle for TaskHandle {
    fn release(&mut self) {
        self.0.abort();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Plays back a recorded list of fixes.
pub struct ReplayGeolocation {
    fixes: Arc<Vec<Coordinate>>,
    grant: bool,
    pace: Duration,
    finished: Arc<Notify>,
}

impl ReplayGeolocation {
    pub fn new(fixes: Vec<Coordinate>, grant: bool, pace: Duration) -> Self {
        Self {
            fixes: Arc::new(fixes),
            grant,
            pace,
            finished: Arc::new(Notify::new()),
        }
    }

    /// Resolves once a stream has delivered every fix.
    pub async fn finished(&self) {
        self.finished.notified().await;
    }
}

#[async_trait]
impl GeolocationProvider for ReplayGeolocation {
    async fn request_permission(&self) -> Result<PermissionStatus, ProviderError> {
        Ok(if self.grant {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    async fn current_fix(&self) -> Result<Coordinate, ProviderError> {
        self.fixes
            .first()
            .copied()
            .ok_or_else(|| ProviderError::Unavailable("fix file is empty".to_string()))
    }

    fn watch(
        &self,
        config: WatchConfig,
        on_fix: FixCallback,
    ) -> Result<Box<dyn SubscriptionHandle>, ProviderError> {
        debug!(
            accuracy = ?config.accuracy,
            fixes = self.fixes.len(),
            "Replaying fixes"
        );
        let fixes = self.fixes.clone();
        let pace = self.pace;
        let finished = self.finished.clone();

        let task = tokio::spawn(async move {
            for fix in fixes.iter() {
                on_fix(Ok(*fix));
                if pace.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(pace).await;
                }
            }
            finished.notify_one();
        });
        Ok(Box::new(TaskHandle(task)))
    }
}

/// Emits a resting-device reading (about 1 g on the z axis) with a little
/// deterministic wobble.
pub struct SimulatedMotion {
    interval: Mutex<Duration>,
}

impl SimulatedMotion {
    pub fn new() -> Self {
        Self {
            interval: Mutex::new(DEFAULT_MOTION_INTERVAL),
        }
    }
}

impl Default for SimulatedMotion {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionProvider for SimulatedMotion {
    fn set_sample_interval(&self, interval: Duration) {
        *self.interval.lock() = interval;
    }

    fn subscribe(
        &self,
        on_sample: SampleCallback,
    ) -> Result<Box<dyn SubscriptionHandle>, ProviderError> {
        let period = *self.interval.lock();
        if period.is_zero() {
            return Err(ProviderError::Unavailable(
                "sample interval must be positive".to_string(),
            ));
        }

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut step: u32 = 0;
            loop {
                ticker.tick().await;
                let phase = f64::from(step) * 0.3;
                on_sample(MotionSample::new(
                    0.01 * phase.sin(),
                    0.01 * phase.cos(),
                    1.0,
                ));
                step = step.wrapping_add(1);
            }
        });
        Ok(Box::new(TaskHandle(task)))
    }
}

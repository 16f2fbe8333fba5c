//! Latest-value accelerometer feed.
//!
//! Samples go into a single-slot `watch` channel: readers always see the most
//! recent reading and nothing is buffered. This path never touches the
//! session actor.

use crate::provider::{MotionProvider, ProviderError, SubscriptionHandle};
use crate::types::MotionSample;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

/// Default sampling period.
pub const DEFAULT_MOTION_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Error, Debug)]
pub enum MotionError {
    #[error("motion sampling already started")]
    AlreadyStarted,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Keeps the most recent motion sample.
pub struct MotionAggregator {
    provider: Arc<dyn MotionProvider>,
    interval: Duration,
    latest: Arc<watch::Sender<Option<MotionSample>>>,
    subscription: Option<Box<dyn SubscriptionHandle>>,
    /// Bumped on every start and stop; callbacks from an older subscription
    /// see a mismatch and drop their sample.
    generation: Arc<AtomicU64>,
}

impl MotionAggregator {
    pub fn new(provider: Arc<dyn MotionProvider>, interval: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            provider,
            interval,
            latest: Arc::new(latest),
            subscription: None,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Configure the sampling period and subscribe.
    pub fn start(&mut self) -> Result<(), MotionError> {
        if self.subscription.is_some() {
            return Err(MotionError::AlreadyStarted);
        }

        self.provider.set_sample_interval(self.interval);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.generation.clone();
        let latest = self.latest.clone();
        let handle = self.provider.subscribe(Box::new(move |sample| {
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            latest.send_replace(Some(sample));
        }))?;

        self.subscription = Some(handle);
        debug!(interval_ms = self.interval.as_millis() as u64, "Motion sampling started");
        Ok(())
    }

    /// Release the subscription. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.subscription.take() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            handle.release();
            debug!("Motion sampling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    /// Receiver that observes every replacement of the latest sample.
    pub fn subscribe(&self) -> watch::Receiver<Option<MotionSample>> {
        self.latest.subscribe()
    }
}

impl Drop for MotionAggregator {
    fn drop(&mut self) {
        self.stop();
    }
}

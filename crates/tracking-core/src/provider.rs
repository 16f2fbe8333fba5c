//! Contracts for platform geolocation and motion sources.
//!
//! Providers push readings through callbacks registered on subscription. The
//! returned [`SubscriptionHandle`] stops delivery when released; callers must
//! still tolerate a reading that was already in flight.

use crate::types::{Coordinate, MotionSample};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider timed out")]
    Timeout,

    #[error("provider failed: {0}")]
    Failed(String),
}

/// Answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Requested positioning accuracy, lowest to highest power cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    Lowest,
    Low,
    Balanced,
    #[default]
    High,
    Highest,
    BestForNavigation,
}

/// Options for a continuous fix stream. Debouncing is the provider's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchConfig {
    pub accuracy: AccuracyTier,
    /// Minimum time between delivered fixes.
    pub min_interval_ms: u64,
    /// Minimum movement between delivered fixes.
    pub min_displacement_meters: f64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            accuracy: AccuracyTier::High,
            min_interval_ms: 1_000,
            min_displacement_meters: 1.0,
        }
    }
}

/// Receives each streamed fix, or the error that replaced it.
pub type FixCallback = Box<dyn Fn(Result<Coordinate, ProviderError>) + Send + Sync>;

/// Receives each motion sample.
pub type SampleCallback = Box<dyn Fn(MotionSample) + Send + Sync>;

/// Live subscription to a provider.
pub trait SubscriptionHandle: Send {
    /// Stop delivery. Calling it again is a no-op.
    fn release(&mut self);
}

/// Source of location fixes.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Ask the user for foreground location access.
    async fn request_permission(&self) -> Result<PermissionStatus, ProviderError>;

    /// Acquire a single fix.
    async fn current_fix(&self) -> Result<Coordinate, ProviderError>;

    /// Open a continuous fix stream.
    fn watch(
        &self,
        config: WatchConfig,
        on_fix: FixCallback,
    ) -> Result<Box<dyn SubscriptionHandle>, ProviderError>;
}

/// Source of accelerometer samples.
pub trait MotionProvider: Send + Sync {
    fn set_sample_interval(&self, interval: Duration);

    fn subscribe(
        &self,
        on_sample: SampleCallback,
    ) -> Result<Box<dyn SubscriptionHandle>, ProviderError>;
}

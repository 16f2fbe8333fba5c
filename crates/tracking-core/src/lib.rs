//! Tracking core: turns a stream of geolocation fixes into a cumulative
//! travelled distance.
//!
//! # Components
//!
//! - [`geodesic`]: haversine distance between two fixes
//! - [`FixReducer`]: folds consecutive fixes into a running total
//! - [`Tracker`]: session state machine (permission, stream lifecycle, retry)
//! - [`PositionRecovery`]: durable last-known-position
//! - [`MotionAggregator`]: latest accelerometer sample
//!
//! Platform sensors sit behind [`GeolocationProvider`] and [`MotionProvider`];
//! user-facing failures are reported through a [`NoticeSink`].
//!
//! # Example
//!
//! ```ignore
//! let tracker = Tracker::spawn(TrackerConfig::default(), collaborators);
//! tracker.start().await?;
//! let snapshot = tracker.snapshot().await?;
//! println!("{:.1} m", snapshot.cumulative_distance_meters);
//! ```

pub mod error;
pub mod geodesic;
pub mod motion;
pub mod notice;
pub mod persistence;
pub mod provider;
pub mod reducer;
pub mod session;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{TrackingError, TrackingResult};
pub use geodesic::{distance, haversine_meters, EARTH_RADIUS_METERS};
pub use motion::{MotionAggregator, MotionError, DEFAULT_MOTION_INTERVAL};
pub use notice::{LogSink, Notice, NoticeSink, NullSink, RecordingSink};
pub use persistence::PositionRecovery;
pub use provider::{
    AccuracyTier, FixCallback, GeolocationProvider, MotionProvider, PermissionStatus,
    ProviderError, SampleCallback, SubscriptionHandle, WatchConfig,
};
pub use reducer::{FixOutcome, FixReducer, RejectReason};
pub use session::{Collaborators, Tracker, TrackerConfig};
pub use types::{
    Coordinate, MotionSample, PermissionState, PersistedPosition, SessionId, SessionSnapshot,
    SessionState,
};

//! Core types shared by the tracking components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one tracker instance, attached to every log line it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single geolocation fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Degrees, valid range [-90, 90].
    pub latitude: f64,
    /// Degrees, valid range [-180, 180].
    pub longitude: f64,
    /// Meters above the reference ellipsoid, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// When the fix was taken.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Coordinate {
    /// Creates a fix stamped with the current time.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::at(latitude, longitude, Utc::now())
    }

    /// Creates a fix with an explicit timestamp.
    pub fn at(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            timestamp,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// True when latitude and longitude are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        is_valid_lat_lon(self.latitude, self.longitude)
    }
}

pub(crate) fn is_valid_lat_lon(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Durable snapshot of the most recent accepted fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl PersistedPosition {
    pub fn is_valid(&self) -> bool {
        is_valid_lat_lon(self.latitude, self.longitude)
    }
}

impl From<&Coordinate> for PersistedPosition {
    fn from(coordinate: &Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }
}

/// Latest 3-axis accelerometer reading, in g.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub captured_at: DateTime<Utc>,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            captured_at: Utc::now(),
        }
    }

    /// Euclidean norm of the reading.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Outcome of the location permission prompt as tracked by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Not asked yet, or the last request failed before an answer.
    Pending,
    Granted,
    Denied,
}

/// Lifecycle state of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    RequestingPermission,
    Active,
    Denied,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::RequestingPermission => "requesting_permission",
            SessionState::Active => "active",
            SessionState::Denied => "denied",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only copy of a session's observable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub state: SessionState,
    pub permission: PermissionState,
    pub cumulative_distance_meters: f64,
    /// Reducer baseline: the last fix that contributed to the distance.
    pub last_accepted: Option<Coordinate>,
    /// Most recent known position, including the one-shot initial fix.
    pub current_position: Option<Coordinate>,
    /// Cached copy of the persisted position as read at activation.
    pub last_saved_location: Option<PersistedPosition>,
    pub loaded_from_storage: bool,
    pub stream_open: bool,
    pub motion_active: bool,
    pub fixes_accepted: u64,
    pub fixes_rejected: u64,
}

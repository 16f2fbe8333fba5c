//! Storage key constants.

/// Storage keys used by the tracker
pub struct StorageKeys;

impl StorageKeys {
    /// Last accepted position (JSON `{"latitude": .., "longitude": ..}`)
    pub const LAST_LOCATION: &'static str = "lastLocation";
}

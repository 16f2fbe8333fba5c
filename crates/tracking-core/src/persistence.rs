//! Durable last-known-position.
//!
//! One JSON record `{"latitude":..,"longitude":..}` under
//! [`StorageKeys::LAST_LOCATION`]. Writes are detached from the fix path:
//! a slow or failing store never delays accumulation.

use crate::error::{TrackingError, TrackingResult};
use crate::types::{Coordinate, PersistedPosition};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use tracker_storage::{KeyValueStore, StorageKeys};

/// Reads, writes, and clears the saved position.
#[derive(Clone)]
pub struct PositionRecovery {
    store: Arc<dyn KeyValueStore>,
}

impl PositionRecovery {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved position, or `None` when absent or unreadable.
    pub async fn load_last_position(&self) -> Option<PersistedPosition> {
        match self.try_load().await {
            Ok(position) => position,
            Err(e) => {
                warn!(error = %e, "Ignoring saved location");
                None
            }
        }
    }

    async fn try_load(&self) -> TrackingResult<Option<PersistedPosition>> {
        let Some(raw) = self.store.get(StorageKeys::LAST_LOCATION).await? else {
            debug!("No saved location");
            return Ok(None);
        };
        decode(&raw).map(Some)
    }

    /// Overwrite the saved position in the background.
    ///
    /// Must be called from within a tokio runtime. Failures are logged and
    /// otherwise dropped; the handle is only useful to tests that want to
    /// wait for the write.
    pub fn save_last_position(&self, coordinate: &Coordinate) -> JoinHandle<()> {
        let store = self.store.clone();
        let position = PersistedPosition::from(coordinate);

        tokio::spawn(async move {
            let encoded = match serde_json::to_string(&position) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(error = %e, "Failed to encode last location");
                    return;
                }
            };
            match store.set(StorageKeys::LAST_LOCATION, &encoded).await {
                Ok(()) => debug!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "Saved last location"
                ),
                Err(e) => {
                    warn!(error = %TrackingError::PersistenceFailure(e), "Failed to save last location")
                }
            }
        })
    }

    /// Remove the saved position. Removing an absent record succeeds.
    pub async fn clear_last_position(&self) -> TrackingResult<()> {
        let existed = self.store.remove(StorageKeys::LAST_LOCATION).await?;
        debug!(existed, "Cleared saved location");
        Ok(())
    }
}

fn decode(raw: &str) -> TrackingResult<PersistedPosition> {
    let position: PersistedPosition = serde_json::from_str(raw)
        .map_err(|e| TrackingError::StorageParseFailure(e.to_string()))?;
    if !position.is_valid() {
        return Err(TrackingError::StorageParseFailure(format!(
            "coordinates out of range: {}, {}",
            position.latitude, position.longitude
        )));
    }
    Ok(position)
}

//! Error types for the tracking core.

use crate::provider::ProviderError;
use thiserror::Error;
use tracker_storage::StorageError;

/// Errors raised while tracking.
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("fix acquisition failed: {0}")]
    FixAcquisitionFailed(#[from] ProviderError),

    #[error("invalid fix data: {0}")]
    InvalidFixData(String),

    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] StorageError),

    #[error("saved location unreadable: {0}")]
    StorageParseFailure(String),

    #[error("tracker task is not running")]
    ActorGone,
}

/// Result type for tracking operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

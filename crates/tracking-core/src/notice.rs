//! User-facing notices emitted by the tracker.
//!
//! Failures never cross into the presentation layer as raw errors. The tracker
//! turns them into [`Notice`] values and hands them to a [`NoticeSink`], which
//! decides how to show them.

use crate::error::TrackingError;
use tracing::{info, warn};

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Location access was refused.
    PermissionDenied,
    /// A fix could not be obtained.
    FixAcquisitionFailed { reason: String },
    /// The saved location could not be written or cleared.
    PersistenceFailed { reason: String },
    /// The saved location was removed on request.
    SavedLocationCleared,
    /// The accelerometer could not be started; distance tracking continues.
    MotionUnavailable { reason: String },
}

impl Notice {
    /// Notice for an error, if it is one the user should see.
    pub fn for_error(error: &TrackingError) -> Option<Self> {
        match error {
            TrackingError::PermissionDenied => Some(Notice::PermissionDenied),
            TrackingError::FixAcquisitionFailed(e) => Some(Notice::FixAcquisitionFailed {
                reason: e.to_string(),
            }),
            TrackingError::PersistenceFailure(e) => Some(Notice::PersistenceFailed {
                reason: e.to_string(),
            }),
            TrackingError::InvalidFixData(_)
            | TrackingError::StorageParseFailure(_)
            | TrackingError::ActorGone => None,
        }
    }

    /// Short human-readable text.
    pub fn message(&self) -> String {
        match self {
            Notice::PermissionDenied => {
                "Location permission denied. Grant access and retry.".to_string()
            }
            Notice::FixAcquisitionFailed { reason } => {
                format!("Could not get your location: {reason}")
            }
            Notice::PersistenceFailed { reason } => {
                format!("Could not update the saved location: {reason}")
            }
            Notice::SavedLocationCleared => "Saved location cleared.".to_string(),
            Notice::MotionUnavailable { reason } => {
                format!("Motion sensor unavailable: {reason}")
            }
        }
    }

    fn is_failure(&self) -> bool {
        !matches!(self, Notice::SavedLocationCleared)
    }
}

/// Receives notices from the tracker.
pub trait NoticeSink: Send + Sync {
    fn emit(&self, notice: Notice);
}

/// Discards every notice.
#[derive(Debug, Default)]
pub struct NullSink;

impl NoticeSink for NullSink {
    fn emit(&self, _notice: Notice) {}
}

/// Writes notices to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl NoticeSink for LogSink {
    fn emit(&self, notice: Notice) {
        if notice.is_failure() {
            warn!(notice = ?notice, "{}", notice.message());
        } else {
            info!(notice = ?notice, "{}", notice.message());
        }
    }
}

/// Records notices for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: std::sync::Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded notices.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("lock poisoned").clone()
    }

    pub fn clear(&self) {
        self.notices.lock().expect("lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.notices.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticeSink for RecordingSink {
    fn emit(&self, notice: Notice) {
        self.notices.lock().expect("lock poisoned").push(notice);
    }
}

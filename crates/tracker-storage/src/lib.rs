//! Durable key-value storage for the distance tracker.
//!
//! - [`MemoryStore`]: process-local map, used by tests and ephemeral runs
//! - [`FileStore`]: JSON map on disk, replaced atomically on every write

mod file;
mod keys;
mod memory;
mod traits;

pub use file::FileStore;
pub use keys::StorageKeys;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure (e.g. an injected fault or unavailable medium)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error of the backing file
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

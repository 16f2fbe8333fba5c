//! Storage trait definitions.

use crate::StorageResult;
use async_trait::async_trait;

/// Durable string key-value store.
///
/// Each operation completes or fails as a unit; implementations never leave a
/// partially written value behind.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value. Returns true if the key existed.
    async fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    async fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

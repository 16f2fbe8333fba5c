//! In-memory store.

use crate::{KeyValueStore, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory key-value store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.lock().expect("lock poisoned").len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().expect("lock poisoned");
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock().expect("lock poisoned");
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.data.lock().expect("lock poisoned");
        Ok(data.remove(key).is_some())
    }
}

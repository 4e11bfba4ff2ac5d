//! In-memory store for testing and throwaway sessions.

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory key-value store.
///
/// This store keeps all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Unauthenticated sessions that do not need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use savelink_store::{KvStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("acct1.Stats", "[]").unwrap();
/// assert!(store.contains("acct1.Stats"));
/// store.delete("acct1.Stats").unwrap();
/// assert_eq!(store.get("acct1.Stats").unwrap(), "");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects values once the total stored
    /// bytes would exceed `capacity`.
    ///
    /// Useful for testing storage-full handling.
    #[must_use]
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    /// Returns the number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Clears all data from the store.
    pub fn clear(&self) {
        self.data.write().clear();
    }

    fn stored_bytes(data: &HashMap<String, String>) -> usize {
        data.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<String> {
        Ok(self.data.read().get(key).cloned().unwrap_or_default())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.write();

        if let Some(capacity) = self.capacity {
            let existing = data.get(key).map(|v| v.len() + key.len()).unwrap_or(0);
            let after = Self::stored_bytes(&data) - existing + key.len() + value.len();
            if after > capacity {
                return Err(StoreError::StorageFull {
                    key: key.to_string(),
                    len: value.len(),
                });
            }
        }

        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.data.write().remove(key);
        Ok(())
    }
}

//! Key-value store trait definition.

use crate::error::StoreResult;

/// A local key-value store for serialized blobs.
///
/// Stores hold string values under string keys. They are the local
/// half of the dual-path persistence protocol: every record domain
/// falls back to a `KvStore` when no server session is available.
///
/// # Invariants
///
/// - `get` of an absent key returns an empty string, not an error
/// - `set` persists immediately; after it returns, a `get` observes
///   the new value even after a process restart (for durable stores)
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KvStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns an empty string if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> StoreResult<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::StorageFull`] if the store has no
    /// room for the value. This is fatal for the operation and must
    /// not be retried by the caller.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes the value stored under `key`, if any.
    ///
    /// Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Returns true if `key` holds a non-empty value.
    fn contains(&self, key: &str) -> bool {
        self.get(key).map(|v| !v.is_empty()).unwrap_or(false)
    }
}

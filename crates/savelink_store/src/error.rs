//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store has no room for the value.
    ///
    /// Fatal for the current operation; callers must not retry it.
    #[error("storage full: cannot store {len} bytes under {key:?}")]
    StorageFull {
        /// The key being written.
        key: String,
        /// The size of the rejected value.
        len: usize,
    },

    /// The backing file is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

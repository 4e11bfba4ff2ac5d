//! # Savelink Store
//!
//! Local key-value cache for savelink.
//!
//! This crate provides the lowest-level persistence abstraction for
//! savelink. Stores are **opaque string stores** - they hold serialized
//! blobs under string keys and do not interpret them.
//!
//! ## Design Principles
//!
//! - Stores are simple string key-value maps (get, set, delete)
//! - No knowledge of record domains, payload formats, or sync keys
//! - Must be `Send + Sync` for concurrent access
//! - The sync layer owns all key layout interpretation
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and unauthenticated throwaway sessions
//! - [`FileStore`] - For persistent storage that survives process restarts
//!
//! ## Example
//!
//! ```rust
//! use savelink_store::{KvStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set("acct1.UI", "[]").unwrap();
//! assert_eq!(store.get("acct1.UI").unwrap(), "[]");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
pub mod keyring;
mod kv;
mod memory;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use kv::KvStore;
pub use memory::MemoryStore;

//! Saved-keys registry helpers.
//!
//! Several record domains track which sync keys have ever been saved
//! locally so that deleting a character can cascade cleanup across
//! domains. Registries are semicolon-joined string lists stored under
//! a well-known key, e.g. `InventorySystemSavedKeys`.

use crate::error::StoreResult;
use crate::kv::KvStore;

/// Registry key for sync keys saved by the inventory domain.
pub const INVENTORY_SAVED_KEYS: &str = "InventorySystemSavedKeys";
/// Registry key for sync keys saved by the quest domain.
pub const QUEST_SAVED_KEYS: &str = "QuestSystemSavedKeys";
/// Registry key for sync keys saved by the stats domain.
pub const STATS_SAVED_KEYS: &str = "StatSystemSavedKeys";

/// Returns the entries of the registry stored under `registry`.
///
/// Empty segments are dropped, so a missing registry yields an empty
/// list rather than a single empty entry.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list(store: &dyn KvStore, registry: &str) -> StoreResult<Vec<String>> {
    let raw = store.get(registry)?;
    Ok(raw
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// Adds `entry` to the registry if it is not already present.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn add(store: &dyn KvStore, registry: &str, entry: &str) -> StoreResult<()> {
    if entry.is_empty() {
        return Ok(());
    }
    let mut entries = list(store, registry)?;
    if entries.iter().any(|e| e == entry) {
        return Ok(());
    }
    entries.push(entry.to_string());
    store.set(registry, &entries.join(";"))
}

/// Removes `entry` from the registry, if present.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn remove(store: &dyn KvStore, registry: &str, entry: &str) -> StoreResult<()> {
    let entries = list(store, registry)?;
    let remaining: Vec<String> = entries.into_iter().filter(|e| e != entry).collect();
    store.set(registry, &remaining.join(";"))
}

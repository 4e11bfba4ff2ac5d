//! Generic dual-path save/load engine.
//!
//! One engine drives every record domain: the domain supplies its
//! endpoint layout, local key scheme, and live-state reconciliation,
//! and [`DomainSync`] supplies the path choice, the auth-retry
//! protocol, and the local fallback. This is the deduplicated core
//! that each domain manager used to repeat.

use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use crate::events::{DomainKind, SyncEvent};
use savelink_store::{keyring, KvStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// One record domain's contribution to the sync engine.
///
/// Implementors own the domain's live entity state. `apply_*`
/// reconciles loaded records against that state by name, updating
/// entities in place rather than always constructing new ones.
pub trait RecordDomain: Send + Sync {
    /// Domain kind, for events and logging.
    fn kind(&self) -> DomainKind;

    /// Saved-keys registry this domain records sync keys in, if any.
    fn registry(&self) -> Option<&'static str>;

    /// `POST` endpoint for saves.
    fn save_endpoint(&self) -> &'static str;

    /// `GET` path for loading `sync_key`'s data.
    fn load_path(&self, sync_key: &str) -> String;

    /// Serializes live state into the save body for `sync_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if live state fails to serialize.
    fn collect(&self, sync_key: &str) -> SyncResult<String>;

    /// Writes live state into the local store under the domain's
    /// suffixed key scheme.
    ///
    /// # Errors
    ///
    /// Surfaces store failures; `StorageFull` is fatal for the save.
    fn write_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()>;

    /// Reads the domain's local blobs for `sync_key` and reconciles
    /// them into live state. Absent blobs are empty results.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored blob is malformed.
    fn load_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()>;

    /// Parses a server load response body and reconciles it into
    /// live state.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed; the engine then
    /// falls back to the local path.
    fn apply_remote(&self, body: &str) -> SyncResult<()>;
}

/// Dual-path save/load engine for one record domain.
pub struct DomainSync<D: RecordDomain> {
    domain: D,
    ctx: Arc<SyncContext>,
}

impl<D: RecordDomain> DomainSync<D> {
    /// Creates the engine for a domain.
    pub fn new(domain: D, ctx: Arc<SyncContext>) -> Self {
        Self { domain, ctx }
    }

    /// Accesses the domain's live state.
    pub fn domain(&self) -> &D {
        &self.domain
    }

    /// Saves the domain's live state under `sync_key`.
    ///
    /// With a token present, the payload is submitted to the server
    /// through the auth-retry coordinator; any failure after the
    /// retry degrades to a local write. Without a token, the local
    /// write happens directly. Local saves register `sync_key` in the
    /// domain's saved-keys registry. Emits
    /// [`SyncEvent::DataSaved`] on every successful completion.
    ///
    /// # Errors
    ///
    /// Only local store failures surface; `StorageFull` in
    /// particular is fatal for this save and is not retried.
    pub fn save(&self, sync_key: &str) -> SyncResult<()> {
        let kind = self.domain.kind();

        if self.ctx.use_remote() {
            let body = self.domain.collect(sync_key)?;
            let endpoint = self.domain.save_endpoint();
            let outcome = self
                .ctx
                .coordinator
                .execute(|| self.ctx.remote.post(endpoint, body.clone()));

            match outcome {
                Ok(_) => {
                    debug!(domain = kind.as_str(), sync_key, "saved to server");
                    self.ctx.events.emit(&SyncEvent::DataSaved(kind));
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        domain = kind.as_str(),
                        sync_key,
                        error = %e,
                        "server save failed, falling back to local storage"
                    );
                }
            }
        }

        self.save_local(sync_key)?;
        self.ctx.events.emit(&SyncEvent::DataSaved(kind));
        Ok(())
    }

    /// Loads `sync_key`'s data into the domain's live state.
    ///
    /// With a token present, data is requested from the server
    /// through the auth-retry coordinator. A 404 is "no data yet":
    /// the result is empty and not an error. Any other failure, a
    /// malformed body, or a missing token reads the local store
    /// instead. Emits [`SyncEvent::DataLoaded`] on completion, even
    /// for empty results, so dependent systems can proceed.
    ///
    /// # Errors
    ///
    /// Only local store failures surface.
    pub fn load(&self, sync_key: &str) -> SyncResult<()> {
        let kind = self.domain.kind();

        if self.ctx.use_remote() {
            let path = self.domain.load_path(sync_key);
            match self.ctx.coordinator.execute(|| self.ctx.remote.get(&path)) {
                Ok(body) => match self.domain.apply_remote(&body) {
                    Ok(()) => {
                        debug!(domain = kind.as_str(), sync_key, "loaded from server");
                        self.ctx.events.emit(&SyncEvent::DataLoaded(kind));
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(
                            domain = kind.as_str(),
                            sync_key,
                            error = %e,
                            "malformed server response, falling back to local storage"
                        );
                    }
                },
                Err(SyncError::NotFound) => {
                    debug!(domain = kind.as_str(), sync_key, "no data on server yet");
                    self.ctx.events.emit(&SyncEvent::DataLoaded(kind));
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        domain = kind.as_str(),
                        sync_key,
                        error = %e,
                        "server load failed, falling back to local storage"
                    );
                }
            }
        }

        if let Err(e) = self.domain.load_local(self.ctx.store.as_ref(), sync_key) {
            match e {
                SyncError::Parse(ref message) => {
                    // A corrupt cached blob must not block the session.
                    warn!(
                        domain = kind.as_str(),
                        sync_key, message, "discarding malformed local blob"
                    );
                }
                other => return Err(other),
            }
        }
        self.ctx.events.emit(&SyncEvent::DataLoaded(kind));
        Ok(())
    }

    fn save_local(&self, sync_key: &str) -> SyncResult<()> {
        self.domain.write_local(self.ctx.store.as_ref(), sync_key)?;
        if let Some(registry) = self.domain.registry() {
            keyring::add(self.ctx.store.as_ref(), registry, sync_key)?;
        }
        debug!(
            domain = self.domain.kind().as_str(),
            sync_key, "saved to local storage"
        );
        Ok(())
    }
}

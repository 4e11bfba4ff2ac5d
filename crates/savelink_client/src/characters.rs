//! Character roster sync.
//!
//! Characters are the root records: each character's name is the sync
//! key for its inventory, quest, and stats data. The local blob lives
//! under the bare sync key; deleting a character therefore cascades
//! over the dependent suffixed keys, whichever path served the data.

use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use crate::events::{DomainKind, SyncEvent};
use parking_lot::RwLock;
use savelink_protocol::{decode_records, encode_records, endpoints, CharacterRecord};
use savelink_store::keyring;
use std::sync::Arc;
use tracing::{debug, warn};

/// Character roster manager.
pub struct CharacterSync {
    ctx: Arc<SyncContext>,
    roster: RwLock<Vec<CharacterRecord>>,
}

impl CharacterSync {
    /// Creates a roster manager with an empty roster.
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self {
            ctx,
            roster: RwLock::new(Vec::new()),
        }
    }

    /// Returns a copy of the loaded roster.
    #[must_use]
    pub fn roster(&self) -> Vec<CharacterRecord> {
        self.roster.read().clone()
    }

    /// Loads the account's characters into the roster.
    ///
    /// With a token present, the list is requested from the server
    /// through the auth-retry coordinator; a 404 means no characters
    /// yet. Any other failure or a malformed body reads the local
    /// blob under `sync_key` instead. Emits
    /// [`SyncEvent::DataLoaded`] on completion.
    ///
    /// # Errors
    ///
    /// Only local store failures surface.
    pub fn load(&self, sync_key: &str) -> SyncResult<()> {
        if self.ctx.use_remote() {
            let outcome = self
                .ctx
                .coordinator
                .execute(|| self.ctx.remote.get(endpoints::CHARACTERS));

            match outcome {
                Ok(body) => match decode_records::<CharacterRecord>(&body) {
                    Ok(records) => {
                        Self::reconcile(&mut self.roster.write(), records);
                        debug!(sync_key, "characters loaded from server");
                        self.ctx
                            .events
                            .emit(&SyncEvent::DataLoaded(DomainKind::Characters));
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(sync_key, error = %e, "malformed character list, falling back to local storage");
                    }
                },
                Err(SyncError::NotFound) => {
                    debug!(sync_key, "no characters on server yet");
                    self.ctx
                        .events
                        .emit(&SyncEvent::DataLoaded(DomainKind::Characters));
                    return Ok(());
                }
                Err(e) => {
                    warn!(sync_key, error = %e, "character load failed, falling back to local storage");
                }
            }
        }

        match self.read_local(sync_key) {
            Ok(records) => Self::reconcile(&mut self.roster.write(), records),
            Err(SyncError::Parse(message)) => {
                warn!(sync_key, message, "discarding malformed local character blob");
            }
            Err(other) => return Err(other),
        }
        self.ctx
            .events
            .emit(&SyncEvent::DataLoaded(DomainKind::Characters));
        Ok(())
    }

    /// Creates a character.
    ///
    /// A duplicate `character_name` in the roster or the local blob is
    /// rejected before any write. With a token present, the record is
    /// submitted to the server through the auth-retry coordinator and
    /// a rejection aborts the create; without one, the record is
    /// appended to the local blob. Emits
    /// [`SyncEvent::CharacterCreated`] on success and
    /// [`SyncEvent::CreateFailed`] on every failure.
    ///
    /// # Errors
    ///
    /// - duplicate name → [`SyncError::DuplicateName`]
    /// - remote mode without a token → [`SyncError::MissingToken`]
    /// - server rejection or store failure, as mapped.
    pub fn create(&self, sync_key: &str, record: CharacterRecord) -> SyncResult<()> {
        let name = record.character_name.clone();

        let mut existing = self.read_local(sync_key).unwrap_or_default();
        let taken = existing.iter().any(|c| c.character_name == name)
            || self.roster.read().iter().any(|c| c.character_name == name);
        if taken {
            warn!(character = %name, "character name already taken");
            self.ctx.events.emit(&SyncEvent::CreateFailed(name.clone()));
            return Err(SyncError::DuplicateName(name));
        }

        if self.ctx.server_mode() {
            if !self.ctx.tokens.has_token() {
                warn!(character = %name, "cannot create on server without an access token");
                self.ctx.events.emit(&SyncEvent::CreateFailed(name));
                return Err(SyncError::MissingToken);
            }

            let body = serde_json::to_string(&record)?;
            let outcome = self
                .ctx
                .coordinator
                .execute(|| self.ctx.remote.post(endpoints::CHARACTERS, body.clone()));

            return match outcome {
                Ok(_) => {
                    self.roster.write().push(record);
                    debug!(character = %name, "character created on server");
                    self.ctx.events.emit(&SyncEvent::CharacterCreated(name));
                    Ok(())
                }
                Err(e) => {
                    warn!(character = %name, error = %e, "server rejected character create");
                    self.ctx.events.emit(&SyncEvent::CreateFailed(name));
                    Err(e)
                }
            };
        }

        existing.push(record.clone());
        self.write_local(sync_key, &existing)?;
        self.roster.write().push(record);
        debug!(character = %name, "character created locally");
        self.ctx.events.emit(&SyncEvent::CharacterCreated(name));
        Ok(())
    }

    /// Deletes a character and all of its dependent local keys.
    ///
    /// With a token present, the server delete runs first through the
    /// auth-retry coordinator and a rejection aborts the delete. The
    /// local cascade always runs afterwards: the character's inventory
    /// keys (`{name}.UI`, every scene listed in `{name}.Scenes`, the
    /// scene list itself), its stats key, and its registry entries are
    /// removed even when the server held the authoritative copy.
    /// Emits [`SyncEvent::CharacterDeleted`] on success.
    ///
    /// # Errors
    ///
    /// Server rejection or local store failure.
    pub fn delete(&self, sync_key: &str, name: &str) -> SyncResult<()> {
        if self.ctx.use_remote() {
            let path = endpoints::character(name);
            self.ctx
                .coordinator
                .execute(|| self.ctx.remote.delete(&path))?;
        }

        let mut existing = self.read_local(sync_key).unwrap_or_default();
        existing.retain(|c| c.character_name != name);
        self.write_local(sync_key, &existing)?;
        self.roster.write().retain(|c| c.character_name != name);

        self.cascade_local_cleanup(name)?;
        debug!(character = name, "character deleted");
        self.ctx
            .events
            .emit(&SyncEvent::CharacterDeleted(name.to_string()));
        Ok(())
    }

    fn cascade_local_cleanup(&self, name: &str) -> SyncResult<()> {
        let store = self.ctx.store.as_ref();

        store.delete(&format!("{name}.UI"))?;
        let scenes_key = format!("{name}.Scenes");
        for scene in keyring::list(store, &scenes_key)? {
            store.delete(&format!("{name}.{scene}"))?;
        }
        store.delete(&scenes_key)?;
        store.delete(&format!("{name}.Stats"))?;

        keyring::remove(store, keyring::INVENTORY_SAVED_KEYS, name)?;
        keyring::remove(store, keyring::STATS_SAVED_KEYS, name)?;
        Ok(())
    }

    fn read_local(&self, sync_key: &str) -> SyncResult<Vec<CharacterRecord>> {
        let blob = self.ctx.store.get(sync_key)?;
        Ok(decode_records(&blob)?)
    }

    fn write_local(&self, sync_key: &str, records: &[CharacterRecord]) -> SyncResult<()> {
        let blob = encode_records(records)?;
        self.ctx.store.set(sync_key, &blob)?;
        Ok(())
    }

    fn reconcile(live: &mut Vec<CharacterRecord>, incoming: Vec<CharacterRecord>) {
        for record in incoming {
            match live
                .iter_mut()
                .find(|c| c.character_name == record.character_name)
            {
                Some(existing) => *existing = record,
                None => live.push(record),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ACCESS_TOKEN_KEY;
    use crate::config::ClientConfig;
    use crate::events::EventLog;
    use crate::http::{HttpResponse, MockHttpClient};
    use savelink_store::{KvStore, MemoryStore};

    fn setup() -> (CharacterSync, Arc<MemoryStore>, Arc<MockHttpClient>, EventLog) {
        let store = Arc::new(MemoryStore::new());
        let http = Arc::new(MockHttpClient::new());
        let ctx = SyncContext::new(&ClientConfig::default(), http.clone(), store.clone());
        let log = EventLog::new();
        log.attach(&ctx.events);
        (CharacterSync::new(ctx), store, http, log)
    }

    fn knight() -> CharacterRecord {
        CharacterRecord::new("Aldric", "Knight", "MainScene")
    }

    #[test]
    fn local_create_persists_and_emits() {
        let (characters, store, _, log) = setup();
        characters.create("acct1", knight()).unwrap();

        assert_eq!(characters.roster()[0].character_name, "Aldric");
        let stored: Vec<CharacterRecord> =
            serde_json::from_str(&store.get("acct1").unwrap()).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(log.contains(&SyncEvent::CharacterCreated("Aldric".into())));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let (characters, _, _, log) = setup();
        characters.create("acct1", knight()).unwrap();

        let result = characters.create("acct1", knight());
        assert!(matches!(result, Err(SyncError::DuplicateName(_))));
        assert_eq!(characters.roster().len(), 1);
        assert!(log.contains(&SyncEvent::CreateFailed("Aldric".into())));
    }

    #[test]
    fn server_mode_without_token_fails_create() {
        let (characters, _, _, log) = setup();
        characters.ctx.enable_server_mode();

        let result = characters.create("acct1", knight());
        assert!(matches!(result, Err(SyncError::MissingToken)));
        assert!(characters.roster().is_empty());
        assert!(log.contains(&SyncEvent::CreateFailed("Aldric".into())));
    }

    #[test]
    fn remote_create_posts_record() {
        let (characters, store, http, log) = setup();
        store.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        characters.ctx.enable_server_mode();
        http.enqueue(HttpResponse::ok(""));

        characters.create("acct1", knight()).unwrap();

        let request = &http.requests()[0];
        assert!(request.url.ends_with("/characters"));
        assert!(request.body.as_deref().unwrap().contains("Aldric"));
        assert!(log.contains(&SyncEvent::CharacterCreated("Aldric".into())));
    }

    #[test]
    fn remote_rejection_aborts_create() {
        let (characters, store, http, log) = setup();
        store.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        characters.ctx.enable_server_mode();
        http.enqueue(HttpResponse::with_status(409, "name taken"));

        let result = characters.create("acct1", knight());
        assert!(matches!(
            result,
            Err(SyncError::ServerRejected { status: 409, .. })
        ));
        assert!(characters.roster().is_empty());
        assert!(log.contains(&SyncEvent::CreateFailed("Aldric".into())));
    }

    #[test]
    fn remote_load_404_is_empty_roster() {
        let (characters, store, http, log) = setup();
        store.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        characters.ctx.enable_server_mode();
        http.enqueue(HttpResponse::with_status(404, ""));

        characters.load("acct1").unwrap();
        assert!(characters.roster().is_empty());
        assert!(log.contains(&SyncEvent::DataLoaded(DomainKind::Characters)));
    }

    #[test]
    fn load_falls_back_to_local_blob() {
        let (characters, store, _, _) = setup();
        let blob = encode_records(&[knight()]).unwrap();
        store.set("acct1", &blob).unwrap();

        characters.load("acct1").unwrap();
        assert_eq!(characters.roster()[0].profession, "Knight");
    }

    #[test]
    fn delete_cascades_over_dependent_keys() {
        let (characters, store, _, log) = setup();
        characters.create("acct1", knight()).unwrap();

        store.set("Aldric.UI", "[]").unwrap();
        store.set("Aldric.MainScene", "[]").unwrap();
        keyring::add(store.as_ref(), "Aldric.Scenes", "MainScene").unwrap();
        store.set("Aldric.Stats", "[]").unwrap();
        keyring::add(store.as_ref(), keyring::INVENTORY_SAVED_KEYS, "Aldric").unwrap();
        keyring::add(store.as_ref(), keyring::STATS_SAVED_KEYS, "Aldric").unwrap();

        characters.delete("acct1", "Aldric").unwrap();

        assert!(characters.roster().is_empty());
        assert!(!store.contains("Aldric.UI"));
        assert!(!store.contains("Aldric.MainScene"));
        assert!(!store.contains("Aldric.Scenes"));
        assert!(!store.contains("Aldric.Stats"));
        assert!(keyring::list(store.as_ref(), keyring::INVENTORY_SAVED_KEYS)
            .unwrap()
            .is_empty());
        assert!(keyring::list(store.as_ref(), keyring::STATS_SAVED_KEYS)
            .unwrap()
            .is_empty());
        assert!(log.contains(&SyncEvent::CharacterDeleted("Aldric".into())));
    }
}

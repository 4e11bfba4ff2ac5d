//! Stats record domain.
//!
//! Live state is a set of stats handlers, each owning named stats.
//! Regenerating attributes additionally carry a current value. Local
//! key: `{syncKey}.Stats`. The save payload also carries two
//! flattened maps (`Handler.Stat` → value and
//! `Handler.Stat.CurrentValue` → value) for servers that index stats
//! without parsing the handler blob.

use crate::domain::RecordDomain;
use crate::error::SyncResult;
use crate::events::DomainKind;
use parking_lot::RwLock;
use savelink_protocol::{
    decode_records, encode_records, endpoints, StatRecord, StatsHandlerRecord, StatsPayload,
};
use savelink_store::{keyring, KvStore};
use std::collections::BTreeMap;

/// Stats domain manager state.
#[derive(Default)]
pub struct StatsDomain {
    handlers: RwLock<Vec<StatsHandlerRecord>>,
}

impl StatsDomain {
    /// Creates a domain with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. A handler already present under the same
    /// name is replaced.
    pub fn register_handler(&self, handler: StatsHandlerRecord) {
        let mut handlers = self.handlers.write();
        match handlers.iter_mut().find(|h| h.name == handler.name) {
            Some(existing) => *existing = handler,
            None => handlers.push(handler),
        }
    }

    /// Sets a stat's base value, creating the stat if absent.
    pub fn set_stat(&self, handler: &str, stat: &str, value: f32) {
        let mut handlers = self.handlers.write();
        if let Some(handler) = handlers.iter_mut().find(|h| h.name == handler) {
            match handler.stats.iter_mut().find(|s| s.name == stat) {
                Some(existing) => existing.value = value,
                None => handler.stats.push(StatRecord {
                    name: stat.to_string(),
                    value,
                    current_value: None,
                }),
            }
        }
    }

    /// Sets an attribute's current value.
    pub fn set_attribute_current(&self, handler: &str, stat: &str, current: f32) {
        let mut handlers = self.handlers.write();
        if let Some(handler) = handlers.iter_mut().find(|h| h.name == handler) {
            if let Some(stat) = handler.stats.iter_mut().find(|s| s.name == stat) {
                stat.current_value = Some(current);
            }
        }
    }

    /// Returns a stat's base value.
    #[must_use]
    pub fn stat_value(&self, handler: &str, stat: &str) -> Option<f32> {
        self.handlers
            .read()
            .iter()
            .find(|h| h.name == handler)?
            .stats
            .iter()
            .find(|s| s.name == stat)
            .map(|s| s.value)
    }

    /// Returns an attribute's current value.
    #[must_use]
    pub fn attribute_current(&self, handler: &str, stat: &str) -> Option<f32> {
        self.handlers
            .read()
            .iter()
            .find(|h| h.name == handler)?
            .stats
            .iter()
            .find(|s| s.name == stat)
            .and_then(|s| s.current_value)
    }

    /// Returns a copy of all handlers.
    #[must_use]
    pub fn handlers(&self) -> Vec<StatsHandlerRecord> {
        self.handlers.read().clone()
    }

    fn flattened_maps(&self) -> (BTreeMap<String, f32>, BTreeMap<String, f32>) {
        let mut values = BTreeMap::new();
        let mut currents = BTreeMap::new();
        for handler in self.handlers.read().iter() {
            for stat in &handler.stats {
                values.insert(handler.stat_key(&stat.name), stat.value);
                if let Some(current) = stat.current_value {
                    currents.insert(handler.attribute_key(&stat.name), current);
                }
            }
        }
        (values, currents)
    }

    fn reconcile(live: &mut Vec<StatsHandlerRecord>, incoming: Vec<StatsHandlerRecord>) {
        for handler in incoming {
            match live.iter_mut().find(|h| h.name == handler.name) {
                Some(existing) => {
                    for stat in handler.stats {
                        match existing.stats.iter_mut().find(|s| s.name == stat.name) {
                            Some(live_stat) => {
                                live_stat.value = stat.value;
                                live_stat.current_value = stat.current_value;
                            }
                            None => existing.stats.push(stat),
                        }
                    }
                }
                None => live.push(handler),
            }
        }
    }

    fn apply_stats_blob(&self, blob: &str) -> SyncResult<()> {
        let incoming: Vec<StatsHandlerRecord> = decode_records(blob)?;
        Self::reconcile(&mut self.handlers.write(), incoming);
        Ok(())
    }

    /// Applies the flattened attribute map on top of the handler
    /// records. Keys are `Handler.Stat.CurrentValue`.
    fn apply_attribute_map(&self, raw: &str) -> SyncResult<()> {
        if raw.trim().is_empty() {
            return Ok(());
        }
        let map: BTreeMap<String, f32> = serde_json::from_str(raw)?;
        for (key, current) in map {
            let Some(stripped) = key.strip_suffix(".CurrentValue") else {
                continue;
            };
            if let Some((handler, stat)) = stripped.split_once('.') {
                self.set_attribute_current(handler, stat, current);
            }
        }
        Ok(())
    }
}

impl RecordDomain for StatsDomain {
    fn kind(&self) -> DomainKind {
        DomainKind::Stats
    }

    fn registry(&self) -> Option<&'static str> {
        Some(keyring::STATS_SAVED_KEYS)
    }

    fn save_endpoint(&self) -> &'static str {
        endpoints::STATS
    }

    fn load_path(&self, sync_key: &str) -> String {
        endpoints::stats_load(sync_key)
    }

    fn collect(&self, sync_key: &str) -> SyncResult<String> {
        let (values, currents) = self.flattened_maps();
        let payload = StatsPayload {
            key: sync_key.to_string(),
            stats_json: encode_records(&self.handlers.read())?,
            stat_values_json: serde_json::to_string(&values)?,
            attribute_values_json: serde_json::to_string(&currents)?,
        };
        Ok(serde_json::to_string(&payload)?)
    }

    fn write_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()> {
        let blob = encode_records(&self.handlers.read())?;
        store.set(&format!("{sync_key}.Stats"), &blob)?;
        Ok(())
    }

    fn load_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()> {
        let blob = store.get(&format!("{sync_key}.Stats"))?;
        self.apply_stats_blob(&blob)
    }

    fn apply_remote(&self, body: &str) -> SyncResult<()> {
        let payload: StatsPayload = serde_json::from_str(body)?;
        self.apply_stats_blob(&payload.stats_json)?;
        self.apply_attribute_map(&payload.attribute_values_json)
    }
}

//! Inventory record domain.
//!
//! Live state is two sets of item collections: the UI subset (bags,
//! equipment panels) and the world subset for the active scene.
//! Local keys: `{syncKey}.UI`, `{syncKey}.{sceneName}`, and the
//! `{syncKey}.Scenes` semicolon list of scenes that have saved data.

use crate::domain::RecordDomain;
use crate::error::SyncResult;
use crate::events::DomainKind;
use parking_lot::RwLock;
use savelink_protocol::{
    decode_records, encode_records, endpoints, InventoryLoadResponse, InventorySavePayload,
    ItemCollectionRecord,
};
use savelink_store::{keyring, KvStore};

/// Inventory domain manager state.
pub struct InventoryDomain {
    active_scene: RwLock<String>,
    ui: RwLock<Vec<ItemCollectionRecord>>,
    scene: RwLock<Vec<ItemCollectionRecord>>,
}

impl InventoryDomain {
    /// Creates an empty inventory for the given active scene.
    pub fn new(active_scene: impl Into<String>) -> Self {
        Self {
            active_scene: RwLock::new(active_scene.into()),
            ui: RwLock::new(Vec::new()),
            scene: RwLock::new(Vec::new()),
        }
    }

    /// Returns the active scene name.
    #[must_use]
    pub fn active_scene(&self) -> String {
        self.active_scene.read().clone()
    }

    /// Switches the active scene. The world subset belongs to the
    /// active scene, so callers save before switching.
    pub fn set_active_scene(&self, scene: impl Into<String>) {
        *self.active_scene.write() = scene.into();
    }

    /// Inserts or replaces a UI collection by name.
    pub fn upsert_ui_collection(&self, collection: ItemCollectionRecord) {
        Self::upsert(&mut self.ui.write(), collection);
    }

    /// Inserts or replaces a world collection by name.
    pub fn upsert_scene_collection(&self, collection: ItemCollectionRecord) {
        Self::upsert(&mut self.scene.write(), collection);
    }

    /// Returns a copy of the UI collections.
    #[must_use]
    pub fn ui_collections(&self) -> Vec<ItemCollectionRecord> {
        self.ui.read().clone()
    }

    /// Returns a copy of the active scene's world collections.
    #[must_use]
    pub fn scene_collections(&self) -> Vec<ItemCollectionRecord> {
        self.scene.read().clone()
    }

    /// True if `sync_key` has saved inventory data in the store.
    #[must_use]
    pub fn has_saved_data(store: &dyn KvStore, sync_key: &str) -> bool {
        store.contains(&format!("{sync_key}.UI"))
    }

    fn upsert(list: &mut Vec<ItemCollectionRecord>, collection: ItemCollectionRecord) {
        match list.iter_mut().find(|c| c.name == collection.name) {
            Some(existing) => *existing = collection,
            None => list.push(collection),
        }
    }

    fn reconcile(live: &mut Vec<ItemCollectionRecord>, incoming: Vec<ItemCollectionRecord>) {
        for collection in incoming {
            match live.iter_mut().find(|c| c.name == collection.name) {
                Some(existing) => existing.items = collection.items,
                None => live.push(collection),
            }
        }
    }

    fn apply_blobs(&self, ui_data: &str, scene_data: &str) -> SyncResult<()> {
        let ui: Vec<ItemCollectionRecord> = decode_records(ui_data)?;
        let scene: Vec<ItemCollectionRecord> = decode_records(scene_data)?;
        Self::reconcile(&mut self.ui.write(), ui);
        Self::reconcile(&mut self.scene.write(), scene);
        Ok(())
    }
}

impl RecordDomain for InventoryDomain {
    fn kind(&self) -> DomainKind {
        DomainKind::Inventory
    }

    fn registry(&self) -> Option<&'static str> {
        Some(keyring::INVENTORY_SAVED_KEYS)
    }

    fn save_endpoint(&self) -> &'static str {
        endpoints::INVENTORY
    }

    fn load_path(&self, sync_key: &str) -> String {
        endpoints::inventory_load(sync_key, &self.active_scene())
    }

    fn collect(&self, sync_key: &str) -> SyncResult<String> {
        let payload = InventorySavePayload {
            key: sync_key.to_string(),
            scene: self.active_scene(),
            ui_data: encode_records(&self.ui.read())?,
            scene_data: encode_records(&self.scene.read())?,
        };
        Ok(serde_json::to_string(&payload)?)
    }

    fn write_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()> {
        let scene = self.active_scene();
        let ui_data = encode_records(&self.ui.read())?;
        let scene_data = encode_records(&self.scene.read())?;

        store.set(&format!("{sync_key}.UI"), &ui_data)?;
        store.set(&format!("{sync_key}.{scene}"), &scene_data)?;
        keyring::add(store, &format!("{sync_key}.Scenes"), &scene)?;
        Ok(())
    }

    fn load_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()> {
        let scene = self.active_scene();
        let ui_data = store.get(&format!("{sync_key}.UI"))?;
        let scene_data = store.get(&format!("{sync_key}.{scene}"))?;
        self.apply_blobs(&ui_data, &scene_data)
    }

    fn apply_remote(&self, body: &str) -> SyncResult<()> {
        let response: InventoryLoadResponse = serde_json::from_str(body)?;
        self.apply_blobs(&response.ui_data, &response.scene_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savelink_protocol::ItemRecord;
    use savelink_store::MemoryStore;

    fn bag(name: &str, prefab: &str, stack: u32) -> ItemCollectionRecord {
        ItemCollectionRecord {
            name: name.into(),
            items: vec![ItemRecord {
                prefab: prefab.into(),
                stack,
            }],
        }
    }

    #[test]
    fn upsert_replaces_by_name() {
        let domain = InventoryDomain::new("MainScene");
        domain.upsert_ui_collection(bag("Bag", "Sword", 1));
        domain.upsert_ui_collection(bag("Bag", "Shield", 2));

        let collections = domain.ui_collections();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].items[0].prefab, "Shield");
    }

    #[test]
    fn local_write_uses_suffixed_keys() {
        let store = MemoryStore::new();
        let domain = InventoryDomain::new("MainScene");
        domain.upsert_ui_collection(bag("Bag", "Sword", 1));

        domain.write_local(&store, "acct1").unwrap();

        assert!(store.contains("acct1.UI"));
        assert!(store.contains("acct1.MainScene"));
        assert_eq!(
            keyring::list(&store, "acct1.Scenes").unwrap(),
            vec!["MainScene"]
        );
    }

    #[test]
    fn local_roundtrip_reconciles_in_place() {
        let store = MemoryStore::new();
        let saved = InventoryDomain::new("MainScene");
        saved.upsert_ui_collection(bag("Bag", "Sword", 1));
        saved.upsert_scene_collection(bag("Chest", "Gold", 50));
        saved.write_local(&store, "acct1").unwrap();

        // The live session already has a Bag collection; loading must
        // update it rather than duplicate it.
        let live = InventoryDomain::new("MainScene");
        live.upsert_ui_collection(bag("Bag", "Stick", 1));
        live.load_local(&store, "acct1").unwrap();

        let ui = live.ui_collections();
        assert_eq!(ui.len(), 1);
        assert_eq!(ui[0].items[0].prefab, "Sword");
        assert_eq!(live.scene_collections()[0].name, "Chest");
    }

    #[test]
    fn load_local_with_no_data_is_empty() {
        let store = MemoryStore::new();
        let domain = InventoryDomain::new("MainScene");
        domain.load_local(&store, "acct1").unwrap();
        assert!(domain.ui_collections().is_empty());
    }

    #[test]
    fn apply_remote_parses_wire_shape() {
        let domain = InventoryDomain::new("MainScene");
        let body = r#"{"ui_data":"[{\"name\":\"Bag\",\"items\":[{\"prefab\":\"Sword\",\"stack\":1}]}]","scene_data":""}"#;
        domain.apply_remote(body).unwrap();
        assert_eq!(domain.ui_collections()[0].items[0].prefab, "Sword");
    }

    #[test]
    fn apply_remote_rejects_garbage() {
        let domain = InventoryDomain::new("MainScene");
        assert!(domain.apply_remote("{not json").is_err());
    }

    #[test]
    fn has_saved_data() {
        let store = MemoryStore::new();
        assert!(!InventoryDomain::has_saved_data(&store, "acct1"));
        store.set("acct1.UI", "[]").unwrap();
        assert!(InventoryDomain::has_saved_data(&store, "acct1"));
    }
}

//! Quest record domain.
//!
//! Live state is the quest log: active, completed, and failed quest
//! lists. Local keys: `{syncKey}.ActiveQuests`,
//! `{syncKey}.CompletedQuests`, `{syncKey}.FailedQuests`.

use crate::domain::RecordDomain;
use crate::error::SyncResult;
use crate::events::DomainKind;
use parking_lot::RwLock;
use savelink_protocol::{
    decode_records, encode_records, endpoints, QuestPayload, QuestRecord, QuestStatus,
};
use savelink_store::{keyring, KvStore};

#[derive(Default)]
struct QuestLog {
    active: Vec<QuestRecord>,
    completed: Vec<QuestRecord>,
    failed: Vec<QuestRecord>,
}

/// Quest domain manager state.
#[derive(Default)]
pub struct QuestDomain {
    log: RwLock<QuestLog>,
}

impl QuestDomain {
    /// Creates an empty quest log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a quest into the active list. A quest already present
    /// under the same name (in any list) is not added twice.
    pub fn add_quest(&self, quest: QuestRecord) {
        let mut log = self.log.write();
        if Self::find(&log.active, &quest.name).is_some()
            || Self::find(&log.completed, &quest.name).is_some()
            || Self::find(&log.failed, &quest.name).is_some()
        {
            return;
        }
        log.active.push(quest);
    }

    /// Marks an active quest completed and moves it to the completed
    /// list.
    pub fn complete_quest(&self, name: &str) {
        self.transition(name, QuestStatus::Completed);
    }

    /// Marks an active quest failed and moves it to the failed list.
    pub fn fail_quest(&self, name: &str) {
        self.transition(name, QuestStatus::Failed);
    }

    /// Sets a task's progress on an active quest.
    pub fn set_task_progress(&self, quest: &str, task: &str, progress: f32) {
        let mut log = self.log.write();
        if let Some(quest) = log.active.iter_mut().find(|q| q.name == quest) {
            if let Some(task) = quest.tasks.iter_mut().find(|t| t.name == task) {
                task.progress = progress;
            }
        }
    }

    /// Returns a copy of the active quests.
    #[must_use]
    pub fn active_quests(&self) -> Vec<QuestRecord> {
        self.log.read().active.clone()
    }

    /// Returns a copy of the completed quests.
    #[must_use]
    pub fn completed_quests(&self) -> Vec<QuestRecord> {
        self.log.read().completed.clone()
    }

    /// Returns a copy of the failed quests.
    #[must_use]
    pub fn failed_quests(&self) -> Vec<QuestRecord> {
        self.log.read().failed.clone()
    }

    fn transition(&self, name: &str, status: QuestStatus) {
        let mut log = self.log.write();
        if let Some(index) = log.active.iter().position(|q| q.name == name) {
            let mut quest = log.active.remove(index);
            quest.status = status;
            match status {
                QuestStatus::Failed => log.failed.push(quest),
                _ => log.completed.push(quest),
            }
        }
    }

    fn find<'a>(list: &'a [QuestRecord], name: &str) -> Option<&'a QuestRecord> {
        list.iter().find(|q| q.name == name)
    }

    /// Reconciles incoming quests into a live list by name: status
    /// and per-task progress are updated in place, unknown quests and
    /// tasks are appended.
    fn reconcile(live: &mut Vec<QuestRecord>, incoming: Vec<QuestRecord>) {
        for quest in incoming {
            match live.iter_mut().find(|q| q.name == quest.name) {
                Some(existing) => {
                    existing.status = quest.status;
                    for task in quest.tasks {
                        match existing.tasks.iter_mut().find(|t| t.name == task.name) {
                            Some(live_task) => {
                                live_task.status = task.status;
                                live_task.progress = task.progress;
                            }
                            None => existing.tasks.push(task),
                        }
                    }
                }
                None => live.push(quest),
            }
        }
    }

    fn apply_blobs(&self, active: &str, completed: &str, failed: &str) -> SyncResult<()> {
        let active: Vec<QuestRecord> = decode_records(active)?;
        let completed: Vec<QuestRecord> = decode_records(completed)?;
        let failed: Vec<QuestRecord> = decode_records(failed)?;

        let mut log = self.log.write();
        Self::reconcile(&mut log.active, active);
        Self::reconcile(&mut log.completed, completed);
        Self::reconcile(&mut log.failed, failed);
        Ok(())
    }

    fn payload(&self, sync_key: &str) -> SyncResult<QuestPayload> {
        let log = self.log.read();
        Ok(QuestPayload {
            key: sync_key.to_string(),
            active_quests: encode_records(&log.active)?,
            completed_quests: encode_records(&log.completed)?,
            failed_quests: encode_records(&log.failed)?,
        })
    }
}

impl RecordDomain for QuestDomain {
    fn kind(&self) -> DomainKind {
        DomainKind::Quests
    }

    fn registry(&self) -> Option<&'static str> {
        Some(keyring::QUEST_SAVED_KEYS)
    }

    fn save_endpoint(&self) -> &'static str {
        endpoints::QUESTS
    }

    fn load_path(&self, sync_key: &str) -> String {
        endpoints::quests_load(sync_key)
    }

    fn collect(&self, sync_key: &str) -> SyncResult<String> {
        Ok(serde_json::to_string(&self.payload(sync_key)?)?)
    }

    fn write_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()> {
        let payload = self.payload(sync_key)?;
        store.set(&format!("{sync_key}.ActiveQuests"), &payload.active_quests)?;
        store.set(
            &format!("{sync_key}.CompletedQuests"),
            &payload.completed_quests,
        )?;
        store.set(&format!("{sync_key}.FailedQuests"), &payload.failed_quests)?;
        Ok(())
    }

    fn load_local(&self, store: &dyn KvStore, sync_key: &str) -> SyncResult<()> {
        let active = store.get(&format!("{sync_key}.ActiveQuests"))?;
        let completed = store.get(&format!("{sync_key}.CompletedQuests"))?;
        let failed = store.get(&format!("{sync_key}.FailedQuests"))?;
        self.apply_blobs(&active, &completed, &failed)
    }

    fn apply_remote(&self, body: &str) -> SyncResult<()> {
        let payload: QuestPayload = serde_json::from_str(body)?;
        self.apply_blobs(
            &payload.active_quests,
            &payload.completed_quests,
            &payload.failed_quests,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savelink_protocol::{TaskRecord, TaskStatus};
    use savelink_store::MemoryStore;

    fn quest(name: &str) -> QuestRecord {
        QuestRecord {
            name: name.into(),
            status: QuestStatus::Active,
            tasks: vec![TaskRecord {
                name: "Task".into(),
                status: TaskStatus::Active,
                progress: 0.0,
            }],
        }
    }

    #[test]
    fn add_quest_rejects_duplicates() {
        let domain = QuestDomain::new();
        domain.add_quest(quest("Rat Hunt"));
        domain.add_quest(quest("Rat Hunt"));
        assert_eq!(domain.active_quests().len(), 1);
    }

    #[test]
    fn complete_moves_quest() {
        let domain = QuestDomain::new();
        domain.add_quest(quest("Rat Hunt"));
        domain.complete_quest("Rat Hunt");

        assert!(domain.active_quests().is_empty());
        let completed = domain.completed_quests();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].status, QuestStatus::Completed);
    }

    #[test]
    fn fail_moves_quest() {
        let domain = QuestDomain::new();
        domain.add_quest(quest("Rat Hunt"));
        domain.fail_quest("Rat Hunt");
        assert_eq!(domain.failed_quests().len(), 1);
    }

    #[test]
    fn local_roundtrip_preserves_task_progress() {
        let store = MemoryStore::new();
        let saved = QuestDomain::new();
        saved.add_quest(quest("Rat Hunt"));
        saved.set_task_progress("Rat Hunt", "Task", 7.0);
        saved.write_local(&store, "acct1").unwrap();

        let loaded = QuestDomain::new();
        loaded.load_local(&store, "acct1").unwrap();
        let active = loaded.active_quests();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].tasks[0].progress, 7.0);
    }

    #[test]
    fn reconcile_updates_live_quest_in_place() {
        let live = QuestDomain::new();
        live.add_quest(quest("Rat Hunt"));

        let mut incoming = quest("Rat Hunt");
        incoming.tasks[0].progress = 5.0;
        incoming.tasks[0].status = TaskStatus::Completed;
        let blob = encode_records(&[incoming]).unwrap();
        live.apply_blobs(&blob, "", "").unwrap();

        let active = live.active_quests();
        assert_eq!(active.len(), 1, "no duplicate from reconciliation");
        assert_eq!(active[0].tasks[0].progress, 5.0);
        assert_eq!(active[0].tasks[0].status, TaskStatus::Completed);
    }

    #[test]
    fn apply_remote_parses_wire_shape() {
        let domain = QuestDomain::new();
        let body = r#"{"key":"acct1","active_quests":"[{\"name\":\"Rat Hunt\",\"status\":\"Active\",\"tasks\":[]}]","completed_quests":"","failed_quests":""}"#;
        domain.apply_remote(body).unwrap();
        assert_eq!(domain.active_quests()[0].name, "Rat Hunt");
    }

    #[test]
    fn empty_blobs_load_as_empty_log() {
        let store = MemoryStore::new();
        let domain = QuestDomain::new();
        domain.load_local(&store, "acct1").unwrap();
        assert!(domain.active_quests().is_empty());
        assert!(domain.completed_quests().is_empty());
        assert!(domain.failed_quests().is_empty());
    }
}

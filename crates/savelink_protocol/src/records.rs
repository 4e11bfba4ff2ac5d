//! Entity records for the four record domains.
//!
//! Records round-trip losslessly through serialize → deserialize for
//! every field the sync managers read back; reconciliation after a
//! load is keyed on the `name` fields.

use serde::{Deserialize, Serialize};

/// A playable character as stored by the character domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// The player-chosen character name. Identifying: creation fails
    /// if a record with the same name already exists.
    pub character_name: String,
    /// The profession/class template the character was created from.
    pub profession: String,
    /// The scene the character was last saved in.
    pub scene: String,
}

impl CharacterRecord {
    /// Creates a new character record.
    pub fn new(
        character_name: impl Into<String>,
        profession: impl Into<String>,
        scene: impl Into<String>,
    ) -> Self {
        Self {
            character_name: character_name.into(),
            profession: profession.into(),
            scene: scene.into(),
        }
    }
}

/// A single item stack inside a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Prefab/template name of the item.
    pub prefab: String,
    /// Stack size.
    pub stack: u32,
}

/// A named item collection (a bag, an equipment panel, a chest).
///
/// UI collections and per-scene world collections share this shape;
/// the inventory payload carries them as two separate lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCollectionRecord {
    /// Collection name, unique within its subset.
    pub name: String,
    /// Items currently held by the collection.
    pub items: Vec<ItemRecord>,
}

impl ItemCollectionRecord {
    /// Creates an empty collection with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }
}

/// Lifecycle status of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    /// Not yet accepted.
    Inactive,
    /// Accepted and in progress.
    Active,
    /// All tasks finished.
    Completed,
    /// Failed or abandoned.
    Failed,
}

/// Lifecycle status of a single quest task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started.
    Inactive,
    /// In progress.
    Active,
    /// Done.
    Completed,
    /// Failed.
    Failed,
}

/// Progress on one task of a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task name, unique within its quest.
    pub name: String,
    /// Current status.
    pub status: TaskStatus,
    /// Progress counter (kills, items gathered, ...).
    pub progress: f32,
}

/// A quest with its task progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRecord {
    /// Quest name, unique within the quest log.
    pub name: String,
    /// Current status.
    pub status: QuestStatus,
    /// Per-task progress.
    pub tasks: Vec<TaskRecord>,
}

impl QuestRecord {
    /// Creates an active quest with no tasks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: QuestStatus::Active,
            tasks: Vec::new(),
        }
    }
}

/// A named stat owned by a stats handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    /// Stat name, unique within its handler.
    pub name: String,
    /// Base value.
    pub value: f32,
    /// Current value, present only for regenerating attributes
    /// (health, mana) whose live value drifts from the base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f32>,
}

/// A stats handler: a named owner of stats (the player, a pet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsHandlerRecord {
    /// Handler name, unique within the session.
    pub name: String,
    /// The handler's stats.
    pub stats: Vec<StatRecord>,
}

impl StatsHandlerRecord {
    /// Creates a handler with no stats.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: Vec::new(),
        }
    }

    /// Returns the flattened `Handler.Stat` key for one of this
    /// handler's stats.
    #[must_use]
    pub fn stat_key(&self, stat: &str) -> String {
        format!("{}.{}", self.name, stat)
    }

    /// Returns the flattened `Handler.Stat.CurrentValue` key used for
    /// attribute current values.
    #[must_use]
    pub fn attribute_key(&self, stat: &str) -> String {
        format!("{}.{}.CurrentValue", self.name, stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_record_roundtrip() {
        let record = CharacterRecord::new("Aria", "Mage", "MainScene");
        let json = serde_json::to_string(&record).unwrap();
        let back: CharacterRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn quest_record_roundtrip_preserves_tasks() {
        let quest = QuestRecord {
            name: "Rat Hunt".into(),
            status: QuestStatus::Active,
            tasks: vec![TaskRecord {
                name: "Kill rats".into(),
                status: TaskStatus::Active,
                progress: 3.0,
            }],
        };
        let json = serde_json::to_string(&quest).unwrap();
        let back: QuestRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, quest);
    }

    #[test]
    fn stat_record_omits_absent_current_value() {
        let stat = StatRecord {
            name: "Strength".into(),
            value: 10.0,
            current_value: None,
        };
        let json = serde_json::to_string(&stat).unwrap();
        assert!(!json.contains("current_value"));
    }

    #[test]
    fn flattened_stat_keys() {
        let handler = StatsHandlerRecord::new("Player");
        assert_eq!(handler.stat_key("Health"), "Player.Health");
        assert_eq!(handler.attribute_key("Health"), "Player.Health.CurrentValue");
    }
}

//! # Savelink Protocol
//!
//! Wire types and endpoint layout for the savelink sync protocol.
//!
//! This crate provides:
//! - Entity records for the four record domains (characters,
//!   inventory, quests, stats)
//! - Per-domain JSON payloads matching the server's REST endpoints
//! - Endpoint path construction with safe segment encoding
//! - Auth request/response messages
//!
//! ## Wire format
//!
//! All bodies are JSON. Inventory, quest, and stats payloads carry
//! their entity lists as *nested JSON array strings* inside the outer
//! object; [`encode_records`] and [`decode_records`] handle that
//! pattern, treating an empty string as an empty list.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod endpoints;
mod error;
mod payloads;
mod records;

pub use error::{ProtocolError, ProtocolResult};
pub use payloads::{
    decode_records, encode_records, AuthErrorBody, Credentials, InventoryLoadResponse,
    InventorySavePayload, PasswordRecovery, PasswordReset, QuestPayload, RefreshRequest,
    StatsPayload, TokenResponse,
};
pub use records::{
    CharacterRecord, ItemCollectionRecord, ItemRecord, QuestRecord, QuestStatus, StatRecord,
    StatsHandlerRecord, TaskRecord, TaskStatus,
};

//! Per-domain wire payloads and auth messages.

use crate::error::ProtocolResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Encodes a record list into the nested-JSON-array-string form used
/// inside domain payloads.
///
/// # Errors
///
/// Returns an error if a record fails to serialize.
pub fn encode_records<T: Serialize>(records: &[T]) -> ProtocolResult<String> {
    Ok(serde_json::to_string(records)?)
}

/// Decodes a nested JSON array string back into records.
///
/// An empty or whitespace-only string decodes to an empty list: an
/// absent local blob and a "no data yet" server response both take
/// this form.
///
/// # Errors
///
/// Returns an error if the string is non-empty but malformed.
pub fn decode_records<T: DeserializeOwned>(raw: &str) -> ProtocolResult<Vec<T>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// Inventory save body: `POST /inventory`.
///
/// `ui_data` and `scene_data` are JSON array strings of
/// [`crate::ItemCollectionRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySavePayload {
    /// Sync key the data belongs to.
    pub key: String,
    /// Scene the world subset was captured in.
    pub scene: String,
    /// UI collections blob (bags, equipment).
    pub ui_data: String,
    /// World collections blob for `scene`.
    pub scene_data: String,
}

/// Inventory load response: `GET /inventory/{key}/{scene}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryLoadResponse {
    /// UI collections blob.
    #[serde(default)]
    pub ui_data: String,
    /// World collections blob.
    #[serde(default)]
    pub scene_data: String,
}

/// Quest domain body, used for both save and load.
///
/// The three quest lists are JSON array strings of
/// [`crate::QuestRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestPayload {
    /// Sync key the data belongs to.
    #[serde(default)]
    pub key: String,
    /// Active quest blob.
    #[serde(default)]
    pub active_quests: String,
    /// Completed quest blob.
    #[serde(default)]
    pub completed_quests: String,
    /// Failed quest blob.
    #[serde(default)]
    pub failed_quests: String,
}

/// Stats domain body, used for both save and load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    /// Sync key the data belongs to.
    #[serde(default)]
    pub key: String,
    /// Handler records blob: JSON array string of
    /// [`crate::StatsHandlerRecord`].
    #[serde(default)]
    pub stats_json: String,
    /// Flattened `Handler.Stat -> value` map as a JSON object string.
    #[serde(default)]
    pub stat_values_json: String,
    /// Flattened `Handler.Stat.CurrentValue -> value` map as a JSON
    /// object string, attribute current values only.
    #[serde(default)]
    pub attribute_values_json: String,
}

/// Login/registration request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Plaintext password; the transport is expected to be TLS.
    pub password: String,
}

/// Token refresh request body: `POST /refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token issued at login.
    pub refresh: String,
}

/// Password recovery request body: `POST /recover-password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRecovery {
    /// Account name to send the recovery code to.
    pub username: String,
}

/// Password reset request body: `POST /reset-password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    /// The one-time reset code sent to the account's email.
    pub code: String,
    /// The new password.
    pub password: String,
}

/// Successful auth response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token for bearer auth.
    pub token: String,
    /// Refresh token, absent when the server does not rotate it.
    #[serde(default)]
    pub refresh: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Error body returned by auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthErrorBody {
    /// Human-readable reason.
    pub error: String,
}

//! Error types for the sync client.

use savelink_protocol::ProtocolError;
use savelink_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or transport failure (unreachable host, timeout).
    /// Save and load degrade to the local path.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server returned 401: the access token is expired or
    /// invalid. Engages the auth-retry coordinator.
    #[error("authentication expired")]
    AuthExpired,

    /// The server returned 404. On loads this means "no data yet"
    /// and is handled as an empty result, not surfaced.
    #[error("not found")]
    NotFound,

    /// The server rejected the request with some other 4xx/5xx.
    #[error("server rejected request: status {status}: {message}")]
    ServerRejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// A response or stored blob could not be parsed.
    #[error("malformed data: {0}")]
    Parse(String),

    /// Remote mode is selected but no access token is available.
    /// Hard precondition failure; never silently retried.
    #[error("no access token available")]
    MissingToken,

    /// A record with the same identifying name already exists.
    #[error("a record named {0:?} already exists")]
    DuplicateName(String),

    /// The local store failed. `StorageFull` is fatal for the
    /// operation and is not retried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ProtocolError> for SyncError {
    fn from(e: ProtocolError) -> Self {
        SyncError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Parse(e.to_string())
    }
}

impl SyncError {
    /// True if this error came from an expired access token.
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, SyncError::AuthExpired)
    }

    /// True if this error is a 404 "no data yet" response.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound)
    }
}

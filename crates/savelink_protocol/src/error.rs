//! Error types for protocol encoding and decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding wire data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A JSON body or nested blob could not be parsed.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required field was missing or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

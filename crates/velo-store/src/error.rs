//! Persistence error types.

use thiserror::Error;

/// Errors that can occur while persisting or loading a cart snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The snapshot could not be serialized or deserialized.
    #[error("snapshot serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

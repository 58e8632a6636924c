//! Sync error types.

use thiserror::Error;

/// Errors that can occur during a synchronization attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Sync requires an authenticated identity. Not retryable without a
    /// sign-in.
    #[error("sync requires an authenticated identity")]
    NotAuthenticated,

    /// The server cart endpoint could not be reached. Retryable.
    #[error("cart sync transport failure: {0}")]
    Transport(String),

    /// The server returned a cart the merge cannot reconcile.
    #[error("malformed server cart: {0}")]
    Structural(String),

    /// The backend does not support server-side cart persistence.
    ///
    /// Surfaced instead of silently pretending to persist, which would
    /// break sync convergence.
    #[error("server cart persistence is not supported by this backend")]
    Unsupported,
}

impl SyncError {
    /// Whether the caller may retry the attempt unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(SyncError::Transport("timeout".into()).is_retryable());
        assert!(!SyncError::NotAuthenticated.is_retryable());
        assert!(!SyncError::Structural("bad shape".into()).is_retryable());
        assert!(!SyncError::Unsupported.is_retryable());
    }
}

//! Service-level error type.

use thiserror::Error;
use velo_commerce::catalog::CatalogError;
use velo_commerce::CommerceError;
use velo_store::StoreError;
use velo_sync::SyncError;

/// Failure of a public cart operation.
///
/// Every collaborator error is converted at this boundary so callers see
/// one taxonomy and never need to distinguish thrown from returned
/// errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain rule violation (stock, limits, coupon eligibility, ...).
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// The catalog collaborator failed.
    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    /// The persistence collaborator failed; the in-memory cart remains
    /// the authoritative working copy.
    #[error("cart persistence failed: {0}")]
    Persistence(#[from] StoreError),

    /// The synchronization attempt failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The client is offline; the request was queued for replay.
    #[error("client is offline; the request was queued for replay")]
    Offline,
}

impl ServiceError {
    /// Whether retrying the same call can succeed without changed input.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Commerce(_) => false,
            ServiceError::Catalog(_) => true,
            ServiceError::Persistence(_) => true,
            ServiceError::Sync(e) => e.is_retryable(),
            ServiceError::Offline => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability_by_kind() {
        assert!(!ServiceError::Commerce(CommerceError::InvalidQuantity(0)).is_retryable());
        assert!(ServiceError::Catalog(CatalogError::Unavailable("down".into())).is_retryable());
        assert!(ServiceError::Sync(SyncError::Transport("timeout".into())).is_retryable());
        assert!(!ServiceError::Sync(SyncError::NotAuthenticated).is_retryable());
        assert!(ServiceError::Offline.is_retryable());
    }
}

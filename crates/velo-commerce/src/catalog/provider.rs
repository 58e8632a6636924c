//! Catalog lookup collaborator contract.

use crate::catalog::{Coupon, Product};
use crate::ids::ProductId;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for catalog lookups.
///
/// Not-found is modeled as `Ok(None)` on the trait methods; this error is
/// reserved for transport or backend failures, which validation degrades
/// to warnings instead of aborting.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Backend could not be reached or returned a malformed response.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to current product and coupon truth.
///
/// Implementations live outside this engine (HTTP client, device cache,
/// test fixture). Reads must be idempotent.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch current truth for a product by id.
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// Fetch current truth for a coupon by code.
    async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, CatalogError>;
}

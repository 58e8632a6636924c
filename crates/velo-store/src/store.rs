//! The persistence collaborator contract.

use crate::StoreError;
use async_trait::async_trait;
use velo_commerce::cart::Cart;

/// Persists one cart snapshot per session.
///
/// Snapshots must round-trip without loss: timestamps, monetary
/// precision, item ordering, and key identity all survive a save/load
/// cycle exactly. Writes are last-write-wins.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Persist the cart snapshot, replacing any previous one.
    async fn save(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Load the persisted snapshot, if one exists.
    async fn load(&self) -> Result<Option<Cart>, StoreError>;

    /// Delete the persisted snapshot.
    async fn clear(&self) -> Result<(), StoreError>;
}

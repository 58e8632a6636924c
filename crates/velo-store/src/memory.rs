//! In-memory reference backend.

use crate::{CartStore, StoreError};
use async_trait::async_trait;
use tokio::sync::RwLock;
use velo_commerce::cart::Cart;

/// Cart store holding the snapshot in process memory.
///
/// The snapshot is kept as serialized JSON rather than a live `Cart`
/// value, so every save/load exercises the same lossless round-trip a
/// durable backend would.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    snapshot: RwLock<Option<String>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let json = serde_json::to_string(cart)?;
        *self.snapshot.write().await = Some(json);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Cart>, StoreError> {
        match self.snapshot.read().await.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.snapshot.write().await = None;
        Ok(())
    }
}

//! The VeloCart cart service.
//!
//! A thin orchestrator exposing the public cart operations by composing
//! the domain core (`velo-commerce`), persistence (`velo-store`), and
//! cross-device synchronization (`velo-sync`) behind injected
//! collaborator contracts.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use velo_service::prelude::*;
//!
//! let service = CartService::start(
//!     catalog,          // Arc<dyn CatalogProvider>
//!     Arc::new(MemoryCartStore::new()),
//!     server,           // Arc<dyn ServerCartApi>
//!     identity,         // Arc<dyn IdentityProvider>
//!     ServiceConfig::default(),
//! )
//! .await?;
//!
//! service.add_item(ProductId::new("prod-1"), None, 2, vec![], false).await?;
//! let report = service.validate_cart().await;
//! let synced = service.sync_with_server().await?;
//! ```

mod config;
mod error;
mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use service::{CartOpResult, CartService};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{CartOpResult, CartService, ServiceConfig, ServiceError};

    pub use velo_commerce::prelude::*;
    pub use velo_store::{CartStore, MemoryCartStore, StoreError};
    pub use velo_sync::{
        CartSyncResult, ChangeSummary, Identity, IdentityProvider, ObserverRegistry,
        OfflineQueue, QueuedAction, ReplayReport, ResolutionPolicy, ServerCartApi, SyncConflict,
        SyncError, SyncEvent, SyncManager, SyncObserver, SyncStatus,
    };
}

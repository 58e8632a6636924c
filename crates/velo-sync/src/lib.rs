//! Cross-device cart synchronization for VeloCart.
//!
//! Reconciles a local cart against the server-held cart for the same
//! authenticated identity: item-by-item merge with a configurable
//! conflict policy, coupon union with local precedence, an observer list
//! for sync lifecycle events, and a bounded offline queue replayed when
//! connectivity returns.

mod api;
mod conflict;
mod error;
mod events;
mod manager;
mod merge;
mod queue;

pub use api::{Identity, IdentityProvider, ServerCartApi};
pub use conflict::{ResolutionPolicy, SyncConflict};
pub use error::SyncError;
pub use events::{ObserverRegistry, SyncEvent, SyncObserver};
pub use manager::{CartSyncResult, SyncManager, SyncStatus};
pub use merge::{merge_carts, ChangeSummary, MergeOutcome};
pub use queue::{OfflineQueue, QueuedAction, QueuedEntry, ReplayReport};

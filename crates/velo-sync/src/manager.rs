//! The sync manager: one state machine per sync attempt.

use crate::{
    merge_carts, ChangeSummary, Identity, ObserverRegistry, ResolutionPolicy, ServerCartApi,
    SyncConflict, SyncError, SyncEvent, SyncObserver,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use velo_commerce::cart::Cart;
use velo_commerce::pricing::{CustomerTaxContext, TotalsCalculator};

/// State of the sync machine.
///
/// Per attempt: `Idle -> Syncing -> {Synced | Conflict -> Synced | Failed}`.
/// `Conflict` is transient; every attempt concludes as `Synced` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Conflict,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Conflict => "conflict",
            SyncStatus::Failed => "failed",
        }
    }
}

/// Outcome of one synchronization attempt.
#[derive(Debug, Clone)]
pub struct CartSyncResult {
    /// Whether both sides converged.
    pub success: bool,
    /// Final machine state.
    pub status: SyncStatus,
    /// Conflicts found and auto-resolved during the merge.
    pub conflicts: Vec<SyncConflict>,
    /// The merged cart both sides now hold.
    pub cart: Cart,
    /// Unix timestamp when the attempt concluded.
    pub completed_at: i64,
    /// What the merge changed.
    pub summary: ChangeSummary,
}

/// Reconciles the local cart with the server-held cart for an identity.
///
/// Concurrent attempts against the same identity are not serialized or
/// token-ordered: carts are single-user and low-contention, the merge is
/// idempotent, and the max/sum policies converge, so the last completed
/// upload wins.
pub struct SyncManager {
    api: Arc<dyn ServerCartApi>,
    calculator: TotalsCalculator,
    policy: ResolutionPolicy,
    status: SyncStatus,
    observers: ObserverRegistry,
}

impl std::fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncManager")
            .field("policy", &self.policy)
            .field("status", &self.status)
            .field("observers", &self.observers)
            .finish()
    }
}

impl SyncManager {
    /// Create a manager over a server cart endpoint.
    pub fn new(api: Arc<dyn ServerCartApi>, calculator: TotalsCalculator) -> Self {
        Self {
            api,
            calculator,
            policy: ResolutionPolicy::default(),
            status: SyncStatus::Idle,
            observers: ObserverRegistry::new(),
        }
    }

    /// Set the conflict resolution policy.
    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active conflict resolution policy.
    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Current machine state.
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Register a lifecycle observer; invocation follows registration
    /// order.
    pub fn register_observer(&mut self, observer: Box<dyn SyncObserver>) {
        self.observers.register(observer);
    }

    /// Run one synchronization attempt.
    ///
    /// The local cart is only read; on any failure no partial merge
    /// escapes, so the caller's state is untouched. On success the
    /// returned merged cart is the snapshot both sides now hold.
    pub async fn sync(
        &mut self,
        local: &Cart,
        identity: &Identity,
        ctx: Option<&CustomerTaxContext>,
    ) -> Result<CartSyncResult, SyncError> {
        if !identity.is_authenticated {
            return Err(self.fail(SyncError::NotAuthenticated));
        }

        self.status = SyncStatus::Syncing;
        self.observers.notify(&SyncEvent::Started);
        debug!(session = %local.session_id, "cart sync started");

        let server_cart = match self.api.get_cart(identity).await {
            Ok(cart) => cart,
            Err(e) => return Err(self.fail(e)),
        };

        let (mut merged, conflicts, summary) = match server_cart {
            None => {
                debug!("no server cart for identity, uploading local verbatim");
                (local.clone(), Vec::new(), ChangeSummary::default())
            }
            Some(server) => {
                if server.currency != local.currency {
                    return Err(self.fail(SyncError::Structural(format!(
                        "server cart currency {} does not match local {}",
                        server.currency, local.currency
                    ))));
                }

                let outcome = merge_carts(local, &server, self.policy);
                for conflict in &outcome.conflicts {
                    warn!(item = %conflict.item_key, "sync conflict: {}", conflict.message);
                    self.observers
                        .notify(&SyncEvent::ConflictDetected(conflict.clone()));
                }
                if !outcome.conflicts.is_empty() {
                    self.status = SyncStatus::Conflict;
                }
                (outcome.cart, outcome.conflicts, outcome.summary)
            }
        };

        self.calculator.refresh(&mut merged, ctx);

        if let Err(e) = self.api.put_cart(identity, &merged).await {
            return Err(self.fail(e));
        }

        self.status = SyncStatus::Synced;
        self.observers.notify(&SyncEvent::Completed {
            summary,
            conflicts: conflicts.len(),
        });
        info!(
            conflicts = conflicts.len(),
            items_added = summary.items_added,
            items_updated = summary.items_updated,
            "cart sync completed"
        );

        Ok(CartSyncResult {
            success: true,
            status: SyncStatus::Synced,
            conflicts,
            cart: merged,
            completed_at: current_timestamp(),
            summary,
        })
    }

    /// Conclude the attempt as failed.
    fn fail(&mut self, error: SyncError) -> SyncError {
        self.status = SyncStatus::Failed;
        warn!(retryable = error.is_retryable(), "cart sync failed: {}", error);
        self.observers.notify(&SyncEvent::Failed(error.to_string()));
        error
    }
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use velo_commerce::cart::CartItem;
    use velo_commerce::catalog::Product;
    use velo_commerce::ids::{CustomerId, ProductId, SessionId};
    use velo_commerce::money::{Currency, Money};
    use velo_commerce::pricing::TaxConfig;

    #[derive(Default)]
    struct FakeServer {
        cart: Mutex<Option<Cart>>,
        fail_get: Mutex<bool>,
        fail_put: Mutex<bool>,
    }

    #[async_trait]
    impl ServerCartApi for FakeServer {
        async fn get_cart(&self, _identity: &Identity) -> Result<Option<Cart>, SyncError> {
            if *self.fail_get.lock().unwrap() {
                return Err(SyncError::Transport("get timed out".into()));
            }
            Ok(self.cart.lock().unwrap().clone())
        }

        async fn put_cart(&self, _identity: &Identity, cart: &Cart) -> Result<(), SyncError> {
            if *self.fail_put.lock().unwrap() {
                return Err(SyncError::Transport("put timed out".into()));
            }
            *self.cart.lock().unwrap() = Some(cart.clone());
            Ok(())
        }
    }

    fn manager(server: Arc<FakeServer>) -> SyncManager {
        SyncManager::new(server, TotalsCalculator::new(TaxConfig::disabled()))
    }

    fn identity() -> Identity {
        Identity::authenticated(CustomerId::new("cust-1"))
    }

    fn cart_with(lines: &[(&str, i64)]) -> Cart {
        let mut cart = Cart::new(SessionId::new("s"), Currency::USD);
        for (id, quantity) in lines {
            let product = Product::new(
                ProductId::new(*id),
                "Product",
                Money::new(1000, Currency::USD),
            );
            cart.upsert_item(
                CartItem::from_product(&product, None, vec![], *quantity).unwrap(),
                false,
            )
            .unwrap();
        }
        cart
    }

    #[tokio::test]
    async fn test_anonymous_identity_is_rejected() {
        let server = Arc::new(FakeServer::default());
        let mut manager = manager(server);
        let local = cart_with(&[("a", 1)]);

        let err = manager
            .sync(&local, &Identity::anonymous(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotAuthenticated));
        assert!(!err.is_retryable());
        assert_eq!(manager.status(), SyncStatus::Failed);
    }

    #[tokio::test]
    async fn test_absent_server_cart_uploads_local_verbatim() {
        let server = Arc::new(FakeServer::default());
        let mut manager = manager(server.clone());
        let local = cart_with(&[("a", 2)]);

        let result = manager.sync(&local, &identity(), None).await.unwrap();
        assert!(result.success);
        assert_eq!(result.status, SyncStatus::Synced);
        assert!(result.conflicts.is_empty());
        assert!(result.summary.is_unchanged());

        let uploaded = server.cart.lock().unwrap().clone().unwrap();
        assert_eq!(uploaded.item_count(), 2);
    }

    #[tokio::test]
    async fn test_merge_reports_conflicts_and_converges() {
        let server = Arc::new(FakeServer::default());
        *server.cart.lock().unwrap() = Some(cart_with(&[("a", 5), ("b", 1)]));

        let mut manager = manager(server.clone());
        let local = cart_with(&[("a", 2)]);

        let result = manager.sync(&local, &identity(), None).await.unwrap();
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.summary.items_updated, 1);
        assert_eq!(result.summary.items_added, 1);

        // merge_smart takes the larger quantity.
        let merged_a = result.cart.items[0].quantity;
        assert_eq!(merged_a, 5);

        // Both sides converged to the same snapshot.
        let uploaded = server.cart.lock().unwrap().clone().unwrap();
        assert_eq!(uploaded.items, result.cart.items);
    }

    #[tokio::test]
    async fn test_transport_failure_is_retryable_and_all_or_nothing() {
        let server = Arc::new(FakeServer::default());
        *server.fail_get.lock().unwrap() = true;

        let mut manager = manager(server.clone());
        let local = cart_with(&[("a", 1)]);

        let err = manager.sync(&local, &identity(), None).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(manager.status(), SyncStatus::Failed);
        assert!(server.cart.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_server_untouched() {
        let server = Arc::new(FakeServer::default());
        *server.fail_put.lock().unwrap() = true;

        let mut manager = manager(server.clone());
        let local = cart_with(&[("a", 1)]);

        let err = manager.sync(&local, &identity(), None).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(server.cart.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_currency_mismatch_is_structural() {
        let server = Arc::new(FakeServer::default());
        let mut foreign = cart_with(&[("a", 1)]);
        foreign.currency = Currency::EUR;
        *server.cart.lock().unwrap() = Some(foreign);

        let mut manager = manager(server);
        let local = cart_with(&[("a", 1)]);

        let err = manager.sync(&local, &identity(), None).await.unwrap_err();
        assert!(matches!(err, SyncError::Structural(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_observer_event_sequence() {
        use std::sync::Arc as StdArc;

        struct Recorder(StdArc<Mutex<Vec<&'static str>>>);
        impl SyncObserver for Recorder {
            fn on_sync_event(&self, event: &SyncEvent) {
                let kind = match event {
                    SyncEvent::Started => "started",
                    SyncEvent::ConflictDetected(_) => "conflict",
                    SyncEvent::Completed { .. } => "completed",
                    SyncEvent::Failed(_) => "failed",
                };
                self.0.lock().unwrap().push(kind);
            }
        }

        let server = Arc::new(FakeServer::default());
        *server.cart.lock().unwrap() = Some(cart_with(&[("a", 5)]));

        let log = StdArc::new(Mutex::new(Vec::new()));
        let mut manager = manager(server);
        manager.register_observer(Box::new(Recorder(log.clone())));

        let local = cart_with(&[("a", 2)]);
        manager.sync(&local, &identity(), None).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["started", "conflict", "completed"]);
    }

    #[tokio::test]
    async fn test_merged_totals_are_recomputed() {
        let server = Arc::new(FakeServer::default());
        *server.cart.lock().unwrap() = Some(cart_with(&[("a", 5)]));

        let mut manager = manager(server);
        let local = cart_with(&[("a", 2)]);

        let result = manager.sync(&local, &identity(), None).await.unwrap();
        // 5 units at $10 after the smart merge.
        assert_eq!(result.cart.totals.total.amount_cents, 5000);
    }
}

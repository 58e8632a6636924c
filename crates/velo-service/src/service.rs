//! The cart service orchestrator.

use crate::{ServiceConfig, ServiceError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use velo_commerce::cart::{AppliedCoupon, Cart, CartItem};
use velo_commerce::catalog::{AttributeSelection, CatalogProvider, Coupon, Product, ProductKind};
use velo_commerce::error::CommerceError;
use velo_commerce::ids::{ItemKey, ProductId, SessionId, VariationId};
use velo_commerce::pricing::TotalsCalculator;
use velo_commerce::validation::{ValidationEngine, ValidationReport};
use velo_store::CartStore;
use velo_sync::{
    CartSyncResult, IdentityProvider, OfflineQueue, QueuedAction, ReplayReport, ServerCartApi,
    SyncManager, SyncObserver, SyncStatus,
};

/// Outcome of a cart-mutating operation.
#[derive(Debug, Clone)]
pub struct CartOpResult {
    /// The cart after the operation (unchanged when queued).
    pub cart: Cart,
    /// Whether the action was queued for offline replay instead of
    /// applied.
    pub queued: bool,
}

impl CartOpResult {
    fn applied(cart: Cart) -> Self {
        Self {
            cart,
            queued: false,
        }
    }

    fn queued(cart: Cart) -> Self {
        Self { cart, queued: true }
    }
}

/// Mutable session state behind one cooperative lock.
///
/// The lock makes each read-modify-write mutation atomic and gives the
/// background sync task safe access; there is exactly one writer of the
/// authoritative in-memory cart.
struct CartState {
    cart: Cart,
    queue: OfflineQueue,
    sync: SyncManager,
    online: bool,
}

/// Public cart operations over the injected collaborators.
///
/// Owns the authoritative in-memory cart for one session. Every
/// operation returns a `Result`; domain errors leave the cart unchanged.
pub struct CartService {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn CartStore>,
    identity: Arc<dyn IdentityProvider>,
    state: Arc<Mutex<CartState>>,
    calculator: TotalsCalculator,
    validator: ValidationEngine,
    config: ServiceConfig,
    background: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl CartService {
    /// Start a session: load the persisted snapshot or begin a fresh
    /// cart.
    pub async fn start(
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<dyn CartStore>,
        server: Arc<dyn ServerCartApi>,
        identity: Arc<dyn IdentityProvider>,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        let cart = match store.load().await? {
            Some(cart) => {
                debug!(session = %cart.session_id, "restored persisted cart");
                cart
            }
            None => Cart::new(SessionId::generate(), config.currency),
        };

        let calculator = TotalsCalculator::new(config.tax.clone());
        let validator = ValidationEngine::new(config.validation.clone(), calculator.clone());
        let sync = SyncManager::new(server, calculator.clone()).with_policy(config.policy);
        let queue = OfflineQueue::new(config.queue_capacity, config.max_replay_attempts);

        Ok(Self {
            catalog,
            store,
            identity,
            state: Arc::new(Mutex::new(CartState {
                cart,
                queue,
                sync,
                online: true,
            })),
            calculator,
            validator,
            config,
            background: std::sync::Mutex::new(None),
        })
    }

    /// The current cart snapshot.
    pub async fn get_cart(&self) -> Cart {
        self.state.lock().await.cart.clone()
    }

    /// Add an item, merging into an existing line with the same derived
    /// key (`replace = true` overwrites the quantity instead).
    pub async fn add_item(
        &self,
        product_id: ProductId,
        variation_id: Option<VariationId>,
        quantity: i64,
        attributes: Vec<AttributeSelection>,
        replace: bool,
    ) -> Result<CartOpResult, ServiceError> {
        self.execute(QueuedAction::AddItem {
            product_id,
            variation_id,
            attributes,
            quantity,
            replace,
        })
        .await
    }

    /// Set a line's quantity; zero behaves exactly like removal.
    pub async fn update_item_quantity(
        &self,
        key: ItemKey,
        quantity: i64,
    ) -> Result<CartOpResult, ServiceError> {
        self.execute(QueuedAction::UpdateQuantity { key, quantity })
            .await
    }

    /// Remove a line by key.
    pub async fn remove_item(&self, key: ItemKey) -> Result<CartOpResult, ServiceError> {
        self.execute(QueuedAction::RemoveItem { key }).await
    }

    /// Empty the cart.
    pub async fn clear_cart(&self) -> Result<CartOpResult, ServiceError> {
        self.execute(QueuedAction::Clear).await
    }

    /// Apply a coupon after checking live eligibility.
    pub async fn apply_coupon(&self, code: impl Into<String>) -> Result<CartOpResult, ServiceError> {
        self.execute(QueuedAction::ApplyCoupon { code: code.into() })
            .await
    }

    /// Remove an applied coupon.
    pub async fn remove_coupon(
        &self,
        code: impl Into<String>,
    ) -> Result<CartOpResult, ServiceError> {
        self.execute(QueuedAction::RemoveCoupon { code: code.into() })
            .await
    }

    /// Validate the cart against live catalog truth.
    pub async fn validate_cart(&self) -> ValidationReport {
        let cart = self.get_cart().await;
        self.validator
            .validate(&cart, self.catalog.as_ref(), self.config.customer_tax.as_ref())
            .await
    }

    /// Synchronize with the server-held cart for the current identity.
    pub async fn sync_with_server(&self) -> Result<CartSyncResult, ServiceError> {
        let mut state = self.state.lock().await;
        if !state.online {
            debug!("offline, queueing sync request");
            state.queue.push(QueuedAction::Sync);
            return Err(ServiceError::Offline);
        }
        self.sync_locked(&mut state).await
    }

    /// Current sync machine state.
    pub async fn sync_status(&self) -> SyncStatus {
        self.state.lock().await.sync.status()
    }

    /// Register an observer for sync lifecycle events.
    pub async fn register_sync_observer(&self, observer: Box<dyn SyncObserver>) {
        self.state.lock().await.sync.register_observer(observer);
    }

    /// Flip connectivity. Coming back online replays any queued actions.
    pub async fn set_online(&self, online: bool) -> ReplayReport {
        let mut state = self.state.lock().await;
        let was_online = state.online;
        state.online = online;
        if online && !was_online && !state.queue.is_empty() {
            info!(pending = state.queue.len(), "connectivity restored, replaying queue");
            self.replay_locked(&mut state).await
        } else {
            ReplayReport::default()
        }
    }

    /// Number of actions awaiting replay.
    pub async fn pending_actions(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Replay queued actions in FIFO order against the current cart.
    pub async fn replay_pending(&self) -> ReplayReport {
        let mut state = self.state.lock().await;
        self.replay_locked(&mut state).await
    }

    /// Start background synchronization on a fixed interval.
    ///
    /// A tick only syncs when the identity is authenticated at that
    /// moment; anonymous carts are never auto-synchronized.
    pub fn enable_sync(&self, interval: Duration) {
        let state = Arc::clone(&self.state);
        let identity = Arc::clone(&self.identity);
        let store = Arc::clone(&self.store);
        let ctx = self.config.customer_tax.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the cadence
            // starts one interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let identity_now = identity.identity();
                if !identity_now.is_authenticated {
                    debug!("background sync tick skipped: anonymous identity");
                    continue;
                }

                let mut state = state.lock().await;
                if !state.online {
                    continue;
                }
                if state.cart.customer_id.is_none() {
                    state.cart.customer_id = identity_now.user_id.clone();
                }
                let result = {
                    let CartState { cart, sync, .. } = &mut *state;
                    sync.sync(cart, &identity_now, ctx.as_ref()).await
                };
                match result {
                    Ok(outcome) => {
                        state.cart = outcome.cart;
                        if let Err(e) = store.save(&state.cart).await {
                            warn!("failed to persist background-synced cart: {}", e);
                        }
                    }
                    Err(e) => debug!("background sync failed: {}", e),
                }
            }
        });

        let mut guard = self
            .background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    /// Stop background synchronization.
    pub fn disable_sync(&self) {
        let mut guard = self
            .background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }

    /// Run one mutation: queue it when offline, otherwise apply it to a
    /// working copy, recompute totals, commit, and persist.
    async fn execute(&self, action: QueuedAction) -> Result<CartOpResult, ServiceError> {
        let mut state = self.state.lock().await;
        if !state.online {
            debug!(action = action.kind(), "offline, queueing action");
            state.queue.push(action);
            return Ok(CartOpResult::queued(state.cart.clone()));
        }

        let mut working = state.cart.clone();
        self.apply_action(&mut working, &action).await?;
        self.calculator
            .refresh(&mut working, self.config.customer_tax.as_ref());
        state.cart = working;

        let saved = self.store.save(&state.cart).await;
        let cart = state.cart.clone();
        drop(state);

        // A failed save is surfaced, but the mutated in-memory cart stays
        // authoritative until the next successful save.
        saved?;
        Ok(CartOpResult::applied(cart))
    }

    /// Apply one action to a working copy of the cart.
    async fn apply_action(
        &self,
        cart: &mut Cart,
        action: &QueuedAction,
    ) -> Result<(), ServiceError> {
        match action {
            QueuedAction::AddItem {
                product_id,
                variation_id,
                attributes,
                quantity,
                replace,
            } => {
                self.apply_add_item(
                    cart,
                    product_id,
                    variation_id.clone(),
                    attributes.clone(),
                    *quantity,
                    *replace,
                )
                .await
            }
            QueuedAction::UpdateQuantity { key, quantity } => {
                if !cart.update_quantity(key, *quantity)? {
                    return Err(CommerceError::ItemNotInCart(key.to_string()).into());
                }
                Ok(())
            }
            QueuedAction::RemoveItem { key } => {
                if !cart.remove_item(key) {
                    return Err(CommerceError::ItemNotInCart(key.to_string()).into());
                }
                Ok(())
            }
            QueuedAction::ApplyCoupon { code } => self.apply_coupon_action(cart, code).await,
            QueuedAction::RemoveCoupon { code } => {
                if !cart.remove_coupon(code) {
                    return Err(CommerceError::CouponNotFound(code.clone()).into());
                }
                Ok(())
            }
            QueuedAction::Clear => {
                cart.clear();
                Ok(())
            }
            QueuedAction::Sync => {
                // Replay handles sync directly against the manager.
                Ok(())
            }
        }
    }

    async fn apply_add_item(
        &self,
        cart: &mut Cart,
        product_id: &ProductId,
        variation_id: Option<VariationId>,
        attributes: Vec<AttributeSelection>,
        quantity: i64,
        replace: bool,
    ) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity).into());
        }

        let product = self
            .catalog
            .fetch_product(product_id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(product_id.to_string()))?;

        if !product.is_purchasable() {
            return Err(CommerceError::ProductNotFound(product_id.to_string()).into());
        }

        if product.kind == ProductKind::Variable && variation_id.is_none() {
            return Err(CommerceError::VariationNotFound(product_id.to_string()).into());
        }

        let item = CartItem::from_product(&product, variation_id, attributes, quantity)?;

        // Stock and purchase rules are checked against the quantity the
        // line will end up with after the merge.
        let resulting_quantity = match cart.item(&item.key) {
            Some(existing) if !replace => existing
                .quantity
                .checked_add(quantity)
                .ok_or(CommerceError::Overflow)?,
            _ => quantity,
        };

        self.check_fulfillment(&product, resulting_quantity)?;

        cart.upsert_item(item, replace)?;
        Ok(())
    }

    fn check_fulfillment(&self, product: &Product, quantity: i64) -> Result<(), ServiceError> {
        if !product.can_fulfill(quantity) {
            let err = match product.available() {
                Some(available) if available > 0 => CommerceError::InsufficientStock {
                    product_id: product.id.to_string(),
                    requested: quantity,
                    available,
                },
                _ => CommerceError::OutOfStock(product.id.to_string()),
            };
            return Err(err.into());
        }

        if !product.quantity_rule.is_satisfied(quantity) {
            return Err(CommerceError::QuantityRuleViolation {
                product_id: product.id.to_string(),
                quantity,
            }
            .into());
        }

        Ok(())
    }

    async fn apply_coupon_action(&self, cart: &mut Cart, code: &str) -> Result<(), ServiceError> {
        if cart.has_coupon(code) {
            return Err(CommerceError::CouponAlreadyApplied(code.to_string()).into());
        }

        let coupon = self
            .catalog
            .fetch_coupon(code)
            .await?
            .ok_or_else(|| CommerceError::CouponNotFound(code.to_string()))?;

        self.check_coupon_eligibility(cart, &coupon)?;

        cart.apply_coupon(AppliedCoupon::from_coupon(&coupon))?;
        Ok(())
    }

    fn check_coupon_eligibility(&self, cart: &Cart, coupon: &Coupon) -> Result<(), ServiceError> {
        if coupon.is_expired(current_timestamp()) {
            return Err(CommerceError::CouponExpired(coupon.code.clone()).into());
        }
        if coupon.is_exhausted() {
            return Err(CommerceError::CouponUsageLimitReached(coupon.code.clone()).into());
        }

        let subtotal = cart.totals.subtotal;
        if let Some(minimum) = coupon.minimum_amount {
            if subtotal.amount_cents < minimum.amount_cents {
                return Err(CommerceError::CouponMinimumNotMet {
                    code: coupon.code.clone(),
                    minimum,
                    subtotal,
                }
                .into());
            }
        }

        if coupon.individual_use && !cart.coupons.is_empty() {
            return Err(CommerceError::CouponIndividualUse(coupon.code.clone()).into());
        }
        if cart.coupons.iter().any(|c| c.individual_use) {
            let holder = cart
                .coupons
                .iter()
                .find(|c| c.individual_use)
                .map(|c| c.code.clone())
                .unwrap_or_default();
            return Err(CommerceError::CouponIndividualUse(holder).into());
        }

        Ok(())
    }

    async fn sync_locked(&self, state: &mut CartState) -> Result<CartSyncResult, ServiceError> {
        let identity = self.identity.identity();
        if identity.is_authenticated && state.cart.customer_id.is_none() {
            state.cart.customer_id = identity.user_id.clone();
        }

        let result = {
            let CartState { cart, sync, .. } = &mut *state;
            sync.sync(cart, &identity, self.config.customer_tax.as_ref())
                .await?
        };

        state.cart = result.cart.clone();
        if let Err(e) = self.store.save(&state.cart).await {
            warn!("failed to persist synced cart: {}", e);
        }
        Ok(result)
    }

    async fn replay_locked(&self, state: &mut CartState) -> ReplayReport {
        let entries = state.queue.drain();
        let mut report = ReplayReport::default();

        for entry in entries {
            let outcome = match &entry.action {
                QueuedAction::Sync => self.sync_locked(state).await.map(|_| ()),
                action => {
                    let mut working = state.cart.clone();
                    match self.apply_action(&mut working, action).await {
                        Ok(()) => {
                            self.calculator
                                .refresh(&mut working, self.config.customer_tax.as_ref());
                            state.cart = working;
                            if let Err(e) = self.store.save(&state.cart).await {
                                warn!("failed to persist replayed action: {}", e);
                            }
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
            };

            match outcome {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    debug!(
                        action = entry.action.kind(),
                        "replay attempt failed: {}", e
                    );
                    if state.queue.requeue(entry) {
                        report.requeued += 1;
                    } else {
                        report.dropped += 1;
                    }
                }
            }
        }

        info!(
            applied = report.applied,
            requeued = report.requeued,
            dropped = report.dropped,
            "offline queue replay finished"
        );
        report
    }
}

impl Drop for CartService {
    fn drop(&mut self) {
        self.disable_sync();
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

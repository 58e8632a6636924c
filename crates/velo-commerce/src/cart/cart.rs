//! The cart aggregate.

use crate::cart::{AppliedCoupon, CartFee, CartItem, CartTotals, ShippingMethod};
use crate::error::CommerceError;
use crate::ids::{CustomerId, ItemKey, SessionId};
use crate::money::Currency;
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// A shopping cart.
///
/// Items are ordered and unique by key; coupons are unique by code;
/// `totals` is always re-derived by the calculator after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in the cart, ordered by insertion.
    pub items: Vec<CartItem>,
    /// Applied coupons, unique by code.
    pub coupons: Vec<AppliedCoupon>,
    /// Chosen delivery options.
    pub shipping_methods: Vec<ShippingMethod>,
    /// Extra charges.
    pub fees: Vec<CartFee>,
    /// Derived totals.
    pub totals: CartTotals,
    /// Cart currency.
    pub currency: Currency,
    /// Session correlation for anonymous carts.
    pub session_id: SessionId,
    /// Customer correlation for authenticated carts; the sync identity.
    pub customer_id: Option<CustomerId>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last mutation; the freshness signal during merge.
    pub updated_at: i64,
}

impl Cart {
    /// Create an empty cart for a session.
    pub fn new(session_id: SessionId, currency: Currency) -> Self {
        let now = current_timestamp();
        Self {
            items: Vec::new(),
            coupons: Vec::new(),
            shipping_methods: Vec::new(),
            fees: Vec::new(),
            totals: CartTotals::zero(currency),
            currency,
            session_id,
            customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an empty cart for an authenticated customer.
    pub fn for_customer(customer_id: CustomerId, session_id: SessionId, currency: Currency) -> Self {
        let mut cart = Self::new(session_id, currency);
        cart.customer_id = Some(customer_id);
        cart
    }

    /// Insert a line, merging by key.
    ///
    /// When a line with the same key exists, `replace = false` adds the
    /// quantities together and `replace = true` overwrites the quantity.
    /// Returns the key of the affected line.
    pub fn upsert_item(&mut self, item: CartItem, replace: bool) -> Result<ItemKey, CommerceError> {
        if item.quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(item.quantity));
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.key == item.key) {
            let new_quantity = if replace {
                item.quantity
            } else {
                existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(CommerceError::Overflow)?
            };

            if new_quantity > MAX_QUANTITY_PER_ITEM {
                return Err(CommerceError::QuantityExceedsLimit {
                    requested: new_quantity,
                    limit: MAX_QUANTITY_PER_ITEM,
                });
            }

            existing.quantity = new_quantity;
            existing.update_total()?;
            let key = existing.key.clone();
            self.touch();
            return Ok(key);
        }

        if item.quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit {
                requested: item.quantity,
                limit: MAX_QUANTITY_PER_ITEM,
            });
        }

        let key = item.key.clone();
        self.items.push(item);
        self.touch();
        Ok(key)
    }

    /// Update a line's quantity.
    ///
    /// A quantity of zero (or less) removes the line, exactly like
    /// [`Cart::remove_item`]. Returns whether a line was affected.
    pub fn update_quantity(&mut self, key: &ItemKey, quantity: i64) -> Result<bool, CommerceError> {
        if quantity <= 0 {
            return Ok(self.remove_item(key));
        }

        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit {
                requested: quantity,
                limit: MAX_QUANTITY_PER_ITEM,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| &i.key == key) {
            item.quantity = quantity;
            item.update_total()?;
            self.touch();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove a line by key.
    pub fn remove_item(&mut self, key: &ItemKey) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.key != key);
        let removed = self.items.len() < len_before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Remove all items, coupons, shipping methods, and fees.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupons.clear();
        self.shipping_methods.clear();
        self.fees.clear();
        self.totals = CartTotals::zero(self.currency);
        self.touch();
    }

    /// Apply a coupon; codes are unique within a cart.
    pub fn apply_coupon(&mut self, coupon: AppliedCoupon) -> Result<(), CommerceError> {
        if self.has_coupon(&coupon.code) {
            return Err(CommerceError::CouponAlreadyApplied(coupon.code));
        }
        self.coupons.push(coupon);
        self.touch();
        Ok(())
    }

    /// Remove a coupon by code.
    pub fn remove_coupon(&mut self, code: &str) -> bool {
        let len_before = self.coupons.len();
        self.coupons.retain(|c| c.code != code);
        let removed = self.coupons.len() < len_before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Check if a coupon code is applied.
    pub fn has_coupon(&self, code: &str) -> bool {
        self.coupons.iter().any(|c| c.code == code)
    }

    /// Get a line by key.
    pub fn item(&self, key: &ItemKey) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.key == key)
    }

    /// Total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Number of unique lines.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Associate the cart with an authenticated customer.
    pub fn set_customer(&mut self, customer_id: CustomerId) {
        self.customer_id = Some(customer_id);
        self.touch();
    }

    /// Replace the derived totals. Callers go through the calculator.
    pub fn set_totals(&mut self, totals: CartTotals) {
        self.totals = totals;
    }

    /// Bump the freshness timestamp.
    pub fn touch(&mut self) {
        self.updated_at = current_timestamp();
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
    use crate::catalog::Product;
    use crate::ids::ProductId;
    use crate::money::Money;

    fn cart() -> Cart {
        Cart::new(SessionId::new("session-123"), Currency::USD)
    }

    fn item(product_id: &str, quantity: i64) -> CartItem {
        let product = Product::new(
            ProductId::new(product_id),
            "Test Product",
            Money::new(1000, Currency::USD),
        );
        CartItem::from_product(&product, None, vec![], quantity).unwrap()
    }

    #[test]
    fn test_cart_creation() {
        let cart = cart();
        assert!(cart.is_empty());
        assert_eq!(cart.session_id.as_str(), "session-123");
        assert!(cart.totals.total.is_zero());
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = cart();
        cart.upsert_item(item("prod-1", 1), false).unwrap();
        cart.upsert_item(item("prod-1", 2), false).unwrap();

        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_with_replace_overwrites_quantity() {
        let mut cart = cart();
        cart.upsert_item(item("prod-1", 5), false).unwrap();
        cart.upsert_item(item("prod-1", 2), true).unwrap();

        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut cart = cart();
        let key = cart.upsert_item(item("prod-1", 3), false).unwrap();

        assert!(cart.update_quantity(&key, 0).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_missing_key() {
        let mut cart = cart();
        let affected = cart.update_quantity(&ItemKey::new("missing"), 2).unwrap();
        assert!(!affected);
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = cart();
        let result = cart.upsert_item(item("prod-1", MAX_QUANTITY_PER_ITEM + 1), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_coupon_uniqueness() {
        use crate::catalog::{Coupon, CouponValue};

        let mut cart = cart();
        let coupon = Coupon::new("SAVE10", CouponValue::Percent(10.0));
        cart.apply_coupon(AppliedCoupon::from_coupon(&coupon)).unwrap();

        let again = cart.apply_coupon(AppliedCoupon::from_coupon(&coupon));
        assert!(again.is_err());
        assert_eq!(cart.coupons.len(), 1);

        assert!(cart.remove_coupon("SAVE10"));
        assert!(!cart.remove_coupon("SAVE10"));
    }

    #[test]
    fn test_clear() {
        let mut cart = cart();
        cart.upsert_item(item("prod-1", 1), false).unwrap();
        cart.fees.push(CartFee::new("Handling", Money::new(100, Currency::USD)));
        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.fees.is_empty());
        assert!(cart.totals.total.is_zero());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut cart = cart();
        cart.upsert_item(item("prod-1", 2), false).unwrap();
        cart.upsert_item(item("prod-2", 1), false).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(cart, restored);
    }
}

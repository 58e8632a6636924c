//! Coupon truth as reported by the catalog backend.

use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// What a coupon is worth, by discount type.
///
/// A closed set of variants so every calculation branch is checked at
/// compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CouponValue {
    /// Fixed amount off the whole cart.
    FixedCart(Money),
    /// Percentage off eligible items (0.0 - 100.0).
    Percent(f64),
    /// Fixed amount off each eligible unit.
    FixedProduct(Money),
}

impl CouponValue {
    pub fn kind_str(&self) -> &'static str {
        match self {
            CouponValue::FixedCart(_) => "fixed_cart",
            CouponValue::Percent(_) => "percent",
            CouponValue::FixedProduct(_) => "fixed_product",
        }
    }
}

/// A coupon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Coupon code (unique, e.g., "SAVE10").
    pub code: String,
    /// Discount value.
    pub value: CouponValue,
    /// Minimum cart subtotal required to apply.
    pub minimum_amount: Option<Money>,
    /// Subtotal ceiling; for percent coupons this caps the discount.
    pub maximum_amount: Option<Money>,
    /// Products the coupon is restricted to (empty = all).
    pub product_ids: Vec<ProductId>,
    /// Products the coupon never applies to.
    pub excluded_product_ids: Vec<ProductId>,
    /// Cannot be combined with any other coupon.
    pub individual_use: bool,
    /// Expiry as a Unix timestamp.
    pub expires_at: Option<i64>,
    /// Maximum number of redemptions (None = unlimited).
    pub usage_limit: Option<i64>,
    /// Redemptions so far.
    pub usage_count: i64,
}

impl Coupon {
    /// Create an unrestricted coupon with the given value.
    pub fn new(code: impl Into<String>, value: CouponValue) -> Self {
        Self {
            code: code.into(),
            value,
            minimum_amount: None,
            maximum_amount: None,
            product_ids: Vec::new(),
            excluded_product_ids: Vec::new(),
            individual_use: false,
            expires_at: None,
            usage_limit: None,
            usage_count: 0,
        }
    }

    /// Require a minimum cart subtotal.
    pub fn with_minimum_amount(mut self, minimum: Money) -> Self {
        self.minimum_amount = Some(minimum);
        self
    }

    /// Cap the discount (percent coupons) or flag large carts.
    pub fn with_maximum_amount(mut self, maximum: Money) -> Self {
        self.maximum_amount = Some(maximum);
        self
    }

    /// Restrict to specific products.
    pub fn with_product_ids(mut self, ids: Vec<ProductId>) -> Self {
        self.product_ids = ids;
        self
    }

    /// Limit total redemptions.
    pub fn with_usage_limit(mut self, limit: i64) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    /// Set the expiry timestamp.
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.expires_at = Some(timestamp);
        self
    }

    /// Mark as individual-use only.
    pub fn individual_use(mut self) -> Self {
        self.individual_use = true;
        self
    }

    /// Check whether the coupon has expired at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.map(|ends| now > ends).unwrap_or(false)
    }

    /// Check whether the usage limit is exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .map(|limit| self.usage_count >= limit)
            .unwrap_or(false)
    }

    /// Check whether the coupon applies to a product.
    pub fn applies_to(&self, product_id: &ProductId) -> bool {
        if self.excluded_product_ids.contains(product_id) {
            return false;
        }
        self.product_ids.is_empty() || self.product_ids.contains(product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_expiry() {
        let coupon = Coupon::new("SAVE10", CouponValue::Percent(10.0)).expires_at(1_000);
        assert!(!coupon.is_expired(999));
        assert!(!coupon.is_expired(1_000));
        assert!(coupon.is_expired(1_001));
    }

    #[test]
    fn test_usage_limit() {
        let mut coupon = Coupon::new("SAVE10", CouponValue::Percent(10.0)).with_usage_limit(2);
        assert!(!coupon.is_exhausted());

        coupon.usage_count = 2;
        assert!(coupon.is_exhausted());
    }

    #[test]
    fn test_product_restrictions() {
        let included = ProductId::new("prod-1");
        let excluded = ProductId::new("prod-2");
        let other = ProductId::new("prod-3");

        let coupon = Coupon::new(
            "TARGETED",
            CouponValue::FixedProduct(Money::new(100, Currency::USD)),
        )
        .with_product_ids(vec![included.clone()]);

        assert!(coupon.applies_to(&included));
        assert!(!coupon.applies_to(&other));

        let mut blanket = Coupon::new("BLANKET", CouponValue::Percent(5.0));
        blanket.excluded_product_ids = vec![excluded.clone()];
        assert!(blanket.applies_to(&included));
        assert!(!blanket.applies_to(&excluded));
    }
}

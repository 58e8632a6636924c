//! Coupons as applied to a cart.

use crate::catalog::{Coupon, CouponValue};
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A coupon that has been applied to a cart.
///
/// A full snapshot of the coupon at apply time, so totals can be
/// recomputed offline and validation can detect drift against live truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    /// The coupon code (unique within a cart).
    pub code: String,
    /// Discount value at apply time.
    pub value: CouponValue,
    /// Minimum subtotal requirement at apply time.
    pub minimum_amount: Option<Money>,
    /// Subtotal ceiling / percent cap at apply time.
    pub maximum_amount: Option<Money>,
    /// Product restriction list at apply time.
    pub product_ids: Vec<ProductId>,
    /// Product exclusion list at apply time.
    pub excluded_product_ids: Vec<ProductId>,
    /// Individual-use flag at apply time.
    pub individual_use: bool,
    /// Expiry at apply time.
    pub expires_at: Option<i64>,
    /// Usage limit at apply time.
    pub usage_limit: Option<i64>,
    /// Usage count at apply time.
    pub usage_count: i64,
    /// Unix timestamp when the coupon was applied.
    pub applied_at: i64,
}

impl AppliedCoupon {
    /// Snapshot a coupon at apply time.
    pub fn from_coupon(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            value: coupon.value.clone(),
            minimum_amount: coupon.minimum_amount,
            maximum_amount: coupon.maximum_amount,
            product_ids: coupon.product_ids.clone(),
            excluded_product_ids: coupon.excluded_product_ids.clone(),
            individual_use: coupon.individual_use,
            expires_at: coupon.expires_at,
            usage_limit: coupon.usage_limit,
            usage_count: coupon.usage_count,
            applied_at: current_timestamp(),
        }
    }

    /// Check whether the coupon applies to a product.
    pub fn applies_to(&self, product_id: &ProductId) -> bool {
        if self.excluded_product_ids.contains(product_id) {
            return false;
        }
        self.product_ids.is_empty() || self.product_ids.contains(product_id)
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
    use crate::money::Currency;

    #[test]
    fn test_snapshot_copies_fields() {
        let coupon = Coupon::new("SAVE10", CouponValue::Percent(10.0))
            .with_minimum_amount(Money::new(5000, Currency::USD))
            .individual_use();
        let applied = AppliedCoupon::from_coupon(&coupon);

        assert_eq!(applied.code, "SAVE10");
        assert_eq!(applied.value, CouponValue::Percent(10.0));
        assert_eq!(applied.minimum_amount, Some(Money::new(5000, Currency::USD)));
        assert!(applied.individual_use);
    }

    #[test]
    fn test_applies_to_restrictions() {
        let target = ProductId::new("prod-1");
        let coupon = Coupon::new(
            "TARGETED",
            CouponValue::FixedProduct(Money::new(100, Currency::USD)),
        )
        .with_product_ids(vec![target.clone()]);
        let applied = AppliedCoupon::from_coupon(&coupon);

        assert!(applied.applies_to(&target));
        assert!(!applied.applies_to(&ProductId::new("prod-2")));
    }
}

//! Derived cart totals.

use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Complete totals breakdown for a cart.
///
/// Every field is a pure function of the cart's items, coupons, shipping
/// methods, fees, and the tax configuration. Totals are produced only by
/// the calculator, never hand-patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Item subtotal before discounts.
    pub subtotal: Money,
    /// Tax on the subtotal.
    pub subtotal_tax: Money,
    /// Total discount across all coupons.
    pub discount_total: Money,
    /// Tax portion of the discount (tax-exclusive pricing only).
    pub discount_tax: Money,
    /// Shipping cost.
    pub shipping_total: Money,
    /// Tax on shipping.
    pub shipping_tax: Money,
    /// Sum of extra fees.
    pub fee_total: Money,
    /// Tax on taxable fees.
    pub fee_tax: Money,
    /// Contents total after discounts.
    pub cart_contents_total: Money,
    /// All tax combined.
    pub total_tax: Money,
    /// Grand total.
    pub total: Money,
}

impl CartTotals {
    /// All-zero totals in the given currency.
    pub fn zero(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            subtotal: zero,
            subtotal_tax: zero,
            discount_total: zero,
            discount_tax: zero,
            shipping_total: zero,
            shipping_tax: zero,
            fee_total: zero,
            fee_tax: zero,
            cart_contents_total: zero,
            total_tax: zero,
            total: zero,
        }
    }

    /// Check if any discount was applied.
    pub fn has_discount(&self) -> bool {
        self.discount_total.is_positive()
    }
}

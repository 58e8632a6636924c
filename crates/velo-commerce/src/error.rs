//! Commerce error types.

use crate::money::Money;
use thiserror::Error;

/// Errors that can occur in cart and catalog operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found or not published.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Variation missing or invalid for a variable product.
    #[error("Variation not found for product {0}")]
    VariationNotFound(String),

    /// Coupon code does not exist.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Item key not present in the cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Quantity must be a positive integer.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity violates the product's min/max/step rule.
    #[error("Quantity {quantity} violates purchase rule for product {product_id}")]
    QuantityRuleViolation { product_id: String, quantity: i64 },

    /// Quantity exceeds the per-line cap.
    #[error("Quantity {requested} exceeds maximum allowed ({limit})")]
    QuantityExceedsLimit { requested: i64, limit: i64 },

    /// Product is out of stock.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// Requested more than the available stock.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Coupon has expired.
    #[error("Coupon expired: {0}")]
    CouponExpired(String),

    /// Coupon usage limit reached.
    #[error("Coupon usage limit reached: {0}")]
    CouponUsageLimitReached(String),

    /// Cart subtotal below the coupon's minimum amount.
    #[error("Coupon {code} requires a minimum subtotal of {minimum}, cart has {subtotal}")]
    CouponMinimumNotMet {
        code: String,
        minimum: Money,
        subtotal: Money,
    },

    /// Individual-use coupon cannot combine with other coupons.
    #[error("Coupon {0} cannot be combined with other coupons")]
    CouponIndividualUse(String),

    /// Coupon already applied to this cart.
    #[error("Coupon already applied: {0}")]
    CouponAlreadyApplied(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}

//! Chosen shipping methods and extra cart fees.

use crate::ids::ShippingMethodId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A delivery option attached to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    /// Unique identifier.
    pub id: ShippingMethodId,
    /// Display title (e.g., "Standard Shipping").
    pub title: String,
    /// Shipping cost.
    pub cost: Money,
    /// Whether this method is currently selected/usable.
    pub enabled: bool,
    /// Whether shipping tax applies to this method.
    pub taxable: bool,
    /// Itemized tax supplied by the backend; preferred over the resolved
    /// rate when present.
    pub itemized_tax: Option<Money>,
}

impl ShippingMethod {
    /// Create an enabled, taxable shipping method.
    pub fn new(id: ShippingMethodId, title: impl Into<String>, cost: Money) -> Self {
        Self {
            id,
            title: title.into(),
            cost,
            enabled: true,
            taxable: true,
            itemized_tax: None,
        }
    }

    /// Check if this is free shipping.
    pub fn is_free(&self) -> bool {
        self.cost.is_zero()
    }
}

/// An extra charge on the cart (gift wrap, handling, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartFee {
    /// Fee name.
    pub name: String,
    /// Fee amount.
    pub amount: Money,
    /// Whether tax applies to this fee.
    pub taxable: bool,
}

impl CartFee {
    /// Create a non-taxable fee.
    pub fn new(name: impl Into<String>, amount: Money) -> Self {
        Self {
            name: name.into(),
            amount,
            taxable: false,
        }
    }

    /// Mark the fee as taxable.
    pub fn taxable(mut self) -> Self {
        self.taxable = true;
        self
    }
}

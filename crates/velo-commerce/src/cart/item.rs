//! Cart line items and stable key derivation.

use crate::catalog::{AttributeSelection, Product, ProductKind, QuantityRule, StockStatus};
use crate::error::CommerceError;
use crate::ids::{ItemKey, ProductId, VariationId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Derive the stable identity of a cart line.
///
/// The key is an FNV-1a 64-bit hash over the canonical string
/// `product_id|variation_id|name=value|...` with attributes sorted by
/// name, so the same selection hashes identically on every device.
pub fn derive_item_key(
    product_id: &ProductId,
    variation_id: Option<&VariationId>,
    attributes: &[AttributeSelection],
) -> ItemKey {
    let mut sorted: Vec<&AttributeSelection> = attributes.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut canonical = String::new();
    canonical.push_str(product_id.as_str());
    canonical.push('|');
    if let Some(variation) = variation_id {
        canonical.push_str(variation.as_str());
    }
    for attr in sorted {
        canonical.push('|');
        canonical.push_str(&attr.name);
        canonical.push('=');
        canonical.push_str(&attr.value);
    }

    ItemKey::new(format!("{:016x}", fnv1a_64(canonical.as_bytes())))
}

/// FNV-1a 64-bit hash.
fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET_BASIS, |acc, b| {
        (acc ^ u64::from(*b)).wrapping_mul(PRIME)
    })
}

/// Catalog truth captured when the item entered the cart.
///
/// The validation engine compares this against a fresh fetch to detect
/// stock and price drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Product name at add time.
    pub name: String,
    /// Simple or variable.
    pub kind: ProductKind,
    /// Stock status at add time.
    pub stock_status: StockStatus,
    /// Whether the backend managed stock at add time.
    pub manage_stock: bool,
    /// Units available at add time, when stock was managed.
    pub stock_quantity: Option<i64>,
    /// Backorder policy at add time.
    pub backorders_allowed: bool,
    /// Purchase quantity rule at add time.
    pub quantity_rule: QuantityRule,
}

impl ItemSnapshot {
    /// Capture the snapshot fields from current product truth.
    pub fn capture(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            kind: product.kind,
            stock_status: product.stock_status,
            manage_stock: product.manage_stock,
            stock_quantity: product.stock_quantity,
            backorders_allowed: product.backorders_allowed,
            quantity_rule: product.quantity_rule.clone(),
        }
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Stable derived identity; the merge key across devices.
    pub key: ItemKey,
    /// Product being purchased.
    pub product_id: ProductId,
    /// Variation, for variable products.
    pub variation_id: Option<VariationId>,
    /// Selected attributes defining the variation.
    pub attributes: Vec<AttributeSelection>,
    /// Quantity (positive).
    pub quantity: i64,
    /// Unit price charged (sale price when on sale).
    pub price: Money,
    /// Regular (list) unit price.
    pub regular_price: Money,
    /// Sale unit price, if on sale at add time.
    pub sale_price: Option<Money>,
    /// Line total (price * quantity).
    pub total_price: Money,
    /// Catalog truth captured at add time.
    pub snapshot: ItemSnapshot,
    /// Unix timestamp when the line was created.
    pub added_at: i64,
}

impl CartItem {
    /// Build a line item from current product truth.
    ///
    /// Returns an error if the quantity is not positive or the line total
    /// would overflow.
    pub fn from_product(
        product: &Product,
        variation_id: Option<VariationId>,
        attributes: Vec<AttributeSelection>,
        quantity: i64,
    ) -> Result<Self, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        let price = product.effective_price();
        let total_price = price
            .try_multiply(quantity)
            .ok_or(CommerceError::Overflow)?;

        Ok(Self {
            key: derive_item_key(&product.id, variation_id.as_ref(), &attributes),
            product_id: product.id.clone(),
            variation_id,
            attributes,
            quantity,
            price,
            regular_price: product.regular_price,
            sale_price: product.sale_price,
            total_price,
            snapshot: ItemSnapshot::capture(product),
            added_at: current_timestamp(),
        })
    }

    /// Recompute the line total from the current quantity.
    pub fn update_total(&mut self) -> Result<(), CommerceError> {
        self.total_price = self
            .price
            .try_multiply(self.quantity)
            .ok_or(CommerceError::Overflow)?;
        Ok(())
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

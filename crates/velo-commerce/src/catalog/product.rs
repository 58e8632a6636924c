//! Product truth as reported by the catalog backend.

use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Publish status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    /// Visible and purchasable.
    #[default]
    Published,
    /// Not yet visible to customers.
    Draft,
    /// Removed from the storefront but data preserved.
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Published => "published",
            ProductStatus::Draft => "draft",
            ProductStatus::Archived => "archived",
        }
    }
}

/// Product classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductKind {
    /// Single purchasable item.
    #[default]
    Simple,
    /// Product sold through variations (size, color, ...).
    Variable,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Simple => "simple",
            ProductKind::Variable => "variable",
        }
    }
}

/// Stock status reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "instock",
            StockStatus::OutOfStock => "outofstock",
            StockStatus::OnBackorder => "onbackorder",
        }
    }
}

/// Purchase quantity constraints for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRule {
    /// Minimum purchasable quantity.
    pub min: i64,
    /// Maximum purchasable quantity, if any.
    pub max: Option<i64>,
    /// Quantity must be a multiple of this step, counted from `min`.
    pub step: i64,
}

impl Default for QuantityRule {
    fn default() -> Self {
        Self {
            min: 1,
            max: None,
            step: 1,
        }
    }
}

impl QuantityRule {
    /// Check a quantity against min, max, and step alignment.
    pub fn is_satisfied(&self, quantity: i64) -> bool {
        if quantity < self.min {
            return false;
        }
        if let Some(max) = self.max {
            if quantity > max {
                return false;
            }
        }
        self.step <= 1 || (quantity - self.min) % self.step == 0
    }
}

/// A selected attribute on a variation (e.g., Size: Large).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeSelection {
    /// Attribute name (e.g., "Size").
    pub name: String,
    /// Selected value (e.g., "Large").
    pub value: String,
}

impl AttributeSelection {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Current catalog truth for a product (or a resolved variation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Publish status.
    pub status: ProductStatus,
    /// Simple or variable.
    pub kind: ProductKind,
    /// Regular (list) price.
    pub regular_price: Money,
    /// Sale price, if the product is on sale.
    pub sale_price: Option<Money>,
    /// Stock status.
    pub stock_status: StockStatus,
    /// Whether the backend manages a numeric stock level.
    pub manage_stock: bool,
    /// Units available when stock is managed.
    pub stock_quantity: Option<i64>,
    /// Whether backorders are accepted when stock runs out.
    pub backorders_allowed: bool,
    /// Purchase quantity constraints.
    pub quantity_rule: QuantityRule,
}

impl Product {
    /// Create a published simple product at a regular price.
    pub fn new(id: ProductId, name: impl Into<String>, regular_price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            status: ProductStatus::Published,
            kind: ProductKind::Simple,
            regular_price,
            sale_price: None,
            stock_status: StockStatus::InStock,
            manage_stock: false,
            stock_quantity: None,
            backorders_allowed: false,
            quantity_rule: QuantityRule::default(),
        }
    }

    /// Set a sale price.
    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    /// Enable managed stock with a quantity on hand.
    pub fn with_stock(mut self, quantity: i64) -> Self {
        self.manage_stock = true;
        self.stock_quantity = Some(quantity);
        self.stock_status = if quantity > 0 {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        };
        self
    }

    /// Set the purchase quantity rule.
    pub fn with_quantity_rule(mut self, rule: QuantityRule) -> Self {
        self.quantity_rule = rule;
        self
    }

    /// The price a customer pays right now.
    pub fn effective_price(&self) -> Money {
        self.sale_price.unwrap_or(self.regular_price)
    }

    /// Check if the product is on sale.
    pub fn is_on_sale(&self) -> bool {
        self.sale_price
            .map(|sale| sale.amount_cents < self.regular_price.amount_cents)
            .unwrap_or(false)
    }

    /// Check if the product can be bought at all.
    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Published
    }

    /// Units currently available, when stock is managed.
    pub fn available(&self) -> Option<i64> {
        if self.manage_stock {
            Some(self.stock_quantity.unwrap_or(0))
        } else {
            None
        }
    }

    /// Check whether a requested quantity can be fulfilled.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        match self.stock_status {
            StockStatus::OutOfStock => false,
            StockStatus::OnBackorder => self.backorders_allowed,
            StockStatus::InStock => match self.available() {
                Some(available) => available >= quantity || self.backorders_allowed,
                None => true,
            },
        }
    }
}

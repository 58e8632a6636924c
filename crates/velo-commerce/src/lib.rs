//! Cart domain types and logic for VeloCart.
//!
//! This crate is the pure core of the cart consistency engine:
//!
//! - **Catalog**: current product/coupon truth and the lookup contract
//! - **Cart**: the aggregate model with stable line keys and snapshots
//! - **Pricing**: the deterministic totals pipeline
//! - **Validation**: live-truth checks producing errors and warnings
//!
//! # Example
//!
//! ```rust,ignore
//! use velo_commerce::prelude::*;
//!
//! let product = Product::new(
//!     ProductId::new("prod-1"),
//!     "Wool Socks",
//!     Money::new(1299, Currency::USD),
//! );
//!
//! let mut cart = Cart::new(SessionId::generate(), Currency::USD);
//! let item = CartItem::from_product(&product, None, vec![], 2)?;
//! cart.upsert_item(item, false)?;
//!
//! let calculator = TotalsCalculator::new(TaxConfig::default());
//! calculator.refresh(&mut cart, None);
//! println!("Total: {}", cart.totals.total);
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod pricing;
pub mod validation;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{
        AttributeSelection, CatalogError, CatalogProvider, Coupon, CouponValue, Product,
        ProductKind, ProductStatus, QuantityRule, StockStatus,
    };

    // Cart
    pub use crate::cart::{
        derive_item_key, AppliedCoupon, Cart, CartFee, CartItem, CartTotals, ItemSnapshot,
        ShippingMethod, MAX_QUANTITY_PER_ITEM,
    };

    // Pricing
    pub use crate::pricing::{CustomerTaxContext, TaxConfig, TotalsCalculator};

    // Validation
    pub use crate::validation::{
        IssueCode, ValidationConfig, ValidationEngine, ValidationIssue, ValidationReport,
    };
}

//! The validation engine.

use crate::cart::{AppliedCoupon, Cart, CartItem};
use crate::catalog::{CatalogProvider, Coupon, Product, ProductKind, StockStatus};
use crate::pricing::{CustomerTaxContext, TotalsCalculator};
use crate::validation::{IssueCode, ValidationIssue, ValidationReport};
use serde::{Deserialize, Serialize};

/// Tolerance in cents for price-drift and totals-integrity checks.
const CENT_TOLERANCE: i64 = 1;

/// Cart-level validation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum unique lines allowed in a cart.
    pub max_unique_items: usize,
    /// Hard cap on a single line's quantity.
    pub max_quantity_per_item: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_unique_items: 100,
            max_quantity_per_item: crate::cart::MAX_QUANTITY_PER_ITEM,
        }
    }
}

impl ValidationConfig {
    /// Soft ceiling on the aggregate quantity across all lines.
    pub fn soft_quantity_ceiling(&self) -> i64 {
        10 * self.max_unique_items as i64
    }
}

/// Checks a cart against live catalog truth.
///
/// All checks are additive: one line's problems never suppress another's,
/// and a failed fetch degrades to a warning for that entry while the rest
/// of the cart is still validated.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidationConfig,
    calculator: TotalsCalculator,
}

impl ValidationEngine {
    /// Create an engine with explicit limits and totals configuration.
    pub fn new(config: ValidationConfig, calculator: TotalsCalculator) -> Self {
        Self { config, calculator }
    }

    /// Validate a cart. Read-only; the cart is never mutated.
    pub async fn validate(
        &self,
        cart: &Cart,
        catalog: &dyn CatalogProvider,
        ctx: Option<&CustomerTaxContext>,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_cart_level(cart, &mut report);

        for item in &cart.items {
            match catalog.fetch_product(&item.product_id).await {
                Ok(Some(product)) => self.check_item(item, &product, &mut report),
                Ok(None) => report.push_error(ValidationIssue::item(
                    IssueCode::ProductNotFound,
                    &item.key,
                    format!("product {} no longer exists", item.product_id),
                )),
                Err(e) => report.push_warning(ValidationIssue::item(
                    IssueCode::FetchFailed,
                    &item.key,
                    format!("could not verify product {}: {}", item.product_id, e),
                )),
            }
        }

        for applied in &cart.coupons {
            match catalog.fetch_coupon(&applied.code).await {
                Ok(Some(live)) => self.check_coupon(cart, applied, &live, &mut report),
                Ok(None) => report.push_error(ValidationIssue::coupon(
                    IssueCode::CouponNotFound,
                    &applied.code,
                    format!("coupon {} no longer exists", applied.code),
                )),
                Err(e) => report.push_warning(ValidationIssue::coupon(
                    IssueCode::FetchFailed,
                    &applied.code,
                    format!("could not verify coupon {}: {}", applied.code, e),
                )),
            }
        }

        self.check_totals(cart, ctx, &mut report);
        report
    }

    fn check_cart_level(&self, cart: &Cart, report: &mut ValidationReport) {
        if cart.is_empty() {
            report.push_warning(ValidationIssue::cart(
                IssueCode::EmptyCart,
                "cart is empty",
            ));
        }

        if cart.unique_item_count() > self.config.max_unique_items {
            report.push_error(ValidationIssue::cart(
                IssueCode::CartItemLimit,
                format!(
                    "cart has {} unique items, limit is {}",
                    cart.unique_item_count(),
                    self.config.max_unique_items
                ),
            ));
        }

        let ceiling = self.config.soft_quantity_ceiling();
        if cart.item_count() > ceiling {
            report.push_warning(ValidationIssue::cart(
                IssueCode::CartQuantityLimit,
                format!(
                    "cart holds {} units, above the soft ceiling of {}",
                    cart.item_count(),
                    ceiling
                ),
            ));
        }
    }

    fn check_item(&self, item: &CartItem, product: &Product, report: &mut ValidationReport) {
        if !product.is_purchasable() {
            // Unpublished products read as missing to the storefront.
            report.push_error(ValidationIssue::item(
                IssueCode::ProductNotFound,
                &item.key,
                format!("product {} is no longer published", product.id),
            ));
            return;
        }

        self.check_variation(item, product, report);
        self.check_stock(item, product, report);
        self.check_quantity(item, product, report);
        self.check_price_drift(item, product, report);
    }

    fn check_variation(&self, item: &CartItem, product: &Product, report: &mut ValidationReport) {
        if product.kind != ProductKind::Variable {
            return;
        }
        if item.variation_id.is_none() {
            report.push_error(ValidationIssue::item(
                IssueCode::VariationNotFound,
                &item.key,
                format!("variable product {} has no variation selected", product.id),
            ));
        }
        if item.attributes.iter().any(|a| a.value.trim().is_empty()) {
            report.push_error(ValidationIssue::item(
                IssueCode::VariationNotFound,
                &item.key,
                format!("product {} has an empty attribute selection", product.id),
            ));
        }
    }

    fn check_stock(&self, item: &CartItem, product: &Product, report: &mut ValidationReport) {
        match product.stock_status {
            StockStatus::OutOfStock => {
                report.push_error(ValidationIssue::item(
                    IssueCode::OutOfStock,
                    &item.key,
                    format!("{} is out of stock", product.name),
                ));
            }
            StockStatus::OnBackorder => {
                if product.backorders_allowed {
                    report.push_warning(ValidationIssue::item(
                        IssueCode::Backorder,
                        &item.key,
                        format!("{} will be fulfilled on backorder", product.name),
                    ));
                } else {
                    report.push_error(ValidationIssue::item(
                        IssueCode::Backorder,
                        &item.key,
                        format!("{} is on backorder and backorders are disabled", product.name),
                    ));
                }
            }
            StockStatus::InStock => {
                let Some(available) = product.available() else {
                    return;
                };
                if available <= 0 {
                    report.push_error(ValidationIssue::item(
                        IssueCode::OutOfStock,
                        &item.key,
                        format!("{} is out of stock", product.name),
                    ));
                } else if available < item.quantity {
                    if product.backorders_allowed {
                        report.push_warning(ValidationIssue::item(
                            IssueCode::Backorder,
                            &item.key,
                            format!(
                                "{} of {} units of {} will be backordered",
                                item.quantity - available,
                                item.quantity,
                                product.name
                            ),
                        ));
                    } else {
                        report.push_error(ValidationIssue::item(
                            IssueCode::InsufficientStock,
                            &item.key,
                            format!(
                                "only {} of {} requested units of {} available",
                                available, item.quantity, product.name
                            ),
                        ));
                    }
                } else {
                    // Sufficient, but warn when the margin is thin:
                    // within 10% of the request or 5 units, whichever is
                    // larger.
                    let threshold = (item.quantity / 10).max(5);
                    if available - item.quantity <= threshold {
                        report.push_warning(ValidationIssue::item(
                            IssueCode::LowStock,
                            &item.key,
                            format!("only {} units of {} left", available, product.name),
                        ));
                    }
                }
            }
        }
    }

    fn check_quantity(&self, item: &CartItem, product: &Product, report: &mut ValidationReport) {
        if !product.quantity_rule.is_satisfied(item.quantity) {
            report.push_error(ValidationIssue::item(
                IssueCode::InvalidQuantity,
                &item.key,
                format!(
                    "quantity {} violates the purchase rule for {}",
                    item.quantity, product.name
                ),
            ));
        }
        if item.quantity > self.config.max_quantity_per_item {
            report.push_error(ValidationIssue::item(
                IssueCode::InvalidQuantity,
                &item.key,
                format!(
                    "quantity {} exceeds the per-item cap of {}",
                    item.quantity, self.config.max_quantity_per_item
                ),
            ));
        }
    }

    fn check_price_drift(&self, item: &CartItem, product: &Product, report: &mut ValidationReport) {
        let regular_drift = product.regular_price.abs_diff_cents(&item.regular_price);
        let effective_drift = product.effective_price().abs_diff_cents(&item.price);
        if regular_drift > CENT_TOLERANCE || effective_drift > CENT_TOLERANCE {
            report.push_warning(ValidationIssue::item(
                IssueCode::PriceChanged,
                &item.key,
                format!(
                    "price of {} changed from {} to {}",
                    product.name,
                    item.price,
                    product.effective_price()
                ),
            ));
        }
    }

    fn check_coupon(
        &self,
        cart: &Cart,
        applied: &AppliedCoupon,
        live: &Coupon,
        report: &mut ValidationReport,
    ) {
        if live.is_expired(current_timestamp()) {
            report.push_error(ValidationIssue::coupon(
                IssueCode::CouponExpired,
                &applied.code,
                format!("coupon {} has expired", applied.code),
            ));
        }

        if live.is_exhausted() {
            report.push_error(ValidationIssue::coupon(
                IssueCode::CouponUsageLimitReached,
                &applied.code,
                format!("coupon {} has been fully redeemed", applied.code),
            ));
        }

        let subtotal = cart.totals.subtotal;
        if let Some(minimum) = live.minimum_amount {
            if subtotal.amount_cents < minimum.amount_cents {
                report.push_error(ValidationIssue::coupon(
                    IssueCode::CouponMinimumNotMet,
                    &applied.code,
                    format!(
                        "coupon {} requires a minimum subtotal of {}",
                        applied.code, minimum
                    ),
                ));
            }
        }
        if let Some(maximum) = live.maximum_amount {
            if subtotal.amount_cents > maximum.amount_cents {
                report.push_warning(ValidationIssue::coupon(
                    IssueCode::CouponMaximumExceeded,
                    &applied.code,
                    format!(
                        "cart subtotal exceeds the {} maximum for coupon {}",
                        maximum, applied.code
                    ),
                ));
            }
        }

        if live.individual_use && cart.coupons.len() > 1 {
            report.push_error(ValidationIssue::coupon(
                IssueCode::CouponIndividualUse,
                &applied.code,
                format!("coupon {} cannot be combined with other coupons", applied.code),
            ));
        }
    }

    fn check_totals(
        &self,
        cart: &Cart,
        ctx: Option<&CustomerTaxContext>,
        report: &mut ValidationReport,
    ) {
        let recomputed = self.calculator.calculate_cart(cart, ctx);
        if recomputed.total.abs_diff_cents(&cart.totals.total) > CENT_TOLERANCE {
            report.push_warning(ValidationIssue::cart(
                IssueCode::TotalsMismatch,
                format!(
                    "stored total {} differs from recomputed total {}",
                    cart.totals.total, recomputed.total
                ),
            ));
        }
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
    use crate::catalog::{CatalogError, CouponValue};
    use crate::ids::{ProductId, SessionId};
    use crate::money::{Currency, Money};
    use crate::pricing::TaxConfig;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixtureCatalog {
        products: HashMap<String, Product>,
        coupons: HashMap<String, Coupon>,
        fail: bool,
    }

    impl FixtureCatalog {
        fn new() -> Self {
            Self {
                products: HashMap::new(),
                coupons: HashMap::new(),
                fail: false,
            }
        }

        fn with_product(mut self, product: Product) -> Self {
            self.products.insert(product.id.as_str().to_string(), product);
            self
        }

        fn with_coupon(mut self, coupon: Coupon) -> Self {
            self.coupons.insert(coupon.code.clone(), coupon);
            self
        }
    }

    #[async_trait]
    impl CatalogProvider for FixtureCatalog {
        async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
            if self.fail {
                return Err(CatalogError::Unavailable("fixture offline".into()));
            }
            Ok(self.products.get(id.as_str()).cloned())
        }

        async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, CatalogError> {
            if self.fail {
                return Err(CatalogError::Unavailable("fixture offline".into()));
            }
            Ok(self.coupons.get(code).cloned())
        }
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::new(
            ValidationConfig::default(),
            TotalsCalculator::new(TaxConfig::disabled()),
        )
    }

    fn calculator() -> TotalsCalculator {
        TotalsCalculator::new(TaxConfig::disabled())
    }

    fn product(id: &str, cents: i64) -> Product {
        Product::new(ProductId::new(id), format!("Product {}", id), Money::new(cents, Currency::USD))
    }

    fn cart_with(items: Vec<CartItem>) -> Cart {
        let mut cart = Cart::new(SessionId::new("s"), Currency::USD);
        for item in items {
            cart.upsert_item(item, false).unwrap();
        }
        calculator().refresh(&mut cart, None);
        cart
    }

    fn line(product: &Product, quantity: i64) -> CartItem {
        CartItem::from_product(product, None, vec![], quantity).unwrap()
    }

    #[tokio::test]
    async fn test_empty_cart_is_valid_with_warning() {
        let cart = cart_with(vec![]);
        let catalog = FixtureCatalog::new();
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, IssueCode::EmptyCart);
    }

    #[tokio::test]
    async fn test_one_bad_item_does_not_taint_the_other() {
        let good = product("good", 1000).with_stock(50);
        let mut bad = product("bad", 1000);
        bad.stock_status = StockStatus::OutOfStock;

        let cart = cart_with(vec![line(&good, 1), line(&bad, 1)]);
        let good_key = cart.items[0].key.clone();
        let catalog = FixtureCatalog::new().with_product(good).with_product(bad);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::OutOfStock);
        assert_eq!(report.issues_for_item(&good_key).count(), 0);
    }

    #[tokio::test]
    async fn test_missing_product_is_an_error() {
        let ghost = product("ghost", 1000);
        let cart = cart_with(vec![line(&ghost, 1)]);
        let catalog = FixtureCatalog::new(); // product never registered
        let report = engine().validate(&cart, &catalog, None).await;

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::ProductNotFound);
    }

    #[tokio::test]
    async fn test_unpublished_product_reads_as_missing() {
        let mut p = product("draft", 1000);
        let cart = cart_with(vec![line(&p, 1)]);
        p.status = crate::catalog::ProductStatus::Draft;
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert_eq!(report.errors[0].code, IssueCode::ProductNotFound);
    }

    #[tokio::test]
    async fn test_insufficient_stock() {
        let p = product("scarce", 1000).with_stock(3);
        let cart = cart_with(vec![line(&p, 5)]);
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::InsufficientStock);
    }

    #[tokio::test]
    async fn test_zero_available_reports_out_of_stock() {
        let mut p = product("none-left", 1000).with_stock(5);
        let cart = cart_with(vec![line(&p, 2)]);
        p.stock_quantity = Some(0);
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert_eq!(report.errors[0].code, IssueCode::OutOfStock);
    }

    #[tokio::test]
    async fn test_low_stock_warning() {
        // 52 available for 50 requested: margin 2 <= max(5, 5).
        let p = product("thin", 1000).with_stock(52);
        let cart = cart_with(vec![line(&p, 50)]);
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.code == IssueCode::LowStock));
    }

    #[tokio::test]
    async fn test_backorder_warning_when_allowed() {
        let mut p = product("backorder", 1000);
        let cart = cart_with(vec![line(&p, 1)]);
        p.stock_status = StockStatus::OnBackorder;
        p.backorders_allowed = true;
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.code == IssueCode::Backorder));
    }

    #[tokio::test]
    async fn test_price_drift_warns_but_never_blocks() {
        let mut p = product("drifty", 1000);
        let cart = cart_with(vec![line(&p, 1)]);
        p.regular_price = Money::new(1250, Currency::USD);
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.code == IssueCode::PriceChanged));
    }

    #[tokio::test]
    async fn test_variation_required_for_variable_product() {
        let mut p = product("variable", 1000);
        p.kind = ProductKind::Variable;
        let cart = cart_with(vec![line(&p, 1)]);
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.errors.iter().any(|e| e.code == IssueCode::VariationNotFound));
    }

    #[tokio::test]
    async fn test_quantity_rule_violation() {
        let p = product("stepped", 1000).with_quantity_rule(crate::catalog::QuantityRule {
            min: 2,
            max: Some(10),
            step: 2,
        });
        let cart = cart_with(vec![line(&p, 3)]);
        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.errors.iter().any(|e| e.code == IssueCode::InvalidQuantity));
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_warning() {
        let p = product("unreachable", 1000);
        let cart = cart_with(vec![line(&p, 1)]);
        let mut catalog = FixtureCatalog::new().with_product(p);
        catalog.fail = true;
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.code == IssueCode::FetchFailed));
    }

    #[tokio::test]
    async fn test_expired_coupon_is_an_error() {
        let p = product("a", 10_000);
        let mut cart = cart_with(vec![line(&p, 1)]);
        let coupon = Coupon::new("OLD", CouponValue::Percent(10.0)).expires_at(1);
        cart.apply_coupon(AppliedCoupon::from_coupon(&coupon)).unwrap();
        calculator().refresh(&mut cart, None);

        let catalog = FixtureCatalog::new().with_product(p).with_coupon(coupon);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.errors.iter().any(|e| e.code == IssueCode::CouponExpired));
    }

    #[tokio::test]
    async fn test_coupon_minimum_not_met() {
        let p = product("a", 2000); // $20 subtotal
        let mut cart = cart_with(vec![line(&p, 1)]);
        let coupon = Coupon::new("MIN50", CouponValue::Percent(10.0))
            .with_minimum_amount(Money::new(5000, Currency::USD));
        cart.apply_coupon(AppliedCoupon::from_coupon(&coupon)).unwrap();
        calculator().refresh(&mut cart, None);

        let catalog = FixtureCatalog::new().with_product(p).with_coupon(coupon);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.errors.iter().any(|e| e.code == IssueCode::CouponMinimumNotMet));
    }

    #[tokio::test]
    async fn test_coupon_maximum_is_soft() {
        let p = product("a", 100_000);
        let mut cart = cart_with(vec![line(&p, 1)]);
        let coupon = Coupon::new("SMALL", CouponValue::Percent(10.0))
            .with_maximum_amount(Money::new(5000, Currency::USD));
        cart.apply_coupon(AppliedCoupon::from_coupon(&coupon)).unwrap();
        calculator().refresh(&mut cart, None);

        let catalog = FixtureCatalog::new().with_product(p).with_coupon(coupon);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.is_valid());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.code == IssueCode::CouponMaximumExceeded));
    }

    #[tokio::test]
    async fn test_individual_use_conflict() {
        let p = product("a", 10_000);
        let mut cart = cart_with(vec![line(&p, 1)]);
        let solo = Coupon::new("SOLO", CouponValue::Percent(10.0)).individual_use();
        let other = Coupon::new("OTHER", CouponValue::Percent(5.0));
        cart.apply_coupon(AppliedCoupon::from_coupon(&solo)).unwrap();
        cart.apply_coupon(AppliedCoupon::from_coupon(&other)).unwrap();
        calculator().refresh(&mut cart, None);

        let catalog = FixtureCatalog::new()
            .with_product(p)
            .with_coupon(solo)
            .with_coupon(other);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.errors.iter().any(|e| e.code == IssueCode::CouponIndividualUse));
    }

    #[tokio::test]
    async fn test_vanished_coupon_is_an_error() {
        let p = product("a", 10_000);
        let mut cart = cart_with(vec![line(&p, 1)]);
        let coupon = Coupon::new("GONE", CouponValue::Percent(10.0));
        cart.apply_coupon(AppliedCoupon::from_coupon(&coupon)).unwrap();
        calculator().refresh(&mut cart, None);

        let catalog = FixtureCatalog::new().with_product(p); // coupon not registered
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.errors.iter().any(|e| e.code == IssueCode::CouponNotFound));
    }

    #[tokio::test]
    async fn test_stale_totals_warn() {
        let p = product("a", 1000).with_stock(50);
        let mut cart = cart_with(vec![line(&p, 1)]);
        // Simulate a hand-patched total the calculator never produced.
        cart.totals.total = Money::new(9999, Currency::USD);

        let catalog = FixtureCatalog::new().with_product(p);
        let report = engine().validate(&cart, &catalog, None).await;

        assert!(report.warnings.iter().any(|w| w.code == IssueCode::TotalsMismatch));
    }
}

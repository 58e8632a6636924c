//! Validation issue codes and the validation report.

use crate::ids::ItemKey;
use serde::{Deserialize, Serialize};

/// Machine-readable validation issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    /// Product missing or not published.
    ProductNotFound,
    /// Product is out of stock.
    OutOfStock,
    /// Requested more than available stock.
    InsufficientStock,
    /// Stock will cover the request with little margin to spare.
    LowStock,
    /// Item will be fulfilled on backorder.
    Backorder,
    /// Quantity violates min/max/step or the per-line cap.
    InvalidQuantity,
    /// Current price differs from the add-time snapshot.
    PriceChanged,
    /// Variable product without a resolvable variation.
    VariationNotFound,
    /// Too many unique lines in the cart.
    CartItemLimit,
    /// Aggregate quantity above the soft ceiling.
    CartQuantityLimit,
    /// The cart has no items.
    EmptyCart,
    /// Applied coupon no longer exists.
    CouponNotFound,
    /// Applied coupon has expired.
    CouponExpired,
    /// Applied coupon's usage limit is exhausted.
    CouponUsageLimitReached,
    /// Cart subtotal below the coupon minimum.
    CouponMinimumNotMet,
    /// Cart subtotal above the coupon maximum.
    CouponMaximumExceeded,
    /// Individual-use coupon combined with other coupons.
    CouponIndividualUse,
    /// Stored totals differ from a fresh computation.
    TotalsMismatch,
    /// Live truth could not be fetched for this entry.
    FetchFailed,
}

impl IssueCode {
    /// Stable wire string for the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::ProductNotFound => "PRODUCT_NOT_FOUND",
            IssueCode::OutOfStock => "OUT_OF_STOCK",
            IssueCode::InsufficientStock => "INSUFFICIENT_STOCK",
            IssueCode::LowStock => "LOW_STOCK",
            IssueCode::Backorder => "BACKORDER",
            IssueCode::InvalidQuantity => "INVALID_QUANTITY",
            IssueCode::PriceChanged => "PRICE_CHANGED",
            IssueCode::VariationNotFound => "VARIATION_NOT_FOUND",
            IssueCode::CartItemLimit => "CART_ITEM_LIMIT",
            IssueCode::CartQuantityLimit => "CART_QUANTITY_LIMIT",
            IssueCode::EmptyCart => "EMPTY_CART",
            IssueCode::CouponNotFound => "COUPON_NOT_FOUND",
            IssueCode::CouponExpired => "COUPON_EXPIRED",
            IssueCode::CouponUsageLimitReached => "COUPON_USAGE_LIMIT_REACHED",
            IssueCode::CouponMinimumNotMet => "COUPON_MINIMUM_NOT_MET",
            IssueCode::CouponMaximumExceeded => "COUPON_MAXIMUM_EXCEEDED",
            IssueCode::CouponIndividualUse => "COUPON_INDIVIDUAL_USE",
            IssueCode::TotalsMismatch => "TOTALS_MISMATCH",
            IssueCode::FetchFailed => "FETCH_FAILED",
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Machine-readable code.
    pub code: IssueCode,
    /// Human-readable message.
    pub message: String,
    /// The cart line the issue concerns, if any.
    pub item_key: Option<ItemKey>,
    /// The coupon code the issue concerns, if any.
    pub coupon_code: Option<String>,
}

impl ValidationIssue {
    /// Issue scoped to a cart line.
    pub fn item(code: IssueCode, key: &ItemKey, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            item_key: Some(key.clone()),
            coupon_code: None,
        }
    }

    /// Issue scoped to an applied coupon.
    pub fn coupon(code: IssueCode, coupon_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            item_key: None,
            coupon_code: Some(coupon_code.into()),
        }
    }

    /// Cart-level issue.
    pub fn cart(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            item_key: None,
            coupon_code: None,
        }
    }
}

/// Outcome of validating a cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Issues that block checkout.
    pub errors: Vec<ValidationIssue>,
    /// Issues that inform but never block.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// A cart is valid when there are no errors; warnings don't count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a blocking issue.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Record a non-blocking issue.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Issues (errors and warnings) concerning a specific line.
    pub fn issues_for_item<'a>(&'a self, key: &'a ItemKey) -> impl Iterator<Item = &'a ValidationIssue> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(move |i| i.item_key.as_ref() == Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_validity() {
        let mut report = ValidationReport::default();
        assert!(report.is_valid());

        report.push_warning(ValidationIssue::cart(IssueCode::EmptyCart, "cart is empty"));
        assert!(report.is_valid());

        report.push_error(ValidationIssue::cart(IssueCode::CartItemLimit, "too many lines"));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_issues_for_item() {
        let key = ItemKey::new("abc");
        let other = ItemKey::new("def");
        let mut report = ValidationReport::default();
        report.push_error(ValidationIssue::item(IssueCode::OutOfStock, &key, "gone"));
        report.push_warning(ValidationIssue::item(IssueCode::LowStock, &other, "low"));

        assert_eq!(report.issues_for_item(&key).count(), 1);
        assert_eq!(report.issues_for_item(&other).count(), 1);
    }

    #[test]
    fn test_code_wire_strings() {
        assert_eq!(IssueCode::ProductNotFound.as_str(), "PRODUCT_NOT_FOUND");
        assert_eq!(IssueCode::TotalsMismatch.as_str(), "TOTALS_MISMATCH");
    }
}

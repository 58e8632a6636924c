//! Totals calculator.
//!
//! Stages run in a fixed order; each stage depends only on the stages
//! before it, so reordering changes the result and is a contract break:
//! subtotal, subtotal tax, discounts, contents-after-discount, shipping,
//! fees, grand total, rounding.

use crate::cart::{AppliedCoupon, Cart, CartFee, CartItem, CartTotals, ShippingMethod};
use crate::catalog::CouponValue;
use crate::money::{Currency, Money};
use crate::pricing::{CustomerTaxContext, TaxConfig};

/// Intermediate amounts are 4-decimal fixed point: 100 subunits per cent.
/// Integer accumulation keeps the pipeline deterministic and independent
/// of item ordering.
const SUBUNITS_PER_CENT: i64 = 100;

/// Pure totals pipeline over cart contents.
#[derive(Debug, Clone, Default)]
pub struct TotalsCalculator {
    tax: TaxConfig,
}

impl TotalsCalculator {
    /// Create a calculator with the given tax configuration.
    pub fn new(tax: TaxConfig) -> Self {
        Self { tax }
    }

    /// The active tax configuration.
    pub fn tax_config(&self) -> &TaxConfig {
        &self.tax
    }

    /// Compute totals for a cart.
    pub fn calculate_cart(&self, cart: &Cart, ctx: Option<&CustomerTaxContext>) -> CartTotals {
        self.calculate(
            cart.currency,
            &cart.items,
            &cart.coupons,
            &cart.shipping_methods,
            &cart.fees,
            ctx,
        )
    }

    /// Recompute a cart's derived totals in place.
    pub fn refresh(&self, cart: &mut Cart, ctx: Option<&CustomerTaxContext>) {
        let totals = self.calculate_cart(cart, ctx);
        cart.set_totals(totals);
    }

    /// Compute totals from parts.
    ///
    /// Pure and deterministic: identical inputs produce identical output,
    /// and item order never changes any total.
    pub fn calculate(
        &self,
        currency: Currency,
        items: &[CartItem],
        coupons: &[AppliedCoupon],
        shipping: &[ShippingMethod],
        fees: &[CartFee],
        ctx: Option<&CustomerTaxContext>,
    ) -> CartTotals {
        let rate = self.tax.rate_for(ctx);
        let taxed = self.tax.enabled && rate > 0.0;
        let inclusive = self.tax.prices_include_tax;

        // Stage 1: subtotal. Inclusive pricing sums the charged line
        // totals; exclusive pricing sums regular price * quantity.
        let subtotal = self.stage(
            items
                .iter()
                .map(|i| {
                    if inclusive {
                        subunits(&i.total_price)
                    } else {
                        subunits(&i.regular_price) * i.quantity
                    }
                })
                .sum(),
        );

        // Stage 2: subtotal tax, per item over the charged line total.
        let subtotal_tax = if taxed {
            self.stage(
                items
                    .iter()
                    .map(|i| {
                        let line = subunits(&i.total_price);
                        if inclusive {
                            extract_rate(line, rate)
                        } else {
                            apply_rate(line, rate)
                        }
                    })
                    .sum(),
            )
        } else {
            0
        };

        // Stage 3: discounts, per coupon over its eligible item subset.
        let discount_total = self.stage(
            coupons
                .iter()
                .map(|c| coupon_discount(c, items))
                .sum(),
        );
        let discount_tax = if taxed && !inclusive {
            self.stage(apply_rate(discount_total, rate))
        } else {
            0
        };

        // Stage 4: contents after discount.
        let cart_contents = (subtotal - discount_total).max(0);

        // Stage 5: shipping, single-method selection - first enabled wins.
        let method = shipping.iter().find(|m| m.enabled);
        let shipping_total = self.stage(method.map(|m| subunits(&m.cost)).unwrap_or(0));
        let shipping_tax = self.stage(match method {
            Some(m) if self.tax.enabled => match m.itemized_tax {
                Some(itemized) => subunits(&itemized),
                None if m.taxable && taxed => {
                    let cost = subunits(&m.cost);
                    if inclusive {
                        extract_rate(cost, rate)
                    } else {
                        apply_rate(cost, rate)
                    }
                }
                None => 0,
            },
            _ => 0,
        });

        // Stage 6: fees, taxability per fee.
        let fee_total = self.stage(fees.iter().map(|f| subunits(&f.amount)).sum());
        let fee_tax = if taxed {
            self.stage(
                fees.iter()
                    .filter(|f| f.taxable)
                    .map(|f| {
                        let amount = subunits(&f.amount);
                        if inclusive {
                            extract_rate(amount, rate)
                        } else {
                            apply_rate(amount, rate)
                        }
                    })
                    .sum(),
            )
        } else {
            0
        };

        // Stage 7: grand total. Inclusive prices already carry their tax.
        let total_tax = (subtotal_tax - discount_tax).max(0) + shipping_tax + fee_tax;
        let total = if inclusive {
            cart_contents + shipping_total + fee_total
        } else {
            cart_contents + shipping_total + fee_total + total_tax
        }
        .max(0);

        // Stage 8: presented totals are always 2-decimal.
        CartTotals {
            subtotal: to_money(subtotal, currency),
            subtotal_tax: to_money(subtotal_tax, currency),
            discount_total: to_money(discount_total, currency),
            discount_tax: to_money(discount_tax, currency),
            shipping_total: to_money(shipping_total, currency),
            shipping_tax: to_money(shipping_tax, currency),
            fee_total: to_money(fee_total, currency),
            fee_tax: to_money(fee_tax, currency),
            cart_contents_total: to_money(cart_contents, currency),
            total_tax: to_money(total_tax, currency),
            total: to_money(total, currency),
        }
    }

    /// Stage rounding: 2 decimals per stage when configured, otherwise
    /// keep the 4-decimal intermediates.
    fn stage(&self, value: i64) -> i64 {
        if self.tax.round_at_subtotal {
            round_to_cent(value) * SUBUNITS_PER_CENT
        } else {
            value
        }
    }
}

/// Discount contributed by one coupon, in subunits.
fn coupon_discount(coupon: &AppliedCoupon, items: &[CartItem]) -> i64 {
    let eligible_subtotal: i64 = items
        .iter()
        .filter(|i| coupon.applies_to(&i.product_id))
        .map(|i| subunits(&i.total_price))
        .sum();
    let eligible_quantity: i64 = items
        .iter()
        .filter(|i| coupon.applies_to(&i.product_id))
        .map(|i| i.quantity)
        .sum();

    match &coupon.value {
        CouponValue::FixedCart(amount) => subunits(amount).min(eligible_subtotal),
        CouponValue::Percent(percent) => {
            let raw = apply_rate(eligible_subtotal, percent / 100.0);
            match coupon.maximum_amount {
                Some(cap) => raw.min(subunits(&cap)),
                None => raw,
            }
        }
        CouponValue::FixedProduct(amount) => {
            (subunits(amount).saturating_mul(eligible_quantity)).min(eligible_subtotal)
        }
    }
    .max(0)
}

/// Convert a Money value to 4-decimal subunits.
fn subunits(money: &Money) -> i64 {
    money.amount_cents * SUBUNITS_PER_CENT
}

/// Multiply subunits by a rate, rounding to the nearest subunit.
fn apply_rate(value: i64, rate: f64) -> i64 {
    (value as f64 * rate).round() as i64
}

/// Extract the tax portion contained in a tax-inclusive amount.
fn extract_rate(value: i64, rate: f64) -> i64 {
    (value as f64 * rate / (1.0 + rate)).round() as i64
}

/// Round subunits to the nearest cent, half away from zero.
fn round_to_cent(value: i64) -> i64 {
    if value >= 0 {
        (value + SUBUNITS_PER_CENT / 2) / SUBUNITS_PER_CENT
    } else {
        -((-value + SUBUNITS_PER_CENT / 2) / SUBUNITS_PER_CENT)
    }
}

/// Convert subunits to presented Money (2-decimal).
fn to_money(value: i64, currency: Currency) -> Money {
    Money::new(round_to_cent(value), currency)
}

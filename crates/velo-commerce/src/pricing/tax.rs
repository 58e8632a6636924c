//! Tax configuration and rate resolution.

use serde::{Deserialize, Serialize};

/// Tax behavior for the totals pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Whether tax is computed at all.
    pub enabled: bool,
    /// Whether item prices already include tax.
    pub prices_include_tax: bool,
    /// Round each pipeline stage to 2 decimals instead of keeping
    /// 4-decimal intermediates until the final totals.
    pub round_at_subtotal: bool,
    /// Country used when the customer context supplies none.
    pub default_country: String,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prices_include_tax: false,
            round_at_subtotal: false,
            default_country: "US".to_string(),
        }
    }
}

impl TaxConfig {
    /// Tax disabled entirely.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Use tax-inclusive pricing.
    pub fn inclusive(mut self) -> Self {
        self.prices_include_tax = true;
        self
    }

    /// Round monetary values at every stage.
    pub fn rounded_at_subtotal(mut self) -> Self {
        self.round_at_subtotal = true;
        self
    }

    /// Set the fallback country.
    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = country.into();
        self
    }

    /// Resolve the tax rate for a customer.
    ///
    /// Falls back to a small built-in country table when the context does
    /// not carry an explicit rate. The table is a policy default for
    /// deriving presentable totals, not authoritative tax law.
    pub fn rate_for(&self, ctx: Option<&CustomerTaxContext>) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        if let Some(ctx) = ctx {
            if ctx.exempt {
                return 0.0;
            }
            if let Some(rate) = ctx.rate {
                return rate;
            }
            if let Some(country) = &ctx.country {
                return builtin_rate(country).unwrap_or(0.0);
            }
        }
        builtin_rate(&self.default_country).unwrap_or(0.0)
    }
}

/// Per-customer tax inputs supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerTaxContext {
    /// Customer country code (e.g., "US").
    pub country: Option<String>,
    /// Explicit tax rate (e.g., 0.20); overrides the country table.
    pub rate: Option<f64>,
    /// Tax-exempt customer.
    pub exempt: bool,
}

impl CustomerTaxContext {
    /// Context pinned to a country code.
    pub fn for_country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Self::default()
        }
    }

    /// Context with an explicit rate.
    pub fn with_rate(rate: f64) -> Self {
        Self {
            rate: Some(rate),
            ..Self::default()
        }
    }
}

/// Built-in fallback rates by country code.
fn builtin_rate(country: &str) -> Option<f64> {
    match country.to_uppercase().as_str() {
        "US" => Some(0.08),
        "CA" => Some(0.13),
        "GB" => Some(0.20),
        "DE" => Some(0.19),
        "FR" => Some(0.20),
        "AU" => Some(0.10),
        "JP" => Some(0.10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_tax_is_zero() {
        let config = TaxConfig::disabled();
        assert_eq!(config.rate_for(None), 0.0);
    }

    #[test]
    fn test_explicit_rate_wins() {
        let config = TaxConfig::default();
        let ctx = CustomerTaxContext::with_rate(0.25);
        assert_eq!(config.rate_for(Some(&ctx)), 0.25);
    }

    #[test]
    fn test_country_table_fallback() {
        let config = TaxConfig::default();
        let ctx = CustomerTaxContext::for_country("gb");
        assert_eq!(config.rate_for(Some(&ctx)), 0.20);
    }

    #[test]
    fn test_unknown_country_is_zero() {
        let config = TaxConfig::default();
        let ctx = CustomerTaxContext::for_country("ZZ");
        assert_eq!(config.rate_for(Some(&ctx)), 0.0);
    }

    #[test]
    fn test_exempt_customer() {
        let config = TaxConfig::default();
        let ctx = CustomerTaxContext {
            exempt: true,
            rate: Some(0.20),
            ..Default::default()
        };
        assert_eq!(config.rate_for(Some(&ctx)), 0.0);
    }

    #[test]
    fn test_default_country_used_without_context() {
        let config = TaxConfig::default().with_default_country("DE");
        assert_eq!(config.rate_for(None), 0.19);
    }
}

//! Service configuration.

use serde::{Deserialize, Serialize};
use velo_commerce::money::Currency;
use velo_commerce::pricing::{CustomerTaxContext, TaxConfig};
use velo_commerce::validation::ValidationConfig;
use velo_sync::ResolutionPolicy;

/// Configuration for one cart service session.
///
/// All collaborator wiring is constructor-injected; this struct carries
/// only policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Cart currency for new sessions.
    pub currency: Currency,
    /// Totals pipeline configuration.
    pub tax: TaxConfig,
    /// Validation limits.
    pub validation: ValidationConfig,
    /// Conflict resolution policy for sync.
    pub policy: ResolutionPolicy,
    /// Customer tax inputs, when known.
    pub customer_tax: Option<CustomerTaxContext>,
    /// Offline queue capacity; the oldest action is evicted beyond this.
    pub queue_capacity: usize,
    /// Replay attempts per queued action before it is dropped.
    pub max_replay_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            tax: TaxConfig::default(),
            validation: ValidationConfig::default(),
            policy: ResolutionPolicy::default(),
            customer_tax: None,
            queue_capacity: 64,
            max_replay_attempts: 3,
        }
    }
}

impl ServiceConfig {
    /// Set the conflict resolution policy.
    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the tax configuration.
    pub fn with_tax(mut self, tax: TaxConfig) -> Self {
        self.tax = tax;
        self
    }

    /// Set the customer tax context.
    pub fn with_customer_tax(mut self, ctx: CustomerTaxContext) -> Self {
        self.customer_tax = Some(ctx);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.currency, Currency::USD);
        assert_eq!(config.policy, ResolutionPolicy::MergeSmart);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.max_replay_attempts, 3);
    }
}

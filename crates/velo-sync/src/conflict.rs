//! Conflict records and resolution policies.

use serde::{Deserialize, Serialize};
use velo_commerce::ids::ItemKey;

/// How a quantity divergence between local and server is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResolutionPolicy {
    /// Keep the local quantity.
    LocalWins,
    /// Keep the server quantity.
    ServerWins,
    /// Sum both quantities ("I added more on two devices, I want both").
    MergeQuantities,
    /// Take the larger quantity; the user wants at least as many as
    /// either side recorded, never fewer.
    #[default]
    MergeSmart,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::LocalWins => "local_wins",
            ResolutionPolicy::ServerWins => "server_wins",
            ResolutionPolicy::MergeQuantities => "merge_quantities",
            ResolutionPolicy::MergeSmart => "merge_smart",
        }
    }

    /// Resolve a diverged quantity.
    pub fn resolve(&self, local: i64, server: i64) -> i64 {
        match self {
            ResolutionPolicy::LocalWins => local,
            ResolutionPolicy::ServerWins => server,
            ResolutionPolicy::MergeQuantities => local.saturating_add(server),
            ResolutionPolicy::MergeSmart => local.max(server),
        }
    }
}

/// A divergence found while merging local and server carts.
///
/// Transient: reported on the sync result and through observer events,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConflict {
    /// The line both sides hold with different quantities.
    pub item_key: ItemKey,
    /// Quantity recorded locally.
    pub local_quantity: i64,
    /// Quantity recorded on the server.
    pub server_quantity: i64,
    /// Human-readable description of the divergence.
    pub message: String,
    /// What the active policy will do about it.
    pub suggestion: String,
}

impl SyncConflict {
    /// Build a quantity conflict under the given policy.
    pub fn quantity(key: ItemKey, local: i64, server: i64, policy: ResolutionPolicy) -> Self {
        let resolved = policy.resolve(local, server);
        Self {
            message: format!(
                "item {} has quantity {} locally and {} on the server",
                key, local, server
            ),
            suggestion: format!("{} resolves the quantity to {}", policy.as_str(), resolved),
            item_key: key,
            local_quantity: local,
            server_quantity: server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_resolution() {
        assert_eq!(ResolutionPolicy::LocalWins.resolve(2, 5), 2);
        assert_eq!(ResolutionPolicy::ServerWins.resolve(2, 5), 5);
        assert_eq!(ResolutionPolicy::MergeQuantities.resolve(2, 5), 7);
        assert_eq!(ResolutionPolicy::MergeSmart.resolve(2, 5), 5);
        assert_eq!(ResolutionPolicy::MergeSmart.resolve(8, 5), 8);
    }

    #[test]
    fn test_default_policy_is_merge_smart() {
        assert_eq!(ResolutionPolicy::default(), ResolutionPolicy::MergeSmart);
    }

    #[test]
    fn test_conflict_describes_both_sides() {
        let conflict = SyncConflict::quantity(
            ItemKey::new("abc123"),
            2,
            5,
            ResolutionPolicy::MergeQuantities,
        );
        assert_eq!(conflict.local_quantity, 2);
        assert_eq!(conflict.server_quantity, 5);
        assert!(conflict.suggestion.contains("7"));
        assert!(conflict.suggestion.contains("merge_quantities"));
    }
}

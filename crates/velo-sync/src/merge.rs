//! Pure item-by-item cart merge.

use crate::{ResolutionPolicy, SyncConflict};
use serde::{Deserialize, Serialize};
use velo_commerce::cart::{Cart, MAX_QUANTITY_PER_ITEM};

/// What the merge changed relative to the local cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Server-only lines appended to the local cart.
    pub items_added: usize,
    /// Lines whose quantity was resolved through a conflict.
    pub items_updated: usize,
    /// Lines removed (always zero for a merge; kept for replay/clear
    /// reporting symmetry).
    pub items_removed: usize,
    /// Server-only coupon codes adopted.
    pub coupons_added: usize,
    /// Coupon codes dropped.
    pub coupons_removed: usize,
}

impl ChangeSummary {
    /// Whether the merge changed anything at all.
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of merging a server cart into a local cart.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The merged cart. Totals are stale; callers recompute them.
    pub cart: Cart,
    /// Every quantity divergence found, already resolved per policy.
    pub conflicts: Vec<SyncConflict>,
    /// Structured description of what changed.
    pub summary: ChangeSummary,
}

/// Merge a server-held cart into a local cart.
///
/// Pure function of its inputs:
/// - same key, same quantity: local wins (it is at least as recent, since
///   local writes always precede a sync);
/// - same key, different quantity: a [`SyncConflict`] is recorded and the
///   quantity resolved per `policy`, capped at the per-line maximum;
/// - local-only lines are kept;
/// - server-only lines are appended (additions from another device);
/// - coupons are the union of both sides, local entries taking precedence
///   on conflicting fields.
pub fn merge_carts(local: &Cart, server: &Cart, policy: ResolutionPolicy) -> MergeOutcome {
    let mut merged = local.clone();
    let mut conflicts = Vec::new();
    let mut summary = ChangeSummary::default();

    for item in merged.items.iter_mut() {
        let Some(server_item) = server.item(&item.key) else {
            continue;
        };
        if server_item.quantity == item.quantity {
            continue;
        }

        let conflict = SyncConflict::quantity(
            item.key.clone(),
            item.quantity,
            server_item.quantity,
            policy,
        );
        item.quantity = policy
            .resolve(item.quantity, server_item.quantity)
            .min(MAX_QUANTITY_PER_ITEM);
        // Quantities are bounded by the per-line cap, so this never
        // overflows.
        let _ = item.update_total();
        conflicts.push(conflict);
        summary.items_updated += 1;
    }

    for server_item in &server.items {
        if merged.item(&server_item.key).is_none() {
            merged.items.push(server_item.clone());
            summary.items_added += 1;
        }
    }

    for server_coupon in &server.coupons {
        if !merged.has_coupon(&server_coupon.code) {
            merged.coupons.push(server_coupon.clone());
            summary.coupons_added += 1;
        }
    }

    merged.touch();

    MergeOutcome {
        cart: merged,
        conflicts,
        summary,
    }
}

//! Conflict resolution for cluster merge (split-brain healing).
//!
//! When two independently-evolved replicas of a partition reconcile, every
//! conflicting key is resolved by a [`MergePolicy`]: a pure function of the
//! two sides that picks the winning value. Returning `None` is a tombstone
//! decision — the entry is removed on the surviving side.
//!
//! Policies see both sides through [`MergingView`]s, so a policy that only
//! inspects statistics (timestamps, hit counts) never deserializes either
//! value.

use crate::types::Value;
use crate::view::MergingView;

/// Resolves one conflicting key during cluster merge.
///
/// Must be deterministic and stateless: given the same two sides, every
/// node must pick the same winner or the cluster will not converge.
///
/// Used as `Arc<dyn MergePolicy>` / `&dyn MergePolicy`.
pub trait MergePolicy: Send + Sync {
    /// Picks the winning value for a conflicting key, or `None` to remove
    /// the entry.
    fn merge(
        &self,
        map_name: &str,
        merging: &MergingView<'_>,
        existing: &MergingView<'_>,
    ) -> Option<Value>;
}

/// Always adopts the incoming entry, tombstones included.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughMergePolicy;

impl MergePolicy for PassThroughMergePolicy {
    fn merge(
        &self,
        _map_name: &str,
        merging: &MergingView<'_>,
        _existing: &MergingView<'_>,
    ) -> Option<Value> {
        merging.value().cloned()
    }
}

/// Keeps the existing entry when one exists; adopts the incoming entry only
/// for keys the local side has never seen.
#[derive(Debug, Default, Clone, Copy)]
pub struct PutIfAbsentMergePolicy;

impl MergePolicy for PutIfAbsentMergePolicy {
    fn merge(
        &self,
        _map_name: &str,
        merging: &MergingView<'_>,
        existing: &MergingView<'_>,
    ) -> Option<Value> {
        if existing.is_present() {
            existing.value().cloned()
        } else {
            merging.value().cloned()
        }
    }
}

/// Last-writer-wins by update timestamp.
///
/// Ties go to the incoming side, so a replica that re-applied the same
/// write converges instead of ping-ponging.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatestUpdateMergePolicy;

impl MergePolicy for LatestUpdateMergePolicy {
    fn merge(
        &self,
        _map_name: &str,
        merging: &MergingView<'_>,
        existing: &MergingView<'_>,
    ) -> Option<Value> {
        if merging.stats().last_update_time >= existing.stats().last_update_time {
            merging.value().cloned()
        } else {
            existing.value().cloned()
        }
    }
}

/// Keeps whichever side served more reads.
///
/// Useful when a network partition split traffic unevenly: the hotter copy
/// is more likely to be the one applications saw last.
#[derive(Debug, Default, Clone, Copy)]
pub struct HigherHitsMergePolicy;

impl MergePolicy for HigherHitsMergePolicy {
    fn merge(
        &self,
        _map_name: &str,
        merging: &MergingView<'_>,
        existing: &MergingView<'_>,
    ) -> Option<Value> {
        if merging.stats().hits >= existing.stats().hits {
            merging.value().cloned()
        } else {
            existing.value().cloned()
        }
    }
}

//! Per-key lock manager pass-through.
//!
//! The record store never acquires locks on its own behalf; it forwards
//! lock queries and mutations to an externally-owned [`LockStore`] and
//! honors locked keys during bulk eviction and clear. Absence of a lock
//! store (`None` at wiring time) means always unlocked, always acquirable.

use std::collections::HashSet;

use gridmap_core::Data;

/// Per-key pessimistic lock state for one partition's namespace.
///
/// Externally owned and injected; used as `Arc<dyn LockStore>`.
pub trait LockStore: Send + Sync {
    /// Acquires or re-enters a transactional lock. Returns whether the
    /// caller holds the lock afterwards.
    fn txn_lock(
        &self,
        key: &Data,
        caller: &str,
        thread_id: u64,
        reference_id: u64,
        lease_millis: i64,
    ) -> bool;

    /// Extends the lease of a held lock.
    fn extend_lease_time(&self, key: &Data, caller: &str, thread_id: u64, lease_millis: i64)
        -> bool;

    /// Releases a held lock. Returns whether a lock was released.
    fn unlock(&self, key: &Data, caller: &str, thread_id: u64, reference_id: u64) -> bool;

    /// Forcibly releases a lock regardless of owner.
    fn force_unlock(&self, key: &Data) -> bool;

    /// Whether the key is locked by anyone.
    fn is_locked(&self, key: &Data) -> bool;

    /// Whether the key is locked by an active transaction.
    fn is_transactionally_locked(&self, key: &Data) -> bool;

    /// Whether the caller could acquire the lock right now.
    fn can_acquire_lock(&self, key: &Data, caller: &str, thread_id: u64) -> bool;

    /// Human-readable owner description for diagnostics.
    fn owner_info(&self, key: &Data) -> Option<String>;

    /// All currently locked keys in this partition's namespace.
    fn locked_keys(&self) -> HashSet<Data>;

    /// Drops the partition's lock namespace. Called when the partition
    /// itself is cleared or destroyed.
    fn clear(&self);
}

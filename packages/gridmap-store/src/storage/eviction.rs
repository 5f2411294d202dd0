//! Eviction capability.
//!
//! Eviction behavior is composed into the record store, not inherited: the
//! store holds an [`EvictionChecker`] and consults it at well-defined
//! extension points (currently the put-from-load admission check). Which
//! records to evict stays with the external eviction-selection policy —
//! this module only answers "is this partition under pressure?".

/// Decides whether the partition is under enough memory pressure that
/// eviction should run.
///
/// Injected as `Arc<dyn EvictionChecker>`.
pub trait EvictionChecker: Send + Sync {
    /// Whether eviction should be triggered given the partition's current
    /// entry count and estimated heap cost.
    fn should_evict(&self, entry_count: usize, heap_cost: u64) -> bool;
}

/// Checker for maps with no eviction configured.
pub struct NeverEvict;

impl EvictionChecker for NeverEvict {
    fn should_evict(&self, _entry_count: usize, _heap_cost: u64) -> bool {
        false
    }
}

/// Triggers eviction once the partition holds `max_entry_count` entries.
pub struct EntryCountEvictionChecker {
    max_entry_count: u64,
}

impl EntryCountEvictionChecker {
    /// Creates a checker with the given per-partition entry limit.
    /// A limit of 0 means unlimited.
    #[must_use]
    pub fn new(max_entry_count: u64) -> Self {
        Self { max_entry_count }
    }
}

impl EvictionChecker for EntryCountEvictionChecker {
    fn should_evict(&self, entry_count: usize, _heap_cost: u64) -> bool {
        self.max_entry_count > 0 && entry_count as u64 >= self.max_entry_count
    }
}

//! Secondary-index pass-through.
//!
//! The record store does not own index storage; it reports add/remove
//! events to an externally-owned [`IndexRegistry`] so secondary indexes
//! stay consistent with every mutation. Backup paths never report —
//! backups do not serve queries.

use gridmap_core::Data;

/// Secondary-index engine view for one map.
///
/// Externally owned and injected; used as `Arc<dyn IndexRegistry>`.
/// `has_index()` gates all calls so an index-less map pays nothing.
pub trait IndexRegistry: Send + Sync {
    /// Whether any index is registered for the map.
    fn has_index(&self) -> bool;

    /// Reports a written entry: the new value and, on update, the value it
    /// replaced.
    fn save_entry_index(&self, key: &Data, new_value: &Data, old_value: Option<&Data>);

    /// Reports a removed entry.
    fn remove_entry_index(&self, key: &Data, value: &Data);
}

/// Registry for maps with no indexes configured. All calls are no-ops.
pub struct NoIndexes;

impl IndexRegistry for NoIndexes {
    fn has_index(&self) -> bool {
        false
    }

    fn save_entry_index(&self, _key: &Data, _new_value: &Data, _old_value: Option<&Data>) {}

    fn remove_entry_index(&self, _key: &Data, _value: &Data) {}
}

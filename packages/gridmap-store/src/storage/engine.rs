//! Low-level storage engine trait.
//!
//! Defines [`StorageEngine`], the innermost storage layer: a plain
//! key-to-record mapping owned by one partition. Implementations are
//! in-memory and return cloned snapshots, never live references, so
//! monitoring threads can read concurrently with the partition writer.

use gridmap_core::Data;

use super::record::Record;

/// Low-level keyed record storage for one partition.
///
/// No durability, no expiry, no locking of its own: those concerns live in
/// the [`RecordStore`](super::RecordStore) layer above. All operations are
/// synchronous.
///
/// Wrapped in `Arc<dyn StorageEngine>` for sharing with background loaders.
pub trait StorageEngine: Send + Sync + 'static {
    /// Insert or replace a record by key. Returns the previous record if any.
    fn put(&self, key: &Data, record: Record) -> Option<Record>;

    /// Retrieve a snapshot of the record for a key, or `None`.
    fn get(&self, key: &Data) -> Option<Record>;

    /// Remove a record by key, returning the removed record.
    fn remove(&self, key: &Data) -> Option<Record>;

    /// Check if a key exists without cloning the record.
    fn contains_key(&self, key: &Data) -> bool;

    /// Number of entries, expired-but-unpurged included.
    fn len(&self) -> usize;

    /// Whether the storage is empty.
    fn is_empty(&self) -> bool;

    /// Remove all entries. Takes `&self` for `Arc<dyn StorageEngine>`
    /// compatibility.
    fn clear(&self);

    /// Destroy the storage, releasing all resources. Takes `&self`.
    fn destroy(&self);

    /// Estimated heap cost of all stored entries in bytes.
    fn estimated_cost(&self) -> u64;

    /// Point-in-time snapshot of all entries.
    ///
    /// Mutation-tolerant: concurrent modifications do not fail the snapshot.
    fn snapshot(&self) -> Vec<(Data, Record)>;
}

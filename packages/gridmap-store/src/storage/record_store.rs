//! Per-map-per-partition record store trait.
//!
//! Defines [`RecordStore`], the authoritative interface for one partition
//! of a distributed map. It composes the in-memory
//! [`StorageEngine`](super::StorageEngine) with the
//! [`MapDataStore`](super::MapDataStore) persistence adapter, the index and
//! lock pass-throughs, the interceptor chain, the eviction capability, and
//! the asynchronous loading lifecycle.
//!
//! Every operation with full-data-set semantics consults the load gate
//! first and fails fast with [`StoreError::Retryable`] while the partition
//! is still loading; the caller's own retry loop re-submits.
//!
//! [`StoreError::Retryable`]: crate::error::StoreError::Retryable

use async_trait::async_trait;
use gridmap_core::partition::PARTITION_COUNT;
use gridmap_core::{Data, EntryView, MergePolicy};

use crate::error::StoreResult;
use crate::storage::loader::KeyLoadCallback;
use crate::storage::record::Record;

/// Configuration for storage behavior, applied per record store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Default TTL in milliseconds applied when a write passes 0. 0 = none.
    pub default_ttl_millis: u64,
    /// Batch size for bulk loads from the backing store.
    pub load_batch_size: usize,
    /// Number of partitions the map's key space is sharded into.
    pub partition_count: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_ttl_millis: 0,
            load_batch_size: 100,
            partition_count: PARTITION_COUNT,
        }
    }
}

/// Per-map-per-partition record store.
///
/// All mutations run on the partition's single logical writer; the trait
/// only has to tolerate concurrent read-only monitoring. Used as
/// `Box<dyn RecordStore>`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Name of the map this record store manages.
    fn name(&self) -> &str;

    /// Partition ID this record store belongs to.
    fn partition_id(&self) -> u32;

    // --- Read path ---

    /// Returns the current value if present and unexpired, loading it from
    /// the backing store on a miss. Applies the get interceptors and, for
    /// found non-backup records, refreshes the access statistics.
    async fn get(&self, key: &Data, backup: bool) -> StoreResult<Option<Data>>;

    /// Like `get` without interceptors; materializes a record when the key
    /// is absent in memory but present in the backing store.
    async fn contains_key(&self, key: &Data) -> StoreResult<bool>;

    /// Full scan of live records for a value, by value equality.
    async fn contains_value(&self, value: &Data) -> StoreResult<bool>;

    /// Batched read: memory hits are returned directly, the remaining keys
    /// are loaded from the backing store in one batch and materialized into
    /// storage as a side effect.
    async fn get_all(&self, keys: Vec<Data>) -> StoreResult<Vec<(Data, Data)>>;

    /// Like `get` but returns the key/value pair, loading on miss.
    async fn get_map_entry(&self, key: &Data, now: i64) -> StoreResult<(Data, Option<Data>)>;

    /// Backup-side read: no interception, no access-stat refresh, no purge.
    /// Expired records read as absent.
    fn read_backup_data(&self, key: &Data) -> Option<Data>;

    /// Snapshot of all unexpired entries.
    fn entry_set_data(&self) -> StoreResult<Vec<(Data, Data)>>;

    /// Snapshot of all unexpired keys.
    fn key_set(&self) -> StoreResult<Vec<Data>>;

    /// Raw record snapshot, expiry-blind. Monitoring/migration use only.
    fn get_record(&self, key: &Data) -> Option<Record>;

    /// Number of entries. Eventually accurate under lazy expiration; no
    /// load gate, the loading path itself depends on it.
    fn size(&self) -> usize;

    /// Whether the store holds no entries.
    fn is_empty(&self) -> StoreResult<bool>;

    // --- Write path ---

    /// Puts a value, resolving the previous value from memory or the
    /// backing store. Returns the previous value.
    async fn put(&self, key: &Data, value: Data, ttl_millis: u64) -> StoreResult<Option<Data>>;

    /// Write-only `put` that never consults the backing store for the
    /// previous value. Returns whether the key was previously absent.
    async fn set(&self, key: &Data, value: Data, ttl_millis: u64) -> StoreResult<bool>;

    /// Puts only when no existing value is found in memory or the backing
    /// store. Returns the existing value otherwise.
    async fn put_if_absent(
        &self,
        key: &Data,
        value: Data,
        ttl_millis: u64,
    ) -> StoreResult<Option<Data>>;

    /// Replaces the value of an existing in-memory record. Cache-only: an
    /// absent key is never resolved from the backing store.
    async fn replace(&self, key: &Data, update: Data) -> StoreResult<Option<Data>>;

    /// Compare-and-swap: replaces only when the current value equals
    /// `expect` by value equality.
    async fn replace_if_same(&self, key: &Data, expect: &Data, update: Data) -> StoreResult<bool>;

    /// Removes a record, returning the previous value. An absent key is
    /// still removed from the backing store for eventual consistency with
    /// out-of-band entries.
    async fn remove(&self, key: &Data) -> StoreResult<Option<Data>>;

    /// Removes only when the current value equals `test_value`.
    async fn remove_if_same(&self, key: &Data, test_value: &Data) -> StoreResult<bool>;

    /// Removes a record, reporting whether one was removed from memory.
    async fn delete(&self, key: &Data) -> StoreResult<bool>;

    /// Writes in memory and marks the key transient in the persistence
    /// adapter: the value is tracked but never durably persisted.
    async fn put_transient(&self, key: &Data, value: Data, ttl_millis: u64) -> StoreResult<()>;

    /// Write path used exclusively by the loading subsystem. Skipped
    /// entirely while the partition is under eviction pressure, since
    /// loaded data that would be immediately evicted is wasted work.
    fn put_from_load(&self, key: &Data, value: Data, ttl_millis: u64) -> Option<Data>;

    /// Backup-replica write: bypasses interceptors and index maintenance,
    /// transient vs durable explicit.
    async fn put_backup(
        &self,
        key: &Data,
        value: Data,
        ttl_millis: u64,
        transient: bool,
    ) -> StoreResult<()>;

    /// Backup-replica removal.
    async fn remove_backup(&self, key: &Data) -> StoreResult<()>;

    // --- Merge ---

    /// Resolves one conflicting key during cluster merge using the given
    /// policy. Returns whether the merge changed or confirmed this store's
    /// state; a policy-decided removal reports success.
    async fn merge(
        &self,
        key: &Data,
        incoming: EntryView,
        policy: &dyn MergePolicy,
    ) -> StoreResult<bool>;

    // --- Lock pass-through ---

    /// Acquires a transactional lock. Gated on load completion.
    fn txn_lock(
        &self,
        key: &Data,
        caller: &str,
        thread_id: u64,
        reference_id: u64,
        lease_millis: i64,
    ) -> StoreResult<bool>;

    /// Extends a held lock's lease. Gated on load completion.
    fn extend_lock(
        &self,
        key: &Data,
        caller: &str,
        thread_id: u64,
        lease_millis: i64,
    ) -> StoreResult<bool>;

    /// Releases a held lock. Gated on load completion.
    fn unlock(
        &self,
        key: &Data,
        caller: &str,
        thread_id: u64,
        reference_id: u64,
    ) -> StoreResult<bool>;

    /// Forcibly releases a lock regardless of owner.
    fn force_unlock(&self, key: &Data) -> bool;

    /// Whether the key is locked.
    fn is_locked(&self, key: &Data) -> bool;

    /// Whether the key is locked by an active transaction.
    fn is_transactionally_locked(&self, key: &Data) -> bool;

    /// Whether the caller could acquire the lock. True without a lock store.
    fn can_acquire_lock(&self, key: &Data, caller: &str, thread_id: u64) -> bool;

    /// Lock owner description for diagnostics.
    fn lock_owner_info(&self, key: &Data) -> Option<String>;

    // --- Loading lifecycle ---

    /// Triggers the initial bulk load when a real loader is configured.
    fn start_loading(&self);

    /// Triggers a bulk (re)load of all keys.
    fn load_all(&self, replace_existing: bool);

    /// Triggers loading of an explicit key set.
    fn load_all_from_store(&self, keys: Vec<Data>, replace_existing: bool);

    /// Relays batch completion/failure to the key-loading subsystem.
    fn update_load_status(&self, last_batch: bool, error: Option<&anyhow::Error>);

    /// Triggers the initial load only if it has not started yet.
    fn maybe_do_initial_load(&self);

    /// The central load gate. Ok once every tracked load has been drained;
    /// `Retryable` while loads are pending; a drained failure is surfaced
    /// exactly once as `LoadFailed`.
    fn check_if_loaded(&self) -> StoreResult<()>;

    /// Non-blocking load check for monitoring and query threads.
    fn is_loaded(&self) -> bool;

    /// Registers a callback fired when key loading finishes.
    fn on_key_load(&self, callback: KeyLoadCallback);

    // --- Expiry & eviction ---

    /// Whether any record with a TTL has been written.
    fn is_expirable(&self) -> bool;

    /// Whether the eviction capability reports memory pressure.
    fn should_evict(&self) -> bool;

    /// Flush-then-remove a single record chosen by the external eviction
    /// policy. Returns the evicted value.
    async fn evict(&self, key: &Data, backup: bool) -> StoreResult<Option<Data>>;

    /// Evicts every record not currently locked, flushing them first.
    /// Returns the eviction count.
    async fn evict_all(&self, backup: bool) -> StoreResult<usize>;

    /// Removes expired entries, up to `percentage` percent of all entries.
    /// Returns the number removed.
    fn evict_expired(&self, percentage: u32, now: i64, backup: bool) -> usize;

    // --- Lifecycle ---

    /// Empties the map: removes all unlocked records from memory and the
    /// backing store. Locked keys survive. Returns the removal count.
    async fn clear(&self) -> StoreResult<usize>;

    /// Drains buffered write-behind entries to the backing store and marks
    /// the flushed records clean.
    async fn flush(&self) -> StoreResult<()>;

    /// Unconditional wipe of records and adapter buffers. Used on partition
    /// ownership loss, not a user-facing clear.
    fn reset(&self);

    /// Tears down the partition's state: lock namespace, index entries,
    /// adapter buffers, and storage. Used when the partition is being
    /// destroyed or migrated away.
    fn clear_partition(&self);

    /// Terminal operation: clears the partition and destroys storage.
    fn destroy(&self);
}

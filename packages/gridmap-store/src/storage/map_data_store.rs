//! Persistence adapter traits for the storage layer.
//!
//! [`MapDataStore`] abstracts the three persistence strategies (none,
//! write-through, write-behind) behind one interface. The
//! [`RecordStore`](super::RecordStore) calls it on every mutation; the
//! implementation decides when the user-supplied [`EntryStore`] actually
//! sees the data.

use async_trait::async_trait;
use gridmap_core::Data;

/// Tag identifying a [`MapDataStore`] implementation's strategy.
///
/// Callers skip persistence work entirely when the tag is [`NoStore`]; the
/// tag is the only sanctioned way to detect the no-op adapter (never
/// pointer identity).
///
/// [`NoStore`]: StoreStrategy::NoStore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStrategy {
    /// No backing store configured; every operation is a no-op.
    NoStore,
    /// Every mutation reaches the [`EntryStore`] before the operation returns.
    WriteThrough,
    /// Mutations are queued and drained to the [`EntryStore`] by `flush`.
    WriteBehind,
}

/// Persistence backend view for one map.
///
/// Shared across all partitions of the map as `Arc<dyn MapDataStore>`; the
/// record store never assumes exclusive access.
#[async_trait]
pub trait MapDataStore: Send + Sync {
    /// Which strategy this adapter implements.
    fn strategy(&self) -> StoreStrategy;

    /// Load a single value from the backing store. `None` if absent.
    async fn load(&self, key: &Data) -> anyhow::Result<Option<Data>>;

    /// Load multiple values from the backing store in one batch.
    async fn load_all(&self, keys: &[Data]) -> anyhow::Result<Vec<(Data, Data)>>;

    /// Persist a value (or queue it), returning the value as stored.
    async fn add(&self, key: &Data, value: Data, now: i64) -> anyhow::Result<Data>;

    /// Mark a key transient: tracked by the adapter but never persisted.
    async fn add_transient(&self, key: &Data, now: i64) -> anyhow::Result<()>;

    /// Record a backup-replica write. Backups never reach the
    /// [`EntryStore`]; only the partition owner persists.
    async fn add_backup(&self, key: &Data, value: &Data, now: i64) -> anyhow::Result<()>;

    /// Remove a key from the backing store (or queue the removal).
    async fn remove(&self, key: &Data, now: i64) -> anyhow::Result<()>;

    /// Record a backup-replica removal.
    async fn remove_backup(&self, key: &Data, now: i64) -> anyhow::Result<()>;

    /// Remove all given keys from the backing store.
    async fn remove_all(&self, keys: &[Data]) -> anyhow::Result<()>;

    /// Drain all buffered operations to the [`EntryStore`].
    ///
    /// Returns the keys whose pending writes were persisted, so the record
    /// store can mark their records clean.
    async fn flush(&self) -> anyhow::Result<Vec<Data>>;

    /// Persist a single key immediately (used while evicting it).
    async fn flush_key(&self, key: &Data, value: &Data, backup: bool) -> anyhow::Result<()>;

    /// Whether a load for this key may hit the backing store. False while
    /// the key has queued or transient state that would be overwritten.
    fn loadable(&self, key: &Data) -> bool;

    /// Number of buffered operations not yet flushed.
    fn pending_operation_count(&self) -> usize;

    /// Drop all buffered state. Never touches the [`EntryStore`] itself.
    fn clear(&self);
}

/// User-supplied durability backend for one map.
///
/// The loader half (`load*`) feeds the record store's loading lifecycle;
/// the store half (`store*`/`delete*`) receives writes according to the
/// adapter strategy wrapped around it.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Load the value for one key. `None` if absent.
    async fn load(&self, key: &Data) -> anyhow::Result<Option<Data>>;

    /// Load values for a batch of keys. Absent keys are omitted.
    async fn load_all(&self, keys: &[Data]) -> anyhow::Result<Vec<(Data, Data)>>;

    /// Enumerate every key in the backing store, across all partitions.
    async fn load_all_keys(&self) -> anyhow::Result<Vec<Data>>;

    /// Persist one entry.
    async fn store(&self, key: &Data, value: &Data) -> anyhow::Result<()>;

    /// Persist a batch of entries.
    async fn store_all(&self, entries: &[(Data, Data)]) -> anyhow::Result<()>;

    /// Delete one entry.
    async fn delete(&self, key: &Data) -> anyhow::Result<()>;

    /// Delete a batch of entries.
    async fn delete_all(&self, keys: &[Data]) -> anyhow::Result<()>;
}

//! Write-through [`MapDataStore`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use gridmap_core::Data;

use crate::storage::map_data_store::{EntryStore, MapDataStore, StoreStrategy};

/// Synchronous persistence: every mutation reaches the [`EntryStore`]
/// before the operation returns.
///
/// Nothing is ever buffered, so `flush` has nothing to report and
/// `flush_key` (the pre-eviction flush) is a no-op — the evicted value is
/// already durable.
pub struct WriteThroughDataStore {
    external: Arc<dyn EntryStore>,
}

impl WriteThroughDataStore {
    /// Wraps a user-supplied entry store with write-through semantics.
    #[must_use]
    pub fn new(external: Arc<dyn EntryStore>) -> Self {
        Self { external }
    }
}

#[async_trait]
impl MapDataStore for WriteThroughDataStore {
    fn strategy(&self) -> StoreStrategy {
        StoreStrategy::WriteThrough
    }

    async fn load(&self, key: &Data) -> anyhow::Result<Option<Data>> {
        self.external.load(key).await
    }

    async fn load_all(&self, keys: &[Data]) -> anyhow::Result<Vec<(Data, Data)>> {
        self.external.load_all(keys).await
    }

    async fn add(&self, key: &Data, value: Data, _now: i64) -> anyhow::Result<Data> {
        self.external.store(key, &value).await?;
        Ok(value)
    }

    async fn add_transient(&self, _key: &Data, _now: i64) -> anyhow::Result<()> {
        // Transient writes are memory-only; with nothing buffered there is
        // nothing to track either.
        Ok(())
    }

    async fn add_backup(&self, _key: &Data, _value: &Data, _now: i64) -> anyhow::Result<()> {
        // Only the partition owner persists.
        Ok(())
    }

    async fn remove(&self, key: &Data, _now: i64) -> anyhow::Result<()> {
        self.external.delete(key).await
    }

    async fn remove_backup(&self, _key: &Data, _now: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn remove_all(&self, keys: &[Data]) -> anyhow::Result<()> {
        self.external.delete_all(keys).await
    }

    async fn flush(&self) -> anyhow::Result<Vec<Data>> {
        Ok(Vec::new())
    }

    async fn flush_key(&self, _key: &Data, _value: &Data, _backup: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn loadable(&self, _key: &Data) -> bool {
        true
    }

    fn pending_operation_count(&self) -> usize {
        0
    }

    fn clear(&self) {
        // Nothing buffered.
    }
}

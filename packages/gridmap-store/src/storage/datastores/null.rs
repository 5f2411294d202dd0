//! No-op [`MapDataStore`] implementation.
//!
//! [`NullDataStore`] is the designated "no backing store configured"
//! adapter: writes are discarded, reads are empty. Callers detect it by
//! its [`StoreStrategy::NoStore`] tag and skip persistence work entirely.

use async_trait::async_trait;
use gridmap_core::Data;

use crate::storage::map_data_store::{MapDataStore, StoreStrategy};

/// No-op `MapDataStore` for maps without persistence.
///
/// All write operations succeed immediately without side effects; all read
/// operations return empty results.
pub struct NullDataStore;

#[async_trait]
impl MapDataStore for NullDataStore {
    fn strategy(&self) -> StoreStrategy {
        StoreStrategy::NoStore
    }

    async fn load(&self, _key: &Data) -> anyhow::Result<Option<Data>> {
        Ok(None)
    }

    async fn load_all(&self, _keys: &[Data]) -> anyhow::Result<Vec<(Data, Data)>> {
        Ok(Vec::new())
    }

    async fn add(&self, _key: &Data, value: Data, _now: i64) -> anyhow::Result<Data> {
        Ok(value)
    }

    async fn add_transient(&self, _key: &Data, _now: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn add_backup(&self, _key: &Data, _value: &Data, _now: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn remove(&self, _key: &Data, _now: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn remove_backup(&self, _key: &Data, _now: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn remove_all(&self, _keys: &[Data]) -> anyhow::Result<()> {
        Ok(())
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
        // Nothing buffered — NullDataStore holds no state.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Data {
        Data::from_bytes(b"key".to_vec())
    }

    fn value() -> Data {
        Data::from_bytes(b"value".to_vec())
    }

    #[test]
    fn strategy_is_no_store() {
        assert_eq!(NullDataStore.strategy(), StoreStrategy::NoStore);
    }

    #[tokio::test]
    async fn add_passes_the_value_through() {
        let stored = NullDataStore.add(&key(), value(), 1_000).await.unwrap();
        assert_eq!(stored, value());
    }

    #[tokio::test]
    async fn reads_are_empty() {
        assert!(NullDataStore.load(&key()).await.unwrap().is_none());
        assert!(NullDataStore.load_all(&[key()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_and_flushes_are_no_ops() {
        let store = NullDataStore;
        store.add_transient(&key(), 0).await.unwrap();
        store.add_backup(&key(), &value(), 0).await.unwrap();
        store.remove(&key(), 0).await.unwrap();
        store.remove_backup(&key(), 0).await.unwrap();
        store.remove_all(&[key()]).await.unwrap();
        store.flush_key(&key(), &value(), false).await.unwrap();

        assert!(store.flush().await.unwrap().is_empty());
        assert_eq!(store.pending_operation_count(), 0);
        assert!(store.loadable(&key()));
    }
}

//! Write-behind [`MapDataStore`] implementation.
//!
//! Mutations are queued as [`DelayedEntry`] items and drained to the
//! [`EntryStore`] by `flush`. Reads answer from the queue first so a
//! just-written value is never shadowed by a stale persisted one.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use gridmap_core::Data;
use parking_lot::Mutex;

use crate::storage::map_data_store::{EntryStore, MapDataStore, StoreStrategy};

/// One queued mutation. `value: None` is a queued removal.
#[derive(Debug, Clone)]
struct DelayedEntry {
    key: Data,
    value: Option<Data>,
    /// When the mutation was queued; reported when a flush fails.
    queued_at: i64,
}

/// Buffered adapter state: the coalesced operation queue plus the set of
/// keys marked transient (tracked, never persisted).
#[derive(Default)]
struct BufferState {
    queue: VecDeque<DelayedEntry>,
    transient: HashSet<Data>,
}

impl BufferState {
    /// Coalesces to at most one queued operation per key, newest wins.
    fn enqueue(&mut self, key: &Data, value: Option<Data>, now: i64) {
        self.queue.retain(|entry| entry.key != *key);
        self.queue.push_back(DelayedEntry {
            key: key.clone(),
            value,
            queued_at: now,
        });
        self.transient.remove(key);
    }

    fn queued_for(&self, key: &Data) -> Option<&DelayedEntry> {
        self.queue.iter().find(|entry| entry.key == *key)
    }
}

/// Queued persistence: mutations buffer in memory and reach the
/// [`EntryStore`] when `flush` drains the queue.
pub struct WriteBehindDataStore {
    external: Arc<dyn EntryStore>,
    state: Mutex<BufferState>,
}

impl WriteBehindDataStore {
    /// Wraps a user-supplied entry store with write-behind semantics.
    #[must_use]
    pub fn new(external: Arc<dyn EntryStore>) -> Self {
        Self {
            external,
            state: Mutex::new(BufferState::default()),
        }
    }
}

#[async_trait]
impl MapDataStore for WriteBehindDataStore {
    fn strategy(&self) -> StoreStrategy {
        StoreStrategy::WriteBehind
    }

    async fn load(&self, key: &Data) -> anyhow::Result<Option<Data>> {
        // Queue first: a queued write or removal supersedes persisted state.
        {
            let state = self.state.lock();
            if state.transient.contains(key) {
                return Ok(None);
            }
            if let Some(entry) = state.queued_for(key) {
                return Ok(entry.value.clone());
            }
        }
        self.external.load(key).await
    }

    async fn load_all(&self, keys: &[Data]) -> anyhow::Result<Vec<(Data, Data)>> {
        let mut results = Vec::new();
        let mut misses = Vec::new();
        {
            let state = self.state.lock();
            for key in keys {
                if state.transient.contains(key) {
                    continue;
                }
                match state.queued_for(key) {
                    Some(entry) => {
                        if let Some(value) = &entry.value {
                            results.push((key.clone(), value.clone()));
                        }
                        // Queued removal: absent, do not consult the store.
                    }
                    None => misses.push(key.clone()),
                }
            }
        }
        if !misses.is_empty() {
            results.extend(self.external.load_all(&misses).await?);
        }
        Ok(results)
    }

    async fn add(&self, key: &Data, value: Data, now: i64) -> anyhow::Result<Data> {
        self.state.lock().enqueue(key, Some(value.clone()), now);
        Ok(value)
    }

    async fn add_transient(&self, key: &Data, _now: i64) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        // A transient write supersedes any queued durable one; flushing the
        // stale queued value would resurrect it in the backing store.
        state.queue.retain(|entry| entry.key != *key);
        state.transient.insert(key.clone());
        Ok(())
    }

    async fn add_backup(&self, _key: &Data, _value: &Data, _now: i64) -> anyhow::Result<()> {
        // Only the partition owner persists.
        Ok(())
    }

    async fn remove(&self, key: &Data, now: i64) -> anyhow::Result<()> {
        self.state.lock().enqueue(key, None, now);
        Ok(())
    }

    async fn remove_backup(&self, _key: &Data, _now: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn remove_all(&self, keys: &[Data]) -> anyhow::Result<()> {
        let now = crate::storage::now_millis();
        let mut state = self.state.lock();
        for key in keys {
            state.enqueue(key, None, now);
        }
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<Vec<Data>> {
        let drained: Vec<DelayedEntry> = {
            let mut state = self.state.lock();
            state.transient.clear();
            state.queue.drain(..).collect()
        };
        if drained.is_empty() {
            return Ok(Vec::new());
        }

        let mut upserts = Vec::new();
        let mut deletes = Vec::new();
        for entry in &drained {
            match &entry.value {
                Some(value) => upserts.push((entry.key.clone(), value.clone())),
                None => deletes.push(entry.key.clone()),
            }
        }

        let result: anyhow::Result<()> = async {
            if !upserts.is_empty() {
                self.external.store_all(&upserts).await?;
            }
            if !deletes.is_empty() {
                self.external.delete_all(&deletes).await?;
            }
            Ok(())
        }
        .await;

        if let Err(err) = result {
            let oldest = drained.iter().map(|e| e.queued_at).min().unwrap_or(0);
            tracing::warn!(error = %err, oldest_queued_at = oldest,
                "write-behind flush failed, re-queueing drained entries");
            let mut state = self.state.lock();
            for entry in drained.into_iter().rev() {
                state.queue.push_front(entry);
            }
            return Err(err);
        }

        Ok(upserts.into_iter().map(|(key, _)| key).collect())
    }

    async fn flush_key(&self, key: &Data, value: &Data, backup: bool) -> anyhow::Result<()> {
        if backup {
            return Ok(());
        }
        self.external.store(key, value).await?;
        let mut state = self.state.lock();
        state.queue.retain(|entry| entry.key != *key);
        state.transient.remove(key);
        Ok(())
    }

    fn loadable(&self, key: &Data) -> bool {
        let state = self.state.lock();
        state.queued_for(key).is_none() && !state.transient.contains(key)
    }

    fn pending_operation_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.queue.clear();
        state.transient.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::datastores::testing::RecordingEntryStore;

    fn key(name: &str) -> Data {
        Data::from_bytes(name.as_bytes().to_vec())
    }

    fn value(name: &str) -> Data {
        Data::from_bytes(name.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn add_buffers_until_flush() {
        let external = Arc::new(RecordingEntryStore::default());
        let store = WriteBehindDataStore::new(external.clone());

        store.add(&key("a"), value("1"), 1_000).await.unwrap();
        assert_eq!(external.stored(&key("a")), None, "not yet flushed");
        assert_eq!(store.pending_operation_count(), 1);

        let flushed = store.flush().await.unwrap();
        assert_eq!(flushed, vec![key("a")]);
        assert_eq!(external.stored(&key("a")), Some(value("1")));
        assert_eq!(store.pending_operation_count(), 0);
    }

    #[tokio::test]
    async fn queue_coalesces_per_key() {
        let external = Arc::new(RecordingEntryStore::default());
        let store = WriteBehindDataStore::new(external.clone());

        store.add(&key("a"), value("1"), 1_000).await.unwrap();
        store.add(&key("a"), value("2"), 1_001).await.unwrap();
        assert_eq!(store.pending_operation_count(), 1);

        store.flush().await.unwrap();
        assert_eq!(external.stored(&key("a")), Some(value("2")));
    }

    #[tokio::test]
    async fn load_reads_its_own_queued_writes() {
        let external = Arc::new(RecordingEntryStore::default());
        external.seed(key("a"), value("stale"));
        let store = WriteBehindDataStore::new(external);

        store.add(&key("a"), value("fresh"), 1_000).await.unwrap();
        assert_eq!(store.load(&key("a")).await.unwrap(), Some(value("fresh")));

        store.remove(&key("a"), 1_001).await.unwrap();
        assert_eq!(store.load(&key("a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn queued_and_transient_keys_are_not_loadable() {
        let external = Arc::new(RecordingEntryStore::default());
        let store = WriteBehindDataStore::new(external);

        assert!(store.loadable(&key("a")));
        store.add(&key("a"), value("1"), 1_000).await.unwrap();
        assert!(!store.loadable(&key("a")));

        store.add_transient(&key("b"), 1_000).await.unwrap();
        assert!(!store.loadable(&key("b")));
    }

    #[tokio::test]
    async fn transient_write_supersedes_queued_durable_one() {
        let external = Arc::new(RecordingEntryStore::default());
        let store = WriteBehindDataStore::new(external.clone());

        store.add(&key("a"), value("1"), 1_000).await.unwrap();
        store.add_transient(&key("a"), 1_001).await.unwrap();

        store.flush().await.unwrap();
        assert_eq!(external.stored(&key("a")), None, "transient must not flush");
    }

    #[tokio::test]
    async fn flush_drains_removals_as_deletes() {
        let external = Arc::new(RecordingEntryStore::default());
        external.seed(key("a"), value("1"));
        let store = WriteBehindDataStore::new(external.clone());

        store.remove(&key("a"), 1_000).await.unwrap();
        let flushed = store.flush().await.unwrap();
        assert!(flushed.is_empty(), "removals carry no record to notify");
        assert_eq!(external.stored(&key("a")), None);
    }

    #[tokio::test]
    async fn failed_flush_requeues_everything() {
        let external = Arc::new(RecordingEntryStore::default());
        external.fail_writes(true);
        let store = WriteBehindDataStore::new(external.clone());

        store.add(&key("a"), value("1"), 1_000).await.unwrap();
        assert!(store.flush().await.is_err());
        assert_eq!(store.pending_operation_count(), 1, "entry re-queued");

        external.fail_writes(false);
        store.flush().await.unwrap();
        assert_eq!(external.stored(&key("a")), Some(value("1")));
    }

    #[tokio::test]
    async fn flush_key_persists_and_drops_the_queue_entry() {
        let external = Arc::new(RecordingEntryStore::default());
        let store = WriteBehindDataStore::new(external.clone());

        store.add(&key("a"), value("1"), 1_000).await.unwrap();
        store.flush_key(&key("a"), &value("1"), false).await.unwrap();

        assert_eq!(external.stored(&key("a")), Some(value("1")));
        assert_eq!(store.pending_operation_count(), 0);
    }

    #[tokio::test]
    async fn backup_flush_key_is_a_no_op() {
        let external = Arc::new(RecordingEntryStore::default());
        let store = WriteBehindDataStore::new(external.clone());

        store.flush_key(&key("a"), &value("1"), true).await.unwrap();
        assert_eq!(external.stored(&key("a")), None);
    }

    #[tokio::test]
    async fn clear_drops_buffered_state_without_touching_the_store() {
        let external = Arc::new(RecordingEntryStore::default());
        external.seed(key("persisted"), value("1"));
        let store = WriteBehindDataStore::new(external.clone());

        store.add(&key("a"), value("1"), 1_000).await.unwrap();
        store.clear();

        assert_eq!(store.pending_operation_count(), 0);
        assert_eq!(external.stored(&key("persisted")), Some(value("1")));
    }

    #[tokio::test]
    async fn load_all_merges_queue_and_store() {
        let external = Arc::new(RecordingEntryStore::default());
        external.seed(key("stored"), value("s"));
        external.seed(key("removed"), value("r"));
        let store = WriteBehindDataStore::new(external);

        store.add(&key("queued"), value("q"), 1_000).await.unwrap();
        store.remove(&key("removed"), 1_001).await.unwrap();

        let mut loaded = store
            .load_all(&[key("queued"), key("removed"), key("stored")])
            .await
            .unwrap();
        loaded.sort();

        assert_eq!(
            loaded,
            vec![(key("queued"), value("q")), (key("stored"), value("s"))]
        );
    }
}

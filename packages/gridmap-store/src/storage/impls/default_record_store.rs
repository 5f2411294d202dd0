//! Default [`RecordStore`] implementation.
//!
//! [`DefaultRecordStore`] orchestrates the in-memory
//! [`StorageEngine`](crate::storage::StorageEngine), the
//! [`MapDataStore`](crate::storage::MapDataStore) persistence adapter, the
//! index and lock pass-throughs, interceptors, the eviction capability, and
//! the asynchronous loading lifecycle for one partition of one map.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use gridmap_core::{Codec, Data, EntryView, MergePolicy, MergingView};

use crate::error::{StoreError, StoreResult};
use crate::storage::engine::StorageEngine;
use crate::storage::eviction::EvictionChecker;
use crate::storage::impls::context::StoreContext;
use crate::storage::index::IndexRegistry;
use crate::storage::interceptor::InterceptorChain;
use crate::storage::loader::{KeyLoadCallback, KeyLoader, LoadSink, LoadTracker, ValueLoader};
use crate::storage::lock::LockStore;
use crate::storage::map_data_store::{MapDataStore, StoreStrategy};
use crate::storage::now_millis;
use crate::storage::record::Record;
use crate::storage::record_store::{RecordStore, StorageConfig};

/// Per-map-per-partition record store composing every storage concern.
pub struct DefaultRecordStore {
    ctx: Arc<StoreContext>,
    lock_store: Option<Arc<dyn LockStore>>,
    key_loader: Option<Arc<dyn KeyLoader>>,
    tracker: Arc<LoadTracker>,
    value_loader: ValueLoader,
}

impl DefaultRecordStore {
    /// Creates a record store from its collaborators. A key loader is
    /// attached separately by the factory when the adapter is a real
    /// loader.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        name: String,
        partition_id: u32,
        engine: Arc<dyn StorageEngine>,
        data_store: Arc<dyn MapDataStore>,
        codec: Arc<dyn Codec>,
        indexes: Arc<dyn IndexRegistry>,
        interceptors: InterceptorChain,
        eviction: Arc<dyn EvictionChecker>,
        lock_store: Option<Arc<dyn LockStore>>,
        config: StorageConfig,
    ) -> Self {
        let load_batch_size = config.load_batch_size;
        let ctx = Arc::new(StoreContext::new(
            name,
            partition_id,
            engine,
            Arc::clone(&data_store),
            codec,
            indexes,
            interceptors,
            eviction,
            config,
        ));
        let value_loader = ValueLoader::new(
            Arc::clone(&ctx) as Arc<dyn LoadSink>,
            data_store,
            load_batch_size,
        );
        Self {
            ctx,
            lock_store,
            key_loader: None,
            tracker: Arc::new(LoadTracker::new()),
            value_loader,
        }
    }

    pub(crate) fn attach_key_loader(&mut self, key_loader: Arc<dyn KeyLoader>) {
        self.key_loader = Some(key_loader);
    }

    pub(crate) fn load_sink(&self) -> Arc<dyn LoadSink> {
        Arc::clone(&self.ctx) as Arc<dyn LoadSink>
    }

    pub(crate) fn load_tracker(&self) -> Arc<LoadTracker> {
        Arc::clone(&self.tracker)
    }

    /// Shared put path behind `put` and `set`; `set` never resolves the
    /// previous value from the backing store.
    async fn put_internal(
        &self,
        key: &Data,
        value: Data,
        ttl_millis: u64,
        load_from_store: bool,
    ) -> StoreResult<Option<Data>> {
        self.check_if_loaded()?;
        let now = now_millis();

        let record = self.ctx.record_or_null(key, now, false);
        let old_value = match &record {
            Some(record) => Some(record.value.clone()),
            None if load_from_store => self.ctx.load_value_from_store(key).await?,
            None => None,
        };

        let new_value = self.ctx.intercept_put(old_value.as_ref(), value);
        let stored = self.ctx.data_store.add(key, new_value, now).await?;
        let record = match record {
            Some(mut record) => {
                self.ctx.on_store_stats(&mut record, now);
                self.ctx
                    .update_record(key, record, stored, Some(ttl_millis), now)
            }
            None => self.ctx.create_record(key, stored, ttl_millis, now),
        };
        self.ctx.save_index(key, &record.value, old_value.as_ref());
        Ok(old_value)
    }

    /// Removes an in-memory record along with its index entries and its
    /// backing-store entry. Returns the removed value as reported by the
    /// remove interceptors.
    async fn remove_record(
        &self,
        key: &Data,
        record: Record,
        now: i64,
    ) -> StoreResult<Option<Data>> {
        let reported = self.ctx.intercept_remove(record.value.clone());
        self.ctx.remove_index(key, &record.value);
        self.ctx.data_store.remove(key, now).await?;
        self.ctx.engine.remove(key);
        Ok(Some(reported))
    }

    /// Snapshot of all records whose keys are not currently locked.
    fn not_locked_records(&self) -> Vec<(Data, Record)> {
        let snapshot = self.ctx.engine.snapshot();
        let locked = self
            .lock_store
            .as_ref()
            .map(|lock_store| lock_store.locked_keys())
            .unwrap_or_default();
        if locked.is_empty() {
            return snapshot;
        }
        snapshot
            .into_iter()
            .filter(|(key, _)| !locked.contains(key))
            .collect()
    }
}

/// Adopts the incoming entry's expiration metadata onto a merged record:
/// its TTL and, since expiry counts from the last update, its update
/// timestamp (kept only when the view carries a real one).
fn adopt_merge_expiration(record: &mut Record, incoming: &EntryView) {
    record.stats.ttl_millis = incoming.stats.ttl_millis;
    if incoming.stats.last_update_time > 0 {
        record.stats.last_update_time = incoming.stats.last_update_time;
    }
}

#[async_trait]
impl RecordStore for DefaultRecordStore {
    fn name(&self) -> &str {
        &self.ctx.name
    }

    fn partition_id(&self) -> u32 {
        self.ctx.partition_id
    }

    // --- Read path ---

    async fn get(&self, key: &Data, backup: bool) -> StoreResult<Option<Data>> {
        self.check_if_loaded()?;
        let now = now_millis();

        let value = match self.ctx.record_or_null(key, now, backup) {
            Some(record) => {
                let record = if backup {
                    record
                } else {
                    self.ctx.access_record(key, record, now)
                };
                Some(record.value)
            }
            None => self
                .ctx
                .load_record_or_null(key, backup)
                .await?
                .map(|record| record.value),
        };

        let value = self.ctx.intercept_get(value);
        self.ctx.post_read_cleanup(now);
        Ok(value)
    }

    async fn contains_key(&self, key: &Data) -> StoreResult<bool> {
        self.check_if_loaded()?;
        let now = now_millis();

        let record = match self.ctx.record_or_null(key, now, false) {
            Some(record) => Some(record),
            None => self.ctx.load_record_or_null(key, false).await?,
        };
        let contains = match record {
            Some(record) => {
                self.ctx.access_record(key, record, now);
                true
            }
            None => false,
        };

        self.ctx.post_read_cleanup(now);
        Ok(contains)
    }

    async fn contains_value(&self, value: &Data) -> StoreResult<bool> {
        self.check_if_loaded()?;
        let now = now_millis();

        let found = self
            .ctx
            .engine
            .snapshot()
            .into_iter()
            .filter(|(_, record)| !record.is_expired(now))
            .any(|(_, record)| record.value == *value);

        self.ctx.post_read_cleanup(now);
        Ok(found)
    }

    async fn get_all(&self, keys: Vec<Data>) -> StoreResult<Vec<(Data, Data)>> {
        self.check_if_loaded()?;
        let now = now_millis();

        let mut entries = Vec::with_capacity(keys.len());
        let mut missing = Vec::new();
        for key in keys {
            match self.ctx.record_or_null(&key, now, false) {
                Some(record) => {
                    let record = self.ctx.access_record(&key, record, now);
                    if let Some(value) = self.ctx.intercept_get(Some(record.value)) {
                        entries.push((key, value));
                    }
                }
                None => missing.push(key),
            }
        }

        if !missing.is_empty() && self.ctx.data_store.strategy() != StoreStrategy::NoStore {
            let loaded = self.ctx.data_store.load_all(&missing).await?;
            for (key, value) in loaded {
                // Materialize loaded pairs into storage as a side effect.
                let _ = self.ctx.put_from_load(&key, value.clone(), 0);
                if let Some(value) = self.ctx.intercept_get(Some(value)) {
                    entries.push((key, value));
                }
            }
        }
        Ok(entries)
    }

    async fn get_map_entry(&self, key: &Data, now: i64) -> StoreResult<(Data, Option<Data>)> {
        self.check_if_loaded()?;

        let record = match self.ctx.record_or_null(key, now, false) {
            Some(record) => Some(self.ctx.access_record(key, record, now)),
            None => self.ctx.load_record_or_null(key, false).await?,
        };
        Ok((key.clone(), record.map(|record| record.value)))
    }

    fn read_backup_data(&self, key: &Data) -> Option<Data> {
        let now = now_millis();
        let record = self.ctx.engine.get(key)?;
        // Backup expiry is resolved by the owner; the read itself still
        // refuses to serve a value that is already past its deadline.
        if record.is_expired(now) {
            return None;
        }
        Some(record.value)
    }

    fn entry_set_data(&self) -> StoreResult<Vec<(Data, Data)>> {
        self.check_if_loaded()?;
        let now = now_millis();
        Ok(self
            .ctx
            .engine
            .snapshot()
            .into_iter()
            .filter(|(_, record)| !record.is_expired(now))
            .map(|(key, record)| (key, record.value))
            .collect())
    }

    fn key_set(&self) -> StoreResult<Vec<Data>> {
        self.check_if_loaded()?;
        let now = now_millis();
        Ok(self
            .ctx
            .engine
            .snapshot()
            .into_iter()
            .filter(|(_, record)| !record.is_expired(now))
            .map(|(key, _)| key)
            .collect())
    }

    fn get_record(&self, key: &Data) -> Option<Record> {
        self.ctx.engine.get(key)
    }

    fn size(&self) -> usize {
        // No load gate: size() is used internally while loading.
        self.ctx.engine.len()
    }

    fn is_empty(&self) -> StoreResult<bool> {
        self.check_if_loaded()?;
        Ok(self.ctx.engine.is_empty())
    }

    // --- Write path ---

    async fn put(&self, key: &Data, value: Data, ttl_millis: u64) -> StoreResult<Option<Data>> {
        self.put_internal(key, value, ttl_millis, true).await
    }

    async fn set(&self, key: &Data, value: Data, ttl_millis: u64) -> StoreResult<bool> {
        let old_value = self.put_internal(key, value, ttl_millis, false).await?;
        Ok(old_value.is_none())
    }

    async fn put_if_absent(
        &self,
        key: &Data,
        value: Data,
        ttl_millis: u64,
    ) -> StoreResult<Option<Data>> {
        self.check_if_loaded()?;
        let now = now_millis();

        let old_value = match self.ctx.record_or_null(key, now, false) {
            Some(record) => {
                let record = self.ctx.access_record(key, record, now);
                Some(record.value)
            }
            None => self
                .ctx
                .load_record_or_null(key, false)
                .await?
                .map(|record| record.value),
        };
        if old_value.is_some() {
            return Ok(old_value);
        }

        let new_value = self.ctx.intercept_put(None, value);
        let stored = self.ctx.data_store.add(key, new_value, now).await?;
        let record = self.ctx.create_record(key, stored, ttl_millis, now);
        self.ctx.save_index(key, &record.value, None);
        Ok(None)
    }

    async fn replace(&self, key: &Data, update: Data) -> StoreResult<Option<Data>> {
        self.check_if_loaded()?;
        let now = now_millis();

        // Cache-only: an absent key is never resolved from the backing store.
        let Some(mut record) = self.ctx.record_or_null(key, now, false) else {
            return Ok(None);
        };
        let old_value = record.value.clone();
        let new_value = self.ctx.intercept_put(Some(&old_value), update);
        let stored = self.ctx.data_store.add(key, new_value, now).await?;
        self.ctx.on_store_stats(&mut record, now);
        let record = self.ctx.update_record(key, record, stored, None, now);
        self.ctx.save_index(key, &record.value, Some(&old_value));
        Ok(Some(old_value))
    }

    async fn replace_if_same(&self, key: &Data, expect: &Data, update: Data) -> StoreResult<bool> {
        self.check_if_loaded()?;
        let now = now_millis();

        let Some(mut record) = self.ctx.record_or_null(key, now, false) else {
            return Ok(false);
        };
        if record.value != *expect {
            return Ok(false);
        }
        let current = record.value.clone();
        let new_value = self.ctx.intercept_put(Some(&current), update);
        let stored = self.ctx.data_store.add(key, new_value, now).await?;
        self.ctx.on_store_stats(&mut record, now);
        let record = self.ctx.update_record(key, record, stored, None, now);
        self.ctx.save_index(key, &record.value, Some(&current));
        Ok(true)
    }

    async fn remove(&self, key: &Data) -> StoreResult<Option<Data>> {
        self.check_if_loaded()?;
        let now = now_millis();

        match self.ctx.record_or_null(key, now, false) {
            Some(record) => self.remove_record(key, record, now).await,
            None => {
                // Absent in memory: the backing store may still hold an
                // out-of-band entry that must go too.
                let old_value = self.ctx.load_value_from_store(key).await?;
                if old_value.is_some() {
                    self.ctx.data_store.remove(key, now).await?;
                }
                Ok(old_value)
            }
        }
    }

    async fn remove_if_same(&self, key: &Data, test_value: &Data) -> StoreResult<bool> {
        self.check_if_loaded()?;
        let now = now_millis();

        let record = self.ctx.record_or_null(key, now, false);
        let old_value = match &record {
            Some(record) => record.value.clone(),
            None => match self.ctx.load_value_from_store(key).await? {
                Some(value) => value,
                None => return Ok(false),
            },
        };
        if old_value != *test_value {
            return Ok(false);
        }

        let _ = self.ctx.intercept_remove(old_value);
        if let Some(record) = &record {
            self.ctx.remove_index(key, &record.value);
        }
        self.ctx.data_store.remove(key, now).await?;
        self.ctx.engine.remove(key);
        Ok(true)
    }

    async fn delete(&self, key: &Data) -> StoreResult<bool> {
        self.check_if_loaded()?;
        let now = now_millis();

        match self.ctx.record_or_null(key, now, false) {
            Some(record) => {
                let removed = self.remove_record(key, record, now).await?;
                Ok(removed.is_some())
            }
            None => {
                self.ctx.data_store.remove(key, now).await?;
                Ok(false)
            }
        }
    }

    async fn put_transient(&self, key: &Data, value: Data, ttl_millis: u64) -> StoreResult<()> {
        self.check_if_loaded()?;
        let now = now_millis();

        let record = self.ctx.record_or_null(key, now, false);
        let old_value = record.as_ref().map(|record| record.value.clone());
        let new_value = self.ctx.intercept_put(old_value.as_ref(), value);
        let record = match record {
            Some(record) => self
                .ctx
                .update_record(key, record, new_value, Some(ttl_millis), now),
            None => self.ctx.create_record(key, new_value, ttl_millis, now),
        };
        self.ctx.save_index(key, &record.value, old_value.as_ref());
        self.ctx.data_store.add_transient(key, now).await?;
        Ok(())
    }

    fn put_from_load(&self, key: &Data, value: Data, ttl_millis: u64) -> Option<Data> {
        self.ctx.put_from_load(key, value, ttl_millis)
    }

    async fn put_backup(
        &self,
        key: &Data,
        value: Data,
        ttl_millis: u64,
        transient: bool,
    ) -> StoreResult<()> {
        let now = now_millis();

        let durable_value = value.clone();
        match self.ctx.record_or_null(key, now, true) {
            Some(record) => {
                self.ctx
                    .update_record(key, record, value, Some(ttl_millis), now);
            }
            None => {
                self.ctx.create_record(key, value, ttl_millis, now);
            }
        }

        if transient {
            self.ctx.data_store.add_transient(key, now).await?;
        } else {
            self.ctx.data_store.add_backup(key, &durable_value, now).await?;
        }
        Ok(())
    }

    async fn remove_backup(&self, key: &Data) -> StoreResult<()> {
        let now = now_millis();

        if self.ctx.record_or_null(key, now, true).is_none() {
            return Ok(());
        }
        self.ctx.engine.remove(key);
        self.ctx.data_store.remove_backup(key, now).await?;
        Ok(())
    }

    // --- Merge ---

    async fn merge(
        &self,
        key: &Data,
        incoming: EntryView,
        policy: &dyn MergePolicy,
    ) -> StoreResult<bool> {
        self.check_if_loaded()?;
        let now = now_millis();

        let merging = MergingView::new(&incoming, &*self.ctx.codec);
        match self.ctx.record_or_null(key, now, false) {
            None => {
                let absent = EntryView::absent(key.clone());
                let existing = MergingView::new(&absent, &*self.ctx.codec);
                let Some(winner) = policy.merge(&self.ctx.name, &merging, &existing) else {
                    return Ok(false);
                };

                let winner_data = self.ctx.codec.to_data(&winner)?;
                let stored = self.ctx.data_store.add(key, winner_data, now).await?;
                let mut record = Record::new(stored, incoming.stats.ttl_millis, now);
                adopt_merge_expiration(&mut record, &incoming);
                self.ctx.on_store_stats(&mut record, now);
                self.ctx.mark_expirable(record.stats.ttl_millis);
                self.ctx.engine.put(key, record.clone());
                self.ctx.save_index(key, &record.value, None);
                Ok(true)
            }
            Some(record) => {
                let old_value = record.value.clone();
                let existing_view = record.entry_view(key.clone());
                let existing = MergingView::new(&existing_view, &*self.ctx.codec);
                let Some(winner) = policy.merge(&self.ctx.name, &merging, &existing) else {
                    // Tombstone decision: removal by merge is a successful
                    // merge outcome.
                    self.ctx.remove_index(key, &record.value);
                    self.ctx.data_store.remove(key, now).await?;
                    self.ctx.engine.remove(key);
                    return Ok(true);
                };

                let mut record = record;
                if merging.value() == Some(&winner) {
                    // The incoming entry won: adopt its expiration metadata.
                    adopt_merge_expiration(&mut record, &incoming);
                    self.ctx.mark_expirable(record.stats.ttl_millis);
                }

                let winner_data = self.ctx.codec.to_data(&winner)?;
                if winner_data == old_value {
                    // Same as the existing entry: no store or index churn.
                    self.ctx.engine.put(key, record);
                    return Ok(true);
                }

                let stored = self.ctx.data_store.add(key, winner_data, now).await?;
                self.ctx.on_store_stats(&mut record, now);
                // Value swap only: merge preserves the winning side's update
                // metadata instead of stamping a fresh write.
                record.stats.cost = stored.heap_cost();
                record.value = stored;
                self.ctx.engine.put(key, record.clone());
                self.ctx.save_index(key, &record.value, Some(&old_value));
                Ok(true)
            }
        }
    }

    // --- Lock pass-through ---

    fn txn_lock(
        &self,
        key: &Data,
        caller: &str,
        thread_id: u64,
        reference_id: u64,
        lease_millis: i64,
    ) -> StoreResult<bool> {
        self.check_if_loaded()?;
        Ok(self.lock_store.as_ref().is_some_and(|lock_store| {
            lock_store.txn_lock(key, caller, thread_id, reference_id, lease_millis)
        }))
    }

    fn extend_lock(
        &self,
        key: &Data,
        caller: &str,
        thread_id: u64,
        lease_millis: i64,
    ) -> StoreResult<bool> {
        self.check_if_loaded()?;
        Ok(self.lock_store.as_ref().is_some_and(|lock_store| {
            lock_store.extend_lease_time(key, caller, thread_id, lease_millis)
        }))
    }

    fn unlock(
        &self,
        key: &Data,
        caller: &str,
        thread_id: u64,
        reference_id: u64,
    ) -> StoreResult<bool> {
        self.check_if_loaded()?;
        Ok(self
            .lock_store
            .as_ref()
            .is_some_and(|lock_store| lock_store.unlock(key, caller, thread_id, reference_id)))
    }

    fn force_unlock(&self, key: &Data) -> bool {
        self.lock_store
            .as_ref()
            .is_some_and(|lock_store| lock_store.force_unlock(key))
    }

    fn is_locked(&self, key: &Data) -> bool {
        self.lock_store
            .as_ref()
            .is_some_and(|lock_store| lock_store.is_locked(key))
    }

    fn is_transactionally_locked(&self, key: &Data) -> bool {
        self.lock_store
            .as_ref()
            .is_some_and(|lock_store| lock_store.is_transactionally_locked(key))
    }

    fn can_acquire_lock(&self, key: &Data, caller: &str, thread_id: u64) -> bool {
        self.lock_store
            .as_ref()
            .is_none_or(|lock_store| lock_store.can_acquire_lock(key, caller, thread_id))
    }

    fn lock_owner_info(&self, key: &Data) -> Option<String> {
        self.lock_store
            .as_ref()
            .and_then(|lock_store| lock_store.owner_info(key))
    }

    // --- Loading lifecycle ---

    fn start_loading(&self) {
        if let Some(key_loader) = &self.key_loader {
            let _ = key_loader.start_initial_load();
        }
    }

    fn load_all(&self, replace_existing: bool) {
        let Some(key_loader) = &self.key_loader else {
            return;
        };
        tracing::info!(map = %self.ctx.name, partition = self.ctx.partition_id,
            replace_existing, "starting to load all keys");
        let _ = key_loader.start_loading(replace_existing);
    }

    fn load_all_from_store(&self, keys: Vec<Data>, replace_existing: bool) {
        if !keys.is_empty() {
            let handle = self.value_loader.load_values(keys, replace_existing);
            self.tracker.register(handle);
        }
        if let Some(key_loader) = &self.key_loader {
            key_loader.track_loading(false, None);
        }
    }

    fn update_load_status(&self, last_batch: bool, error: Option<&anyhow::Error>) {
        if let Some(key_loader) = &self.key_loader {
            key_loader.track_loading(last_batch, error);
        }
        if last_batch {
            tracing::debug!(map = %self.ctx.name, partition = self.ctx.partition_id,
                "completed loading");
        }
    }

    fn maybe_do_initial_load(&self) {
        if self
            .key_loader
            .as_ref()
            .is_some_and(|key_loader| key_loader.should_do_initial_load())
        {
            self.load_all(false);
        }
    }

    fn check_if_loaded(&self) -> StoreResult<()> {
        if self.tracker.is_empty() {
            return Ok(());
        }
        if self.tracker.all_done() {
            let mut failures = self.tracker.drain_done();
            if failures.is_empty() {
                return Ok(());
            }
            for failure in &failures {
                tracing::error!(map = %self.ctx.name, partition = self.ctx.partition_id,
                    error = %failure, "load for map failed");
            }
            return Err(StoreError::LoadFailed {
                map: self.ctx.name.clone(),
                source: failures.remove(0),
            });
        }
        if let Some(key_loader) = &self.key_loader {
            key_loader.trigger_loading_with_delay();
        }
        Err(StoreError::Retryable {
            map: self.ctx.name.clone(),
        })
    }

    fn is_loaded(&self) -> bool {
        self.tracker.all_done()
    }

    fn on_key_load(&self, callback: KeyLoadCallback) {
        match &self.key_loader {
            Some(key_loader) => key_loader.on_key_load(callback),
            // No loader means nothing to wait for.
            None => callback(true),
        }
    }

    // --- Expiry & eviction ---

    fn is_expirable(&self) -> bool {
        self.ctx.is_expirable()
    }

    fn should_evict(&self) -> bool {
        self.ctx.should_evict()
    }

    async fn evict(&self, key: &Data, backup: bool) -> StoreResult<Option<Data>> {
        let Some(record) = self.ctx.engine.get(key) else {
            return Ok(None);
        };
        self.ctx
            .data_store
            .flush_key(key, &record.value, backup)
            .await?;
        self.ctx.remove_index(key, &record.value);
        self.ctx.engine.remove(key);
        if !backup {
            let _ = self.ctx.intercept_remove(record.value.clone());
        }
        Ok(Some(record.value))
    }

    async fn evict_all(&self, backup: bool) -> StoreResult<usize> {
        self.check_if_loaded()?;

        let victims = self.not_locked_records();
        for (key, record) in &victims {
            self.ctx
                .data_store
                .flush_key(key, &record.value, backup)
                .await?;
        }
        for (key, record) in &victims {
            self.ctx.remove_index(key, &record.value);
        }
        self.ctx.access_sequence.store(0, Ordering::Relaxed);

        let mut removed = 0;
        for (key, _) in &victims {
            if self.ctx.engine.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn evict_expired(&self, percentage: u32, now: i64, _backup: bool) -> usize {
        let snapshot = self.ctx.engine.snapshot();
        let total = snapshot.len();
        if total == 0 || percentage == 0 {
            return 0;
        }
        // Bounded sweep: at most `percentage` percent of all entries per pass.
        #[allow(clippy::cast_possible_truncation)]
        let max_removals = ((total as u64 * u64::from(percentage.min(100))) / 100) as usize;
        if max_removals == 0 {
            return 0;
        }

        let mut removed = 0;
        for (key, record) in &snapshot {
            if removed >= max_removals {
                break;
            }
            if record.is_expired(now) && self.ctx.engine.remove(key).is_some() {
                self.ctx.remove_index(key, &record.value);
                removed += 1;
            }
        }
        removed
    }

    // --- Lifecycle ---

    async fn clear(&self) -> StoreResult<usize> {
        self.check_if_loaded()?;

        // Locked keys are not clearable.
        let victims = self.not_locked_records();
        let keys: Vec<Data> = victims.iter().map(|(key, _)| key.clone()).collect();
        self.ctx.data_store.remove_all(&keys).await?;
        self.ctx.data_store.clear();
        for (key, record) in &victims {
            self.ctx.remove_index(key, &record.value);
        }
        self.ctx.access_sequence.store(0, Ordering::Relaxed);

        let mut removed = 0;
        for (key, _) in &victims {
            if self.ctx.engine.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn flush(&self) -> StoreResult<()> {
        let now = now_millis();
        let flushed = self.ctx.data_store.flush().await?;
        for key in flushed {
            if let Some(mut record) = self.ctx.record_or_null(&key, now, false) {
                record.stats.on_store(now);
                self.ctx.engine.put(&key, record);
            }
        }
        Ok(())
    }

    fn reset(&self) {
        self.ctx.access_sequence.store(0, Ordering::Relaxed);
        self.ctx.data_store.clear();
        self.ctx.engine.clear();
    }

    fn clear_partition(&self) {
        if let Some(lock_store) = &self.lock_store {
            lock_store.clear();
        }
        if self.ctx.indexes.has_index() {
            for (key, record) in self.ctx.engine.snapshot() {
                self.ctx.indexes.remove_entry_index(&key, &record.value);
            }
        }
        self.ctx.access_sequence.store(0, Ordering::Relaxed);
        self.ctx.data_store.clear();
        self.ctx.engine.clear();
    }

    fn destroy(&self) {
        self.clear_partition();
        self.ctx.engine.destroy();
    }
}

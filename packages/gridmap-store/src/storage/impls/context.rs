//! Shared state and record-level helpers behind [`DefaultRecordStore`].
//!
//! [`StoreContext`] holds everything both the record store and its
//! background loading tasks need: the engine, the persistence adapter, the
//! index/interceptor/eviction collaborators, and the partition-wide
//! bookkeeping (expirable flag, access sequence, read counter). It is the
//! [`LoadSink`] the loaders apply entries into.
//!
//! [`DefaultRecordStore`]: super::DefaultRecordStore

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use gridmap_core::{Codec, Data};

use crate::storage::engine::StorageEngine;
use crate::storage::eviction::EvictionChecker;
use crate::storage::index::IndexRegistry;
use crate::storage::interceptor::InterceptorChain;
use crate::storage::loader::LoadSink;
use crate::storage::map_data_store::{MapDataStore, StoreStrategy};
use crate::storage::now_millis;
use crate::storage::record::Record;
use crate::storage::record_store::StorageConfig;

/// Reads between deferred expiry sweeps.
const POST_READ_CLEANUP_INTERVAL: u64 = 64;

/// Upper bound on records purged per deferred sweep, to keep the sweep off
/// the read path's tail latency.
const EXPIRED_PURGE_CAP: usize = 32;

/// Shared core of one partition's record store.
pub(crate) struct StoreContext {
    pub(crate) name: String,
    pub(crate) partition_id: u32,
    pub(crate) engine: Arc<dyn StorageEngine>,
    pub(crate) data_store: Arc<dyn MapDataStore>,
    pub(crate) indexes: Arc<dyn IndexRegistry>,
    pub(crate) interceptors: InterceptorChain,
    pub(crate) eviction: Arc<dyn EvictionChecker>,
    pub(crate) codec: Arc<dyn Codec>,
    pub(crate) config: StorageConfig,
    /// Set once any record with a TTL is written; lets expiry sweeps skip
    /// stores that never expire anything.
    expirable: AtomicBool,
    /// Incremented on every record access; reset by bulk eviction/clear.
    pub(crate) access_sequence: AtomicU64,
    read_count: AtomicU64,
}

impl StoreContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        partition_id: u32,
        engine: Arc<dyn StorageEngine>,
        data_store: Arc<dyn MapDataStore>,
        codec: Arc<dyn Codec>,
        indexes: Arc<dyn IndexRegistry>,
        interceptors: InterceptorChain,
        eviction: Arc<dyn EvictionChecker>,
        config: StorageConfig,
    ) -> Self {
        Self {
            name,
            partition_id,
            engine,
            data_store,
            indexes,
            interceptors,
            eviction,
            codec,
            config,
            expirable: AtomicBool::new(false),
            access_sequence: AtomicU64::new(0),
            read_count: AtomicU64::new(0),
        }
    }

    // --- TTL & expiry ---

    /// Resolves a caller-supplied TTL: 0 falls back to the config default.
    pub(crate) fn resolve_ttl(&self, ttl_millis: u64) -> u64 {
        if ttl_millis > 0 {
            ttl_millis
        } else {
            self.config.default_ttl_millis
        }
    }

    pub(crate) fn mark_expirable(&self, ttl_millis: u64) {
        if ttl_millis > 0 {
            self.expirable.store(true, Ordering::Relaxed);
        }
    }

    pub(crate) fn is_expirable(&self) -> bool {
        self.expirable.load(Ordering::Relaxed)
    }

    /// Live record for a key, treating expired entries as absent.
    ///
    /// On the primary, an expired record is purged (with its index entries)
    /// as it is encountered; backup reads leave removal to the owner.
    pub(crate) fn record_or_null(&self, key: &Data, now: i64, backup: bool) -> Option<Record> {
        let record = self.engine.get(key)?;
        if record.is_expired(now) {
            if !backup {
                self.expire_record(key, &record);
            }
            return None;
        }
        Some(record)
    }

    fn expire_record(&self, key: &Data, record: &Record) {
        if self.engine.remove(key).is_some() {
            self.remove_index(key, &record.value);
            tracing::debug!(map = %self.name, partition = self.partition_id, key = ?key,
                "purged expired record");
        }
    }

    /// Counts a read and, periodically, purges a bounded batch of expired
    /// records so lazy expiration converges without a dedicated sweeper.
    pub(crate) fn post_read_cleanup(&self, now: i64) {
        let reads = self.read_count.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.is_expirable() || reads % POST_READ_CLEANUP_INTERVAL != 0 {
            return;
        }
        self.purge_expired(EXPIRED_PURGE_CAP, now);
    }

    pub(crate) fn purge_expired(&self, cap: usize, now: i64) -> usize {
        let mut removed = 0;
        for (key, record) in self.engine.snapshot() {
            if removed >= cap {
                break;
            }
            if record.is_expired(now) && self.engine.remove(&key).is_some() {
                self.remove_index(&key, &record.value);
                removed += 1;
            }
        }
        removed
    }

    // --- Record lifecycle ---

    /// Refreshes access statistics and writes the record back.
    pub(crate) fn access_record(&self, key: &Data, mut record: Record, now: i64) -> Record {
        record.stats.on_access(now);
        self.access_sequence.fetch_add(1, Ordering::Relaxed);
        self.engine.put(key, record.clone());
        record
    }

    /// Creates and stores a record with a resolved TTL.
    pub(crate) fn create_record(
        &self,
        key: &Data,
        value: Data,
        ttl_millis: u64,
        now: i64,
    ) -> Record {
        let resolved = self.resolve_ttl(ttl_millis);
        self.mark_expirable(resolved);
        let record = Record::new(value, resolved, now);
        self.engine.put(key, record.clone());
        record
    }

    /// Replaces a record's value in place and writes it back.
    ///
    /// `refresh_ttl: Some(ttl)` re-resolves and refreshes the record's TTL;
    /// `None` keeps the existing expiry (the replace path).
    pub(crate) fn update_record(
        &self,
        key: &Data,
        mut record: Record,
        value: Data,
        refresh_ttl: Option<u64>,
        now: i64,
    ) -> Record {
        record.stats.cost = value.heap_cost();
        record.value = value;
        record.stats.on_update(now);
        if let Some(ttl_millis) = refresh_ttl {
            let resolved = self.resolve_ttl(ttl_millis);
            record.stats.ttl_millis = resolved;
            self.mark_expirable(resolved);
        }
        self.engine.put(key, record.clone());
        record
    }

    /// Marks a record's pending write as persisted, unless no store is
    /// configured (nothing is ever pending then).
    pub(crate) fn on_store_stats(&self, record: &mut Record, now: i64) {
        if self.data_store.strategy() != StoreStrategy::NoStore {
            record.stats.on_store(now);
        }
    }

    // --- Index pass-through ---

    pub(crate) fn save_index(&self, key: &Data, new_value: &Data, old_value: Option<&Data>) {
        if self.indexes.has_index() {
            self.indexes.save_entry_index(key, new_value, old_value);
        }
    }

    pub(crate) fn remove_index(&self, key: &Data, value: &Data) {
        if self.indexes.has_index() {
            self.indexes.remove_entry_index(key, value);
        }
    }

    // --- Interception ---
    //
    // Interceptors see application values; conversion only happens when the
    // chain is non-empty. A conversion failure skips interception for that
    // value rather than failing the operation.

    pub(crate) fn intercept_get(&self, value: Option<Data>) -> Option<Data> {
        if self.interceptors.is_empty() {
            return value;
        }
        let blob = value?;
        let intercepted = match self.codec.to_value(&blob) {
            Ok(decoded) => {
                let transformed = self.interceptors.on_get(decoded);
                self.encode_or(transformed, blob)
            }
            Err(err) => {
                tracing::warn!(map = %self.name, error = %err,
                    "get interceptor skipped: value failed to decode");
                blob
            }
        };
        Some(intercepted)
    }

    pub(crate) fn intercept_put(&self, old_value: Option<&Data>, new_value: Data) -> Data {
        if self.interceptors.is_empty() {
            return new_value;
        }
        let old_decoded = old_value.and_then(|blob| self.codec.to_value(blob).ok());
        match self.codec.to_value(&new_value) {
            Ok(decoded) => {
                let transformed = self.interceptors.on_put(old_decoded.as_ref(), decoded);
                self.encode_or(transformed, new_value)
            }
            Err(err) => {
                tracing::warn!(map = %self.name, error = %err,
                    "put interceptor skipped: value failed to decode");
                new_value
            }
        }
    }

    pub(crate) fn intercept_remove(&self, removed_value: Data) -> Data {
        if self.interceptors.is_empty() {
            return removed_value;
        }
        match self.codec.to_value(&removed_value) {
            Ok(decoded) => {
                let transformed = self.interceptors.on_remove(decoded);
                self.encode_or(transformed, removed_value)
            }
            Err(err) => {
                tracing::warn!(map = %self.name, error = %err,
                    "remove interceptor skipped: value failed to decode");
                removed_value
            }
        }
    }

    fn encode_or(&self, value: gridmap_core::Value, fallback: Data) -> Data {
        match self.codec.to_data(&value) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(map = %self.name, error = %err,
                    "interceptor result failed to encode, keeping original value");
                fallback
            }
        }
    }

    // --- Backing-store reads ---

    /// Raw value load from the backing store; no record is materialized.
    pub(crate) async fn load_value_from_store(&self, key: &Data) -> anyhow::Result<Option<Data>> {
        if self.data_store.strategy() == StoreStrategy::NoStore || !self.data_store.loadable(key) {
            return Ok(None);
        }
        self.data_store.load(key).await
    }

    /// Loads a value and materializes a record for it. Primary-side loads
    /// are indexed; backups are not.
    pub(crate) async fn load_record_or_null(
        &self,
        key: &Data,
        backup: bool,
    ) -> anyhow::Result<Option<Record>> {
        let Some(value) = self.load_value_from_store(key).await? else {
            return Ok(None);
        };
        let record = self.create_record(key, value, 0, now_millis());
        if !backup {
            self.save_index(key, &record.value, None);
        }
        Ok(Some(record))
    }

    // --- Eviction & loading admission ---

    pub(crate) fn should_evict(&self) -> bool {
        self.eviction
            .should_evict(self.engine.len(), self.engine.estimated_cost())
    }

    /// Put-from-load: the write path of the loading subsystem. Returns the
    /// previous value, or `None` when the load was skipped under eviction
    /// pressure.
    pub(crate) fn put_from_load(&self, key: &Data, value: Data, ttl_millis: u64) -> Option<Data> {
        let now = now_millis();
        if self.should_evict() {
            tracing::debug!(map = %self.name, partition = self.partition_id,
                "skipping put-from-load under eviction pressure");
            return None;
        }
        let record = self.record_or_null(key, now, false);
        let old_value = record.as_ref().map(|r| r.value.clone());
        let new_value = self.intercept_put(old_value.as_ref(), value);
        let record = match record {
            Some(record) => self.update_record(key, record, new_value, Some(ttl_millis), now),
            None => self.create_record(key, new_value, ttl_millis, now),
        };
        self.save_index(key, &record.value, old_value.as_ref());
        old_value
    }
}

impl LoadSink for StoreContext {
    fn map_name(&self) -> &str {
        &self.name
    }

    fn partition_id(&self) -> u32 {
        self.partition_id
    }

    fn apply_loaded(&self, key: &Data, value: Data, replace_existing: bool) {
        if !replace_existing && self.engine.contains_key(key) {
            return;
        }
        let _ = self.put_from_load(key, value, 0);
    }
}

//! Factory for creating fully-wired [`RecordStore`] instances.
//!
//! [`RecordStoreFactory`] is the dependency injection point: it holds the
//! map-wide collaborators (persistence adapter, entry store, codec,
//! indexes, interceptors, eviction checker, lock store) and produces one
//! [`DefaultRecordStore`] per `(map, partition)` pair, attaching a
//! [`PartitionKeyLoader`] whenever the adapter is a real loader.

use std::sync::Arc;

use gridmap_core::{Codec, MsgPackCodec};

use crate::storage::engines::HashMapStorage;
use crate::storage::eviction::{EvictionChecker, NeverEvict};
use crate::storage::impls::DefaultRecordStore;
use crate::storage::index::{IndexRegistry, NoIndexes};
use crate::storage::interceptor::InterceptorChain;
use crate::storage::loader::PartitionKeyLoader;
use crate::storage::lock::LockStore;
use crate::storage::map_data_store::{EntryStore, MapDataStore, StoreStrategy};
use crate::storage::record_store::{RecordStore, StorageConfig};

/// Factory for creating fully-wired [`RecordStore`] instances.
pub struct RecordStoreFactory {
    config: StorageConfig,
    codec: Arc<dyn Codec>,
    data_store: Arc<dyn MapDataStore>,
    entry_store: Option<Arc<dyn EntryStore>>,
    indexes: Arc<dyn IndexRegistry>,
    interceptors: InterceptorChain,
    eviction: Arc<dyn EvictionChecker>,
    lock_store: Option<Arc<dyn LockStore>>,
}

impl RecordStoreFactory {
    /// Creates a factory with the given config and persistence adapter.
    /// Collaborators default to the no-op implementations; wire real ones
    /// with the `with_*` methods.
    #[must_use]
    pub fn new(config: StorageConfig, data_store: Arc<dyn MapDataStore>) -> Self {
        Self {
            config,
            codec: Arc::new(MsgPackCodec),
            data_store,
            entry_store: None,
            indexes: Arc::new(NoIndexes),
            interceptors: InterceptorChain::default(),
            eviction: Arc::new(NeverEvict),
            lock_store: None,
        }
    }

    /// Uses a non-default codec at the serialization boundary.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Wires the user-supplied entry store, enabling the key-loading
    /// lifecycle for created stores.
    #[must_use]
    pub fn with_entry_store(mut self, entry_store: Arc<dyn EntryStore>) -> Self {
        self.entry_store = Some(entry_store);
        self
    }

    /// Wires the secondary-index engine.
    #[must_use]
    pub fn with_indexes(mut self, indexes: Arc<dyn IndexRegistry>) -> Self {
        self.indexes = indexes;
        self
    }

    /// Wires the interceptor chain applied on the primary path.
    #[must_use]
    pub fn with_interceptors(mut self, interceptors: InterceptorChain) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Wires the eviction capability.
    #[must_use]
    pub fn with_eviction(mut self, eviction: Arc<dyn EvictionChecker>) -> Self {
        self.eviction = eviction;
        self
    }

    /// Wires the per-key lock manager.
    #[must_use]
    pub fn with_lock_store(mut self, lock_store: Arc<dyn LockStore>) -> Self {
        self.lock_store = Some(lock_store);
        self
    }

    /// Creates a [`RecordStore`] for the given map and partition.
    #[must_use]
    pub fn create(&self, map_name: &str, partition_id: u32) -> Box<dyn RecordStore> {
        let mut store = DefaultRecordStore::new(
            map_name.to_string(),
            partition_id,
            Arc::new(HashMapStorage::new()),
            Arc::clone(&self.data_store),
            Arc::clone(&self.codec),
            Arc::clone(&self.indexes),
            self.interceptors.clone(),
            Arc::clone(&self.eviction),
            self.lock_store.clone(),
            self.config.clone(),
        );

        // Only a real loader gets a key-loading lifecycle.
        if self.data_store.strategy() != StoreStrategy::NoStore {
            if let Some(entry_store) = &self.entry_store {
                let key_loader = PartitionKeyLoader::new(
                    store.load_sink(),
                    Arc::clone(&self.data_store),
                    Arc::clone(entry_store),
                    store.load_tracker(),
                    self.config.load_batch_size,
                    self.config.partition_count,
                );
                store.attach_key_loader(Arc::new(key_loader));
            }
        }
        Box::new(store)
    }
}

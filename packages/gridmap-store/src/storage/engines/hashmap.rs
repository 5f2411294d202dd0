//! In-memory [`StorageEngine`] implementation backed by [`DashMap`].

use dashmap::DashMap;
use gridmap_core::Data;

use crate::storage::engine::StorageEngine;
use crate::storage::record::Record;

/// In-memory storage backed by [`DashMap`].
///
/// Reads are lock-free and writes use fine-grained sharding, which keeps
/// monitoring and query threads off the partition writer's critical path.
/// Every accessor hands out cloned records; the live cells never escape.
pub struct HashMapStorage {
    entries: DashMap<Data, Record>,
}

impl HashMapStorage {
    /// Creates a new, empty `HashMapStorage`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for HashMapStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for HashMapStorage {
    fn put(&self, key: &Data, record: Record) -> Option<Record> {
        self.entries.insert(key.clone(), record)
    }

    fn get(&self, key: &Data) -> Option<Record> {
        self.entries.get(key).map(|r| r.clone())
    }

    fn remove(&self, key: &Data) -> Option<Record> {
        self.entries.remove(key).map(|(_, r)| r)
    }

    fn contains_key(&self, key: &Data) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn destroy(&self) {
        self.entries.clear();
        self.entries.shrink_to_fit();
    }

    fn estimated_cost(&self) -> u64 {
        self.entries.iter().map(|r| r.value().stats.cost).sum()
    }

    fn snapshot(&self) -> Vec<(Data, Record)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

//! Multi-layer storage system for one partition of a distributed map.
//!
//! Trait hierarchy and shared types for the storage architecture:
//!
//! - [`StorageEngine`]: low-level in-memory key-to-record storage
//! - [`RecordStore`]: per-map-per-partition orchestration with TTL expiry,
//!   interception, index/lock pass-throughs, eviction, merge, and the
//!   asynchronous loading lifecycle
//! - [`MapDataStore`]: the persistence adapter (none / write-through /
//!   write-behind) over a user-supplied [`EntryStore`]

use std::time::{SystemTime, UNIX_EPOCH};

pub mod datastores;
pub mod engine;
pub mod engines;
pub mod eviction;
pub mod factory;
pub mod impls;
pub mod index;
pub mod interceptor;
pub mod loader;
pub mod lock;
pub mod map_data_store;
pub mod record;
pub mod record_store;

pub use engine::StorageEngine;
pub use engines::HashMapStorage;
pub use eviction::{EntryCountEvictionChecker, EvictionChecker, NeverEvict};
pub use factory::RecordStoreFactory;
pub use impls::DefaultRecordStore;
pub use index::{IndexRegistry, NoIndexes};
pub use interceptor::{InterceptorChain, RecordInterceptor};
pub use loader::{KeyLoadCallback, KeyLoader, LoadHandle, LoadTracker, PartitionKeyLoader};
pub use lock::LockStore;
pub use map_data_store::{EntryStore, MapDataStore, StoreStrategy};
pub use record::{Record, RecordStats};
pub use record_store::{RecordStore, StorageConfig};

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// Millisecond timestamps fit comfortably in i64 until the year 292 million.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

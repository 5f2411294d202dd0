//! Record types for the storage layer.
//!
//! Defines [`Record`], the in-memory cell for one key's value, and
//! [`RecordStats`], its expiration/access metadata.

use gridmap_core::{Data, EntryStats};

/// Metadata tracked for every record in the
/// [`RecordStore`](super::RecordStore).
///
/// Server-internal — never serialized to the wire. Tracks version, access
/// statistics, timestamps, and the record's time-to-live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStats {
    /// Record version, incremented on every update.
    pub version: u32,
    /// Wall-clock time (millis since epoch) when this record was created.
    pub creation_time: i64,
    /// Wall-clock time of the last read access. Used by LRU eviction.
    pub last_access_time: i64,
    /// Wall-clock time of the last write.
    pub last_update_time: i64,
    /// Wall-clock time when last persisted to the backing store. 0 = never.
    pub last_stored_time: i64,
    /// Number of read accesses. Used by LFU eviction.
    pub hits: u32,
    /// Estimated heap cost of this record in bytes.
    pub cost: u64,
    /// Time-to-live in milliseconds from the last update. 0 = no expiry.
    pub ttl_millis: u64,
}

impl RecordStats {
    /// Creates new metadata with the given wall-clock time, cost, and TTL.
    ///
    /// Sets `creation_time`, `last_access_time`, and `last_update_time` to
    /// `now`. Version starts at 1, hits at 0, `last_stored_time` at 0.
    #[must_use]
    pub fn new(now: i64, cost: u64, ttl_millis: u64) -> Self {
        Self {
            version: 1,
            creation_time: now,
            last_access_time: now,
            last_update_time: now,
            last_stored_time: 0,
            hits: 0,
            cost,
            ttl_millis,
        }
    }

    /// Records a read access: increments `hits` and updates `last_access_time`.
    pub fn on_access(&mut self, now: i64) {
        self.hits = self.hits.saturating_add(1);
        self.last_access_time = now;
    }

    /// Records a write: increments `version` and updates `last_update_time`.
    pub fn on_update(&mut self, now: i64) {
        self.version = self.version.saturating_add(1);
        self.last_update_time = now;
    }

    /// Records a persistence event: updates `last_stored_time`.
    pub fn on_store(&mut self, now: i64) {
        self.last_stored_time = now;
    }

    /// Returns `true` if the record has changes not yet persisted to the
    /// backing store (`last_update_time > last_stored_time`).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.last_update_time > self.last_stored_time
    }
}

/// A complete record: serialized value plus server-internal statistics.
///
/// The primary unit of storage in the [`StorageEngine`](super::StorageEngine).
/// A record reachable from storage always carries a value; absence is
/// modeled by the key being missing, never by an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The serialized value.
    pub value: Data,
    /// Server-internal statistics (NOT sent over the wire).
    pub stats: RecordStats,
}

impl Record {
    /// Creates a record with a fresh statistics block. Heap cost is taken
    /// from the value blob.
    #[must_use]
    pub fn new(value: Data, ttl_millis: u64, now: i64) -> Self {
        let cost = value.heap_cost();
        Self {
            value,
            stats: RecordStats::new(now, cost, ttl_millis),
        }
    }

    /// Absolute expiration time, or `None` if the record never expires.
    ///
    /// TTL counts from the last update, so every write refreshes expiry.
    #[must_use]
    pub fn expiration_time(&self) -> Option<i64> {
        if self.stats.ttl_millis == 0 {
            return None;
        }
        // TTLs are sane millisecond durations, far below i64::MAX
        #[allow(clippy::cast_possible_wrap)]
        Some(
            self.stats
                .last_update_time
                .saturating_add(self.stats.ttl_millis as i64),
        )
    }

    /// Whether the record is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiration_time().is_some_and(|deadline| now >= deadline)
    }

    /// Snapshot of this record as an entry view for the merge boundary.
    #[must_use]
    pub fn entry_view(&self, key: Data) -> gridmap_core::EntryView {
        gridmap_core::EntryView::new(
            key,
            self.value.clone(),
            EntryStats {
                version: self.stats.version,
                creation_time: self.stats.creation_time,
                last_access_time: self.stats.last_access_time,
                last_update_time: self.stats.last_update_time,
                ttl_millis: self.stats.ttl_millis,
                hits: self.stats.hits,
                cost: self.stats.cost,
            },
        )
    }
}

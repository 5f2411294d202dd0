//! Entry views crossing the merge boundary.
//!
//! During cluster merge the record store hands merge policies a snapshot of
//! each side of a conflict: the incoming replica's entry and the local one.
//! [`EntryView`] is that serialized snapshot; [`MergingView`] wraps it with
//! lazy deserialization so a policy that never looks at the value (e.g.
//! latest-update) pays no codec cost.

use std::sync::OnceLock;

use crate::codec::Codec;
use crate::data::Data;
use crate::types::Value;

/// Access and mutation statistics carried with an entry view.
///
/// Mirrors the record metadata on the owning side; all-zero for an absent
/// entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStats {
    /// Entry version, incremented on every update.
    pub version: u32,
    /// Wall-clock time (millis since epoch) the entry was created.
    pub creation_time: i64,
    /// Wall-clock time of the last read access.
    pub last_access_time: i64,
    /// Wall-clock time of the last write.
    pub last_update_time: i64,
    /// Time-to-live in milliseconds. 0 = no expiry.
    pub ttl_millis: u64,
    /// Number of read accesses.
    pub hits: u32,
    /// Estimated heap cost in bytes.
    pub cost: u64,
}

/// Serialized snapshot of one map entry, as exchanged during cluster merge.
///
/// `value: None` models absence: either the "null view" standing in for a
/// key the local side has never seen, or a tombstone decision flowing back
/// out of a merge policy.
#[derive(Debug, Clone)]
pub struct EntryView {
    /// Serialized key identity.
    pub key: Data,
    /// Serialized value, or `None` for an absent entry.
    pub value: Option<Data>,
    /// Snapshot of the entry's statistics.
    pub stats: EntryStats,
}

impl EntryView {
    /// Builds the view of an existing entry.
    #[must_use]
    pub fn new(key: Data, value: Data, stats: EntryStats) -> Self {
        Self {
            key,
            value: Some(value),
            stats,
        }
    }

    /// Builds the view representing an absent entry for the given key.
    #[must_use]
    pub fn absent(key: Data) -> Self {
        Self {
            key,
            value: None,
            stats: EntryStats::default(),
        }
    }

    /// Whether this view carries a value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Lazily-deserializing wrapper handed to merge policies.
///
/// The value is decoded at most once, on first access. A blob that fails to
/// decode is reported as absent; the conflict then resolves as if the bad
/// side had no value, which is the only recoverable outcome mid-merge.
pub struct MergingView<'a> {
    view: &'a EntryView,
    codec: &'a dyn Codec,
    cached: OnceLock<Option<Value>>,
}

impl<'a> MergingView<'a> {
    /// Wraps an entry view with the codec used for on-demand decoding.
    #[must_use]
    pub fn new(view: &'a EntryView, codec: &'a dyn Codec) -> Self {
        Self {
            view,
            codec,
            cached: OnceLock::new(),
        }
    }

    /// Serialized key identity.
    #[must_use]
    pub fn key(&self) -> &Data {
        &self.view.key
    }

    /// Serialized value, if present. Never triggers decoding.
    #[must_use]
    pub fn raw_value(&self) -> Option<&Data> {
        self.view.value.as_ref()
    }

    /// Deserialized value, decoded on first call and cached.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.cached
            .get_or_init(|| {
                let blob = self.view.value.as_ref()?;
                match self.codec.to_value(blob) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        tracing::warn!(key = ?self.view.key, error = %err,
                            "undecodable entry value in merge view, treating as absent");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Whether the underlying view carries a value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.view.is_present()
    }

    /// Statistics snapshot for this side of the conflict.
    #[must_use]
    pub fn stats(&self) -> &EntryStats {
        &self.view.stats
    }
}

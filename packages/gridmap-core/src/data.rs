//! Opaque serialized key/value identity.
//!
//! [`Data`] is the byte-level form every key and value takes inside the
//! record store and across the persistence boundary. Equality and hashing
//! are byte-wise over the canonical encoding, so value-equality checks at
//! the store boundary never deserialize. Application [`Value`]s exist only
//! at interception and merge-policy call sites.
//!
//! [`Value`]: crate::types::Value

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed per-blob overhead charged on top of the payload length when
/// estimating heap cost (allocation header + length/capacity words).
const BLOB_OVERHEAD_BYTES: u64 = 24;

/// Opaque serialized key or value.
///
/// Wraps the canonical MessagePack bytes of a [`Value`](crate::types::Value)
/// (or raw key bytes). Cheap to clone relative to record sizes, `Eq + Hash`
/// for use as a map key, and totally ordered for deterministic iteration in
/// tests.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Data(#[serde(with = "serde_bytes")] Vec<u8>);

impl Data {
    /// Wraps raw serialized bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The underlying serialized bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Estimated heap cost of this blob in bytes, payload plus a fixed
    /// allocation overhead. Feeds the record-store entry cost accounting.
    #[must_use]
    pub fn heap_cost(&self) -> u64 {
        self.0.len() as u64 + BLOB_OVERHEAD_BYTES
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Data {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Data {
    /// Hex preview of the first bytes; full payloads are noise in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 8;
        write!(f, "Data[{}b;", self.0.len())?;
        for byte in self.0.iter().take(PREVIEW) {
            write!(f, " {byte:02x}")?;
        }
        if self.0.len() > PREVIEW {
            write!(f, " ..")?;
        }
        write!(f, "]")
    }
}

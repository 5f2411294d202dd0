//! Partition routing for distributing keys across cluster nodes.
//!
//! Gridmap shards a map's key space into hash-based partitions, each owned
//! by one node at a time. The partition function (`fnv1a_hash(key) % count`)
//! is the shared contract between all nodes; the key loader also uses it to
//! filter bulk-loaded keys down to the keys a single partition owns.

use crate::data::Data;
use crate::hash::fnv1a_hash;

/// Default number of partitions in a cluster. A prime chosen for uniform
/// modulo distribution.
pub const PARTITION_COUNT: u32 = 271;

/// Computes the owning partition for a key.
///
/// # Examples
///
/// ```
/// use gridmap_core::data::Data;
/// use gridmap_core::partition::{partition_for_key, PARTITION_COUNT};
///
/// let key = Data::from_bytes(b"user:1".to_vec());
/// assert!(partition_for_key(&key, PARTITION_COUNT) < PARTITION_COUNT);
/// ```
#[must_use]
pub fn partition_for_key(key: &Data, partition_count: u32) -> u32 {
    fnv1a_hash(key.as_bytes()) % partition_count.max(1)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn routing_is_stable() {
        let key = Data::from_bytes(b"stable-key".to_vec());
        let first = partition_for_key(&key, PARTITION_COUNT);
        for _ in 0..10 {
            assert_eq!(partition_for_key(&key, PARTITION_COUNT), first);
        }
    }

    #[test]
    fn zero_partition_count_does_not_panic() {
        let key = Data::from_bytes(b"k".to_vec());
        assert_eq!(partition_for_key(&key, 0), partition_for_key(&key, 1));
    }

    proptest! {
        #[test]
        fn always_within_range(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let key = Data::from_bytes(bytes);
            prop_assert!(partition_for_key(&key, PARTITION_COUNT) < PARTITION_COUNT);
        }
    }
}

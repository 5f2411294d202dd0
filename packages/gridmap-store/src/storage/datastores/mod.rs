//! [`MapDataStore`](crate::storage::MapDataStore) implementations.

pub mod null;
pub mod write_behind;
pub mod write_through;

pub use null::NullDataStore;
pub use write_behind::WriteBehindDataStore;
pub use write_through::WriteThroughDataStore;

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`EntryStore`] used by adapter and record-store tests.

    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use gridmap_core::Data;
    use parking_lot::Mutex;

    use crate::storage::map_data_store::EntryStore;

    /// Entry store over a plain map, with write-failure injection and
    /// call counting.
    #[derive(Default)]
    pub(crate) struct RecordingEntryStore {
        entries: Mutex<BTreeMap<Data, Data>>,
        fail_writes: AtomicBool,
        fail_loads: AtomicBool,
        load_calls: AtomicUsize,
        store_calls: AtomicUsize,
    }

    impl RecordingEntryStore {
        pub(crate) fn seed(&self, key: Data, value: Data) {
            self.entries.lock().insert(key, value);
        }

        pub(crate) fn stored(&self, key: &Data) -> Option<Data> {
            self.entries.lock().get(key).cloned()
        }

        pub(crate) fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn fail_loads(&self, fail: bool) {
            self.fail_loads.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn load_calls(&self) -> usize {
            self.load_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn store_calls(&self) -> usize {
            self.store_calls.load(Ordering::SeqCst)
        }

        fn write_guard(&self) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("injected write failure");
            }
            Ok(())
        }

        fn load_guard(&self) -> anyhow::Result<()> {
            if self.fail_loads.load(Ordering::SeqCst) {
                anyhow::bail!("injected load failure");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EntryStore for RecordingEntryStore {
        async fn load(&self, key: &Data) -> anyhow::Result<Option<Data>> {
            self.load_guard()?;
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.entries.lock().get(key).cloned())
        }

        async fn load_all(&self, keys: &[Data]) -> anyhow::Result<Vec<(Data, Data)>> {
            self.load_guard()?;
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            let entries = self.entries.lock();
            Ok(keys
                .iter()
                .filter_map(|key| entries.get(key).map(|v| (key.clone(), v.clone())))
                .collect())
        }

        async fn load_all_keys(&self) -> anyhow::Result<Vec<Data>> {
            self.load_guard()?;
            Ok(self.entries.lock().keys().cloned().collect())
        }

        async fn store(&self, key: &Data, value: &Data) -> anyhow::Result<()> {
            self.write_guard()?;
            self.store_calls.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().insert(key.clone(), value.clone());
            Ok(())
        }

        async fn store_all(&self, entries: &[(Data, Data)]) -> anyhow::Result<()> {
            self.write_guard()?;
            self.store_calls.fetch_add(1, Ordering::SeqCst);
            let mut map = self.entries.lock();
            for (key, value) in entries {
                map.insert(key.clone(), value.clone());
            }
            Ok(())
        }

        async fn delete(&self, key: &Data) -> anyhow::Result<()> {
            self.write_guard()?;
            self.entries.lock().remove(key);
            Ok(())
        }

        async fn delete_all(&self, keys: &[Data]) -> anyhow::Result<()> {
            self.write_guard()?;
            let mut map = self.entries.lock();
            for key in keys {
                map.remove(key);
            }
            Ok(())
        }
    }
}

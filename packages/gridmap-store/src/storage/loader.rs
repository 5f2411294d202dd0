//! Asynchronous loading lifecycle.
//!
//! Bulk key loads and explicit key-set loads run on background tokio tasks;
//! the partition writer never awaits them. Each load is represented by a
//! [`LoadHandle`] registered in the partition's [`LoadTracker`] — the single
//! source of truth consulted by the load gate. Completion (success or
//! failure) is observed and drained exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gridmap_core::partition::partition_for_key;
use gridmap_core::Data;
use parking_lot::Mutex;

use crate::storage::map_data_store::{EntryStore, MapDataStore};

/// Delay before a lost load trigger is retried.
const LOAD_RETRY_DELAY: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// LoadHandle
// ---------------------------------------------------------------------------

/// Completion cell for one outstanding load.
///
/// Cloned between the loading task (which completes or fails it) and the
/// [`LoadTracker`] (which drains it). The failure, if any, can be taken
/// exactly once.
#[derive(Clone, Default)]
pub struct LoadHandle {
    state: Arc<HandleState>,
}

#[derive(Default)]
struct HandleState {
    done: AtomicBool,
    failure: Mutex<Option<anyhow::Error>>,
}

impl LoadHandle {
    /// Creates a pending handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the load successfully finished.
    pub fn complete(&self) {
        self.state.done.store(true, Ordering::Release);
    }

    /// Marks the load finished with a failure.
    pub fn fail(&self, failure: anyhow::Error) {
        *self.state.failure.lock() = Some(failure);
        self.state.done.store(true, Ordering::Release);
    }

    /// Whether the load has finished, successfully or not.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state.done.load(Ordering::Acquire)
    }

    /// Takes the failure out of the handle. Subsequent calls return `None`.
    #[must_use]
    pub fn take_failure(&self) -> Option<anyhow::Error> {
        self.state.failure.lock().take()
    }
}

// ---------------------------------------------------------------------------
// LoadTracker
// ---------------------------------------------------------------------------

/// Concurrently-mutable collection of outstanding load handles.
///
/// The partition writer registers and drains; monitoring and query threads
/// call [`is_empty`](Self::is_empty)/[`all_done`](Self::all_done)
/// concurrently. "Loaded" means: empty, or every handle finished.
#[derive(Default)]
pub struct LoadTracker {
    handles: Mutex<Vec<LoadHandle>>,
}

impl LoadTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an outstanding load.
    pub fn register(&self, handle: LoadHandle) {
        self.handles.lock().push(handle);
    }

    /// Whether no loads are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Whether every tracked load has finished. True when empty.
    #[must_use]
    pub fn all_done(&self) -> bool {
        self.handles.lock().iter().all(LoadHandle::is_done)
    }

    /// Removes every finished handle, returning the failures they carried.
    ///
    /// A failure is returned at most once across all drains.
    #[must_use]
    pub fn drain_done(&self) -> Vec<anyhow::Error> {
        let done: Vec<LoadHandle> = {
            let mut handles = self.handles.lock();
            let (done, pending): (Vec<LoadHandle>, Vec<LoadHandle>) =
                handles.drain(..).partition(LoadHandle::is_done);
            *handles = pending;
            done
        };
        done.iter().filter_map(LoadHandle::take_failure).collect()
    }
}

// ---------------------------------------------------------------------------
// KeyLoader
// ---------------------------------------------------------------------------

/// Callback invoked once key loading finishes; the flag is `true` on success.
pub type KeyLoadCallback = Box<dyn FnOnce(bool) + Send>;

/// Key-loading subsystem for one partition.
///
/// Triggers and tracks bulk loads of this partition's keys from the backing
/// store. Implementations register every handle they hand out in the shared
/// [`LoadTracker`], so concurrent triggers from different entry points
/// converge on the same bookkeeping.
pub trait KeyLoader: Send + Sync {
    /// Triggers the initial bulk load.
    fn start_initial_load(&self) -> LoadHandle;

    /// Triggers a bulk (re)load. With `replace_existing` false, keys already
    /// in memory keep their current values.
    fn start_loading(&self, replace_existing: bool) -> LoadHandle;

    /// Relays batch progress: `last_batch` marks the partition fully
    /// populated, `error` a failed batch.
    fn track_loading(&self, last_batch: bool, error: Option<&anyhow::Error>);

    /// Whether the initial load has not started yet.
    fn should_do_initial_load(&self) -> bool;

    /// Re-triggers loading after a short delay if no load ever started.
    /// In-process loads always run to completion, so this only recovers
    /// lost triggers.
    fn trigger_loading_with_delay(&self);

    /// Registers a callback fired when key loading finishes. Fires
    /// immediately if it already has.
    fn on_key_load(&self, callback: KeyLoadCallback);
}

// ---------------------------------------------------------------------------
// LoadSink
// ---------------------------------------------------------------------------

/// Where loaded entries land: the record store's put-from-load path.
///
/// Narrow seam between the loaders and the store so loading tasks never
/// need the full `RecordStore` surface.
pub(crate) trait LoadSink: Send + Sync {
    /// Map name, for logging.
    fn map_name(&self) -> &str;

    /// Partition this sink belongs to.
    fn partition_id(&self) -> u32;

    /// Applies one loaded entry with put-from-load semantics. With
    /// `replace_existing` false, a key already in memory is left untouched.
    fn apply_loaded(&self, key: &Data, value: Data, replace_existing: bool);
}

// ---------------------------------------------------------------------------
// PartitionKeyLoader
// ---------------------------------------------------------------------------

/// Tokio-task [`KeyLoader`]: loads every key the partition owns from the
/// user-supplied [`EntryStore`], then loads values in batches through the
/// [`MapDataStore`] and applies them to the sink.
pub struct PartitionKeyLoader {
    inner: Arc<KeyLoaderInner>,
}

struct KeyLoaderInner {
    sink: Arc<dyn LoadSink>,
    data_store: Arc<dyn MapDataStore>,
    external: Arc<dyn EntryStore>,
    tracker: Arc<LoadTracker>,
    batch_size: usize,
    partition_count: u32,
    initial_load_started: AtomicBool,
    keys_loaded: AtomicBool,
    load_in_flight: AtomicBool,
    retry_scheduled: AtomicBool,
    callbacks: Mutex<Vec<KeyLoadCallback>>,
}

impl PartitionKeyLoader {
    pub(crate) fn new(
        sink: Arc<dyn LoadSink>,
        data_store: Arc<dyn MapDataStore>,
        external: Arc<dyn EntryStore>,
        tracker: Arc<LoadTracker>,
        batch_size: usize,
        partition_count: u32,
    ) -> Self {
        Self {
            inner: Arc::new(KeyLoaderInner {
                sink,
                data_store,
                external,
                tracker,
                batch_size: batch_size.max(1),
                partition_count,
                initial_load_started: AtomicBool::new(false),
                keys_loaded: AtomicBool::new(false),
                load_in_flight: AtomicBool::new(false),
                retry_scheduled: AtomicBool::new(false),
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl KeyLoaderInner {
    fn start(this: &Arc<Self>, replace_existing: bool) -> LoadHandle {
        this.initial_load_started.store(true, Ordering::SeqCst);
        this.load_in_flight.store(true, Ordering::SeqCst);

        let handle = LoadHandle::new();
        this.tracker.register(handle.clone());

        let inner = Arc::clone(this);
        let task_handle = handle.clone();
        tokio::spawn(async move {
            let result = inner.run_key_load(replace_existing).await;
            inner.load_in_flight.store(false, Ordering::SeqCst);
            match result {
                Ok(key_count) => {
                    inner.keys_loaded.store(true, Ordering::SeqCst);
                    task_handle.complete();
                    inner.fire_callbacks(true);
                    tracing::debug!(
                        map = %inner.sink.map_name(),
                        partition = inner.sink.partition_id(),
                        keys = key_count,
                        "key load complete"
                    );
                }
                Err(err) => {
                    inner.note_progress(true, Some(&err));
                    task_handle.fail(err);
                    inner.fire_callbacks(false);
                }
            }
        });
        handle
    }

    async fn run_key_load(&self, replace_existing: bool) -> anyhow::Result<usize> {
        let keys = self.external.load_all_keys().await?;
        let owned: Vec<Data> = keys
            .into_iter()
            .filter(|key| {
                partition_for_key(key, self.partition_count) == self.sink.partition_id()
            })
            .collect();

        if owned.is_empty() {
            self.note_progress(true, None);
            return Ok(0);
        }

        let batch_count = owned.chunks(self.batch_size).count();
        for (index, batch) in owned.chunks(self.batch_size).enumerate() {
            let loaded = self.data_store.load_all(batch).await?;
            for (key, value) in loaded {
                self.sink.apply_loaded(&key, value, replace_existing);
            }
            self.note_progress(index + 1 == batch_count, None);
        }
        Ok(owned.len())
    }

    fn note_progress(&self, last_batch: bool, error: Option<&anyhow::Error>) {
        if let Some(err) = error {
            tracing::error!(
                map = %self.sink.map_name(),
                partition = self.sink.partition_id(),
                error = %err,
                "key loading failed"
            );
        } else if last_batch {
            self.keys_loaded.store(true, Ordering::SeqCst);
            tracing::debug!(
                map = %self.sink.map_name(),
                partition = self.sink.partition_id(),
                "final key batch loaded"
            );
        }
    }

    fn fire_callbacks(&self, success: bool) {
        let callbacks: Vec<KeyLoadCallback> = self.callbacks.lock().drain(..).collect();
        for callback in callbacks {
            callback(success);
        }
    }
}

impl KeyLoader for PartitionKeyLoader {
    fn start_initial_load(&self) -> LoadHandle {
        KeyLoaderInner::start(&self.inner, false)
    }

    fn start_loading(&self, replace_existing: bool) -> LoadHandle {
        KeyLoaderInner::start(&self.inner, replace_existing)
    }

    fn track_loading(&self, last_batch: bool, error: Option<&anyhow::Error>) {
        self.inner.note_progress(last_batch, error);
    }

    fn should_do_initial_load(&self) -> bool {
        !self.inner.initial_load_started.load(Ordering::SeqCst)
            && !self.inner.keys_loaded.load(Ordering::SeqCst)
    }

    fn trigger_loading_with_delay(&self) {
        if self.inner.retry_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(LOAD_RETRY_DELAY).await;
            inner.retry_scheduled.store(false, Ordering::SeqCst);
            if !inner.keys_loaded.load(Ordering::SeqCst)
                && !inner.load_in_flight.load(Ordering::SeqCst)
            {
                let _ = KeyLoaderInner::start(&inner, false);
            }
        });
    }

    fn on_key_load(&self, callback: KeyLoadCallback) {
        if self.inner.keys_loaded.load(Ordering::SeqCst) {
            callback(true);
            return;
        }
        self.inner.callbacks.lock().push(callback);
    }
}

// ---------------------------------------------------------------------------
// ValueLoader
// ---------------------------------------------------------------------------

/// Loads an explicit key set through the [`MapDataStore`] on a background
/// task, applying each loaded entry to the sink.
pub(crate) struct ValueLoader {
    sink: Arc<dyn LoadSink>,
    data_store: Arc<dyn MapDataStore>,
    batch_size: usize,
}

impl ValueLoader {
    pub(crate) fn new(
        sink: Arc<dyn LoadSink>,
        data_store: Arc<dyn MapDataStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            sink,
            data_store,
            batch_size: batch_size.max(1),
        }
    }

    pub(crate) fn load_values(&self, keys: Vec<Data>, replace_existing: bool) -> LoadHandle {
        let handle = LoadHandle::new();
        let task_handle = handle.clone();
        let sink = Arc::clone(&self.sink);
        let data_store = Arc::clone(&self.data_store);
        let batch_size = self.batch_size;

        tokio::spawn(async move {
            for batch in keys.chunks(batch_size) {
                match data_store.load_all(batch).await {
                    Ok(loaded) => {
                        for (key, value) in loaded {
                            sink.apply_loaded(&key, value, replace_existing);
                        }
                    }
                    Err(err) => {
                        tracing::error!(
                            map = %sink.map_name(),
                            partition = sink.partition_id(),
                            error = %err,
                            "value loading failed"
                        );
                        task_handle.fail(err);
                        return;
                    }
                }
            }
            task_handle.complete();
        });
        handle
    }
}

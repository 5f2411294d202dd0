//! Error types for record-store operations.

/// Error returned by [`RecordStore`](crate::storage::RecordStore) operations.
///
/// `Retryable` is a distinguished result kind, not a control-flow exception:
/// the caller's own retry loop decides when to re-submit the whole operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The partition is still loading from the backing store. The operation
    /// was not applied; retry it after a delay.
    #[error("map {map} is still loading data from the backing store")]
    Retryable {
        /// Name of the map whose partition is loading.
        map: String,
    },
    /// A background load finished with a failure. Surfaced exactly once to
    /// the first caller that observes the drained load handle.
    #[error("loading map {map} from the backing store failed")]
    LoadFailed {
        /// Name of the map whose load failed.
        map: String,
        /// The underlying loader failure.
        #[source]
        source: anyhow::Error,
    },
    /// A persistence-adapter or codec failure from the current operation.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl StoreError {
    /// Whether the caller should retry the whole operation after a delay.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

/// Result alias used across the record-store API.
pub type StoreResult<T> = Result<T, StoreError>;

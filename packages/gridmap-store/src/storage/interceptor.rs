//! Value interceptors for the primary read/write path.
//!
//! Interceptors see application [`Value`]s, not serialized blobs, so
//! invoking them is the one place the store pays codec cost on the hot
//! path. [`InterceptorChain::is_empty`] lets callers skip the conversion
//! entirely when no interceptor is registered — the common case.
//! Backup paths bypass interception.

use std::sync::Arc;

use gridmap_core::Value;

/// Hook into get/put/remove on the primary path.
///
/// Each hook may transform the value flowing through it; the default
/// implementations pass values through unchanged.
///
/// Used as `Arc<dyn RecordInterceptor>`.
pub trait RecordInterceptor: Send + Sync {
    /// Transforms the value returned by a read. Absent entries skip the chain.
    fn intercept_get(&self, value: Value) -> Value {
        value
    }

    /// Transforms the value about to be written. `old_value` is the value
    /// being replaced, when one exists.
    fn intercept_put(&self, old_value: Option<&Value>, new_value: Value) -> Value {
        let _ = old_value;
        new_value
    }

    /// Transforms the value reported by a removal.
    fn intercept_remove(&self, removed_value: Value) -> Value {
        removed_value
    }
}

/// Ordered chain of interceptors, applied first-to-last.
#[derive(Default, Clone)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn RecordInterceptor>>,
}

impl InterceptorChain {
    /// Builds a chain from registered interceptors.
    #[must_use]
    pub fn new(interceptors: Vec<Arc<dyn RecordInterceptor>>) -> Self {
        Self { interceptors }
    }

    /// Whether any interceptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Runs the get hooks over a value.
    #[must_use]
    pub fn on_get(&self, value: Value) -> Value {
        self.interceptors
            .iter()
            .fold(value, |value, interceptor| interceptor.intercept_get(value))
    }

    /// Runs the put hooks over a value.
    #[must_use]
    pub fn on_put(&self, old_value: Option<&Value>, new_value: Value) -> Value {
        self.interceptors.iter().fold(new_value, |value, interceptor| {
            interceptor.intercept_put(old_value, value)
        })
    }

    /// Runs the remove hooks over a value.
    #[must_use]
    pub fn on_remove(&self, removed_value: Value) -> Value {
        self.interceptors.iter().fold(removed_value, |value, interceptor| {
            interceptor.intercept_remove(value)
        })
    }
}

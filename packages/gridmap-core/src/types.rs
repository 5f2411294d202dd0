//! Runtime value model for map entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Generic runtime value type for map entries.
///
/// Supports all JSON-compatible types plus binary data. This is the
/// application-object side of the serialization boundary: the record store
/// itself traffics in [`Data`](crate::data::Data) and converts to `Value`
/// only for interceptors and merge policies.
///
/// Serializes to `MsgPack` via `rmp-serde`; `BTreeMap` keeps object keys in
/// deterministic order so equal values always produce equal bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON floating-point (64-bit IEEE 754).
    Float(f64),
    /// JSON string (UTF-8).
    String(String),
    /// Binary data (not directly representable in JSON).
    Bytes(Vec<u8>),
    /// JSON array (ordered sequence of values).
    Array(Vec<Value>),
    /// JSON object (ordered map of string keys to values).
    Map(BTreeMap<String, Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

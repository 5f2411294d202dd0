//! Serialization boundary between [`Value`] objects and [`Data`] blobs.
//!
//! The record store never interprets the bytes it holds; everything that
//! crosses into application-object space goes through a [`Codec`]. The
//! default wire form is MessagePack via `rmp-serde`.

use crate::data::Data;
use crate::types::Value;

/// Converts between application [`Value`]s and their canonical [`Data`] form.
///
/// Implementations must be deterministic: encoding equal values yields equal
/// bytes, because the store compares values byte-wise.
///
/// Used as `Arc<dyn Codec>`.
pub trait Codec: Send + Sync {
    /// Serializes a value into its canonical blob.
    ///
    /// # Errors
    /// Returns an error if the value cannot be encoded.
    fn to_data(&self, value: &Value) -> anyhow::Result<Data>;

    /// Deserializes a blob back into a value.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a valid encoding.
    fn to_value(&self, data: &Data) -> anyhow::Result<Value>;
}

/// MessagePack codec, the default for all gridmap wire and storage forms.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgPackCodec;

impl Codec for MsgPackCodec {
    fn to_data(&self, value: &Value) -> anyhow::Result<Data> {
        let bytes = rmp_serde::to_vec(value)?;
        Ok(Data::from_bytes(bytes))
    }

    fn to_value(&self, data: &Data) -> anyhow::Result<Value> {
        let value = rmp_serde::from_slice(data.as_bytes())?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn encodes_deterministically() {
        let codec = MsgPackCodec;

        let mut a = BTreeMap::new();
        a.insert("x".to_string(), Value::Int(1));
        a.insert("y".to_string(), Value::Bool(true));

        let mut b = BTreeMap::new();
        b.insert("y".to_string(), Value::Bool(true));
        b.insert("x".to_string(), Value::Int(1));

        let blob_a = codec.to_data(&Value::Map(a)).unwrap();
        let blob_b = codec.to_data(&Value::Map(b)).unwrap();
        assert_eq!(blob_a, blob_b, "insertion order must not leak into bytes");
    }

    #[test]
    fn rejects_garbage_bytes() {
        let codec = MsgPackCodec;
        // 0xc1 is reserved in MessagePack and never valid.
        let garbage = Data::from_bytes(vec![0xc1]);
        assert!(codec.to_value(&garbage).is_err());
    }

    #[test]
    fn nested_values_survive_the_boundary() {
        let codec = MsgPackCodec;
        let value = Value::Array(vec![
            Value::Null,
            Value::String("entry".to_string()),
            Value::Bytes(vec![0, 1, 2]),
        ]);

        let decoded = codec.to_value(&codec.to_data(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }
}

//! Codec Module
//!
//! Pluggable value encoding for cache entries. The bundled JSON codec does
//! not compress; it only provides the serialized form used for size
//! accounting.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

// == Codec Error ==
/// Failure to encode or decode a cached value.
#[derive(Error, Debug)]
pub enum CodecError {
    /// JSON (de)serialization failed
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
}

// == Codec Trait ==
/// Converts values to bytes and back.
pub trait Codec<T>: Send + Sync {
    /// Encodes a value.
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decodes a value previously produced by [`Codec::encode`].
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// Human-readable codec name.
    fn name(&self) -> &'static str;

    /// Number of bytes [`Codec::encode`] produces for `value`.
    fn encoded_len(&self, value: &T) -> Result<usize, CodecError> {
        self.encode(value).map(|bytes| bytes.len())
    }
}

// == JSON Codec ==
/// Pass-through JSON codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

// == Size Estimation ==
/// Estimates the in-cache size of a value from its JSON form, the same byte
/// count [`JsonCodec`] reports.
///
/// Values that cannot be serialized fall back to their stack size.
pub fn estimate_size<T: Serialize>(value: &T) -> usize {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .unwrap_or_else(|_| std::mem::size_of::<T>())
}

//! Payload serialization codec.
//!
//! The core only needs "bytes in, typed value out"; the concrete wire format
//! is chosen by the `Codec` implementation. [`JsonCodec`] is the default.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Error raised by a codec while encoding or decoding a payload.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct CodecError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl CodecError {
    /// Wraps an underlying codec failure.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(source.into())
    }
}

/// Serializes event payloads to bytes and back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes `value` into bytes.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if the value cannot be represented.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes bytes into a value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` on malformed bytes or a schema mismatch.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::new)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::new)
    }
}

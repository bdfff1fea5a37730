//! MsgPack codec using `rmp-serde`.
//!
//! Carries schema-defined messages (multi-sensor bundles) whose shape is a
//! Rust struct rather than a flat array.
//!
//! **Always use `to_vec_named`**, never `to_vec`: structs are written as
//! maps keyed by field name, so a sender that adds a field does not shift
//! every later field.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use sensorwire::codec::{MsgPackCodec, PayloadCodec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct AllSensors {
//!     stretch: Vec<f32>,
//!     pressure: Vec<u16>,
//! }
//!
//! let msg = AllSensors { stretch: vec![0.5; 4], pressure: vec![7; 2] };
//! let payload = Bytes::from(MsgPackCodec::<AllSensors>::encode(&msg).unwrap());
//!
//! let codec = MsgPackCodec::<AllSensors>::new();
//! assert_eq!(codec.decode(&payload).unwrap(), msg);
//! ```

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::PayloadCodec;
use crate::error::{PayloadError, Result};

/// MessagePack codec for a message type `T`.
pub struct MsgPackCodec<T> {
    _message: PhantomData<fn() -> T>,
}

impl<T> MsgPackCodec<T> {
    /// Create a codec for `T`.
    pub fn new() -> Self {
        Self {
            _message: PhantomData,
        }
    }
}

impl<T: Serialize> MsgPackCodec<T> {
    /// Encode a message to MsgPack bytes.
    ///
    /// Uses `to_vec_named` for struct-as-map format.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }
}

impl<T: DeserializeOwned> MsgPackCodec<T> {
    /// Decode MsgPack bytes to a message.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to `T`.
    #[inline]
    pub fn decode_slice(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

impl<T> PayloadCodec for MsgPackCodec<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Record = T;

    fn decode(&self, payload: &Bytes) -> std::result::Result<T, PayloadError> {
        rmp_serde::from_slice(payload).map_err(|e| PayloadError::Schema(e.to_string()))
    }
}

impl<T> Default for MsgPackCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MsgPackCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MsgPackCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsgPackCodec")
            .field("message", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct GloveFrame {
        id: u32,
        fingers: Vec<f32>,
        calibrated: bool,
    }

    fn glove() -> GloveFrame {
        GloveFrame {
            id: 42,
            fingers: vec![0.1, 0.2, 0.3, 0.4, 0.5],
            calibrated: true,
        }
    }

    #[test]
    fn test_decode_struct() {
        let payload = Bytes::from(MsgPackCodec::<GloveFrame>::encode(&glove()).unwrap());
        let decoded = MsgPackCodec::<GloveFrame>::new().decode(&payload).unwrap();
        assert_eq!(decoded, glove());
    }

    #[test]
    fn test_decode_slice() {
        let encoded = MsgPackCodec::<GloveFrame>::encode(&glove()).unwrap();
        let decoded = MsgPackCodec::<GloveFrame>::decode_slice(&encoded).unwrap();
        assert_eq!(decoded, glove());
    }

    #[test]
    fn test_to_vec_named_produces_map_format() {
        let encoded = MsgPackCodec::<GloveFrame>::encode(&glove()).unwrap();

        // MsgPack fixmap with 3 entries is 0x83; a positional array would be 0x93
        assert_eq!(
            encoded[0], 0x83,
            "Expected fixmap with 3 elements, got {:02X}",
            encoded[0]
        );
    }

    #[test]
    fn test_decode_error_is_schema_error() {
        let codec = MsgPackCodec::<GloveFrame>::new();
        let result = codec.decode(&Bytes::from_static(b"not valid msgpack"));
        assert!(matches!(result, Err(PayloadError::Schema(_))));
    }

    #[test]
    fn test_binary_field() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Blob {
            #[serde(with = "serde_bytes")]
            data: Vec<u8>,
        }

        let blob = Blob {
            data: vec![0x01, 0x02, 0x03],
        };
        let encoded = MsgPackCodec::<Blob>::encode(&blob).unwrap();

        // fixmap(1), fixstr "data", then bin8
        assert_eq!(encoded[6], 0xc4, "Expected bin8 format");

        let decoded = MsgPackCodec::<Blob>::decode_slice(&encoded).unwrap();
        assert_eq!(decoded, blob);
    }
}

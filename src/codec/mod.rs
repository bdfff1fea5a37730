//! Codec module - typed interpretation of frame payloads.
//!
//! This module provides codecs for turning a validated payload into a record:
//!
//! - [`RawCodec`] - Pass-through for raw bytes (zero-copy)
//! - [`ArrayCodec`] - Fixed-width numeric samples, optionally shaped as a grid
//! - [`ImuCodec`] - 10 or 13 float IMU packets
//! - [`MsgPackCodec`] - Schema-defined messages using `rmp-serde`
//!
//! # Design
//!
//! A codec is chosen per data source and handed to the pipeline by value,
//! so dispatch is static. A decode failure is a [`PayloadError`]; the
//! pipeline counts it and drops the frame.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use sensorwire::codec::{ArrayCodec, PayloadCodec, RawCodec};
//! use sensorwire::protocol::ByteOrder;
//!
//! let codec = ArrayCodec::<f32>::new(ByteOrder::Little).with_count(2);
//! let payload = Bytes::from(codec.encode(&[1.5, -2.0]));
//! let samples = codec.decode(&payload).unwrap();
//! assert_eq!(samples.values(), &[1.5, -2.0]);
//!
//! let raw = RawCodec.decode(&payload).unwrap();
//! assert_eq!(raw.len(), 8);
//! ```

mod array;
mod imu;
mod msgpack;
mod raw;

use bytes::Bytes;

use crate::error::PayloadError;

pub use array::{ArrayCodec, Sample, Samples};
pub use imu::{ImuCodec, ImuReading};
pub use msgpack::MsgPackCodec;
pub use raw::RawCodec;

/// Interprets a frame payload as a typed record.
pub trait PayloadCodec: Send + Sync + 'static {
    /// Decoded record type.
    type Record: Send + 'static;

    /// Decode one payload.
    fn decode(&self, payload: &Bytes) -> std::result::Result<Self::Record, PayloadError>;
}

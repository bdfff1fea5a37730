//! Frame struct with typed accessors.
//!
//! A frame is materialized only after its trailer validated. All parts are
//! `bytes::Bytes` slices of the same underlying allocation.
//!
//! # Example
//!
//! ```
//! use sensorwire::protocol::{encode_frame, FrameBuffer, FrameFormat};
//!
//! let format = FrameFormat::marker_terminated();
//! let bytes = encode_frame(&format, &[1, 2, 3, 4]).unwrap();
//! assert_eq!(bytes, vec![0xAA, 0x04, 0x00, 1, 2, 3, 4, 0x55]);
//!
//! let mut buffer = FrameBuffer::new(format).unwrap();
//! let frames = buffer.push(&bytes);
//! assert_eq!(frames[0].payload(), &[1, 2, 3, 4]);
//! ```

use bytes::Bytes;

use super::wire_format::FrameFormat;
use crate::error::Result;

/// Start marker and declared length of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Start marker bytes as received.
    pub start_marker: Bytes,
    /// Declared (or fixed) payload length.
    pub payload_length: u16,
}

/// A complete, validated frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: FrameHeader,
    /// Payload bytes.
    pub payload: Bytes,
    /// Trailer bytes as received (end marker or checksum).
    pub trailer: Bytes,
    raw: Bytes,
}

impl Frame {
    /// Split a fully validated frame into its parts.
    ///
    /// `raw` must hold exactly `header_len + payload_len + trailer_len` bytes.
    pub(crate) fn from_raw(raw: Bytes, start_len: usize, header_len: usize, payload_len: usize) -> Self {
        let payload_end = header_len + payload_len;
        Self {
            header: FrameHeader {
                start_marker: raw.slice(..start_len),
                payload_length: payload_len as u16,
            },
            payload: raw.slice(header_len..payload_end),
            trailer: raw.slice(payload_end..),
            raw,
        }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Full frame as it appeared on the wire.
    #[inline]
    pub fn as_wire_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Size of the frame on the wire.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.raw.len()
    }
}

/// Encode `payload` as a complete frame in `format`.
///
/// Fails when the payload cannot be expressed by the length field.
pub fn encode_frame(format: &FrameFormat, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(format.header_len() + payload.len() + format.trailer.width());
    buf.extend_from_slice(&format.start);
    format.length.write(payload.len(), &mut buf)?;
    buf.extend_from_slice(payload);
    format.trailer.write(payload, &mut buf);
    Ok(buf)
}

//! Protocol module - wire format, framing, and frame types.
//!
//! This module turns an arbitrarily fragmented byte stream into validated frames:
//! - Frame layout description (start marker, length field, trailer)
//! - Capped accumulator for partial reads
//! - Single-pass decoder state machine with one-byte resync
//! - Frame buffer tying both together

mod accumulator;
mod decoder;
mod frame;
mod frame_buffer;
mod wire_format;

pub use accumulator::{Accumulator, Append, DEFAULT_BUFFER_CEILING};
pub use decoder::{FrameDecoder, FrameReject, FramingStats};
pub use frame::{encode_frame, Frame, FrameHeader};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    xor_checksum, ByteOrder, FrameFormat, LengthSpec, Trailer, DEFAULT_END_MARKER,
    DEFAULT_MAX_PAYLOAD, DEFAULT_START_MARKER, MAX_MARKER_LEN, SECOND_START_MARKER,
};

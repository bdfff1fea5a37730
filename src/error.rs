//! Error types for sensorwire.
//!
//! Framing corruption is not an error here: a bad trailer or a
//! malformed length is an expected event on a noisy link and is reported
//! as a [`FrameReject`](crate::protocol::FrameReject) value, not an error.

use thiserror::Error;

/// Main error type for all sensorwire operations.
#[derive(Debug, Error)]
pub enum SensorwireError {
    /// I/O error on the transport (disconnect, read failure).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// Invalid frame format or pipeline settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payload passed the trailer check but failed semantic decode.
    ///
    /// The read loop counts these in `payload_errors` and never returns
    /// them. This conversion lets callers that run a codec directly on a
    /// [`Frame`](crate::protocol::Frame) use `?`.
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// The read loop task panicked or was aborted.
    #[error("Pipeline task failed: {0}")]
    Task(String),
}

/// Payload decode failure.
///
/// Returned by [`PayloadCodec`](crate::codec::PayloadCodec) implementations.
/// The pipeline counts these and drops the frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Payload length is not a whole number of elements.
    #[error("payload of {len} bytes is not a multiple of element width {width}")]
    Misaligned { len: usize, width: usize },

    /// Element count differs from the declared layout.
    #[error("expected {expected} elements, got {actual}")]
    ElementCount { expected: usize, actual: usize },

    /// Schema-defined message failed to deserialize.
    #[error("schema decode failed: {0}")]
    Schema(String),
}

/// Result type alias using SensorwireError.
pub type Result<T> = std::result::Result<T, SensorwireError>;

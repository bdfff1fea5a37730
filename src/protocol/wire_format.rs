//! Wire format description and trailer arithmetic.
//!
//! Every sensor link uses the same skeleton, with the widths and trailer
//! kind varying per board:
//! ```text
//! ┌──────────────┬──────────────┬───────────────┬──────────────────┐
//! │ Start marker │ Length field │ Payload       │ Trailer          │
//! │ 1-4 bytes    │ 0/1/2 bytes  │ length bytes  │ marker/XOR/none  │
//! └──────────────┴──────────────┴───────────────┴──────────────────┘
//! ```
//!
//! The XOR checksum covers the payload only, never the marker or length.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorwireError};

/// Start marker used by the single-byte-marker boards.
pub const DEFAULT_START_MARKER: u8 = 0xAA;

/// Second start byte used by the IMU and pressure-matrix boards.
pub const SECOND_START_MARKER: u8 = 0xBB;

/// End marker used by the marker-terminated boards.
pub const DEFAULT_END_MARKER: u8 = 0x55;

/// Default sanity ceiling for a declared payload length.
pub const DEFAULT_MAX_PAYLOAD: usize = 2048;

/// Longest start marker or end marker accepted.
pub const MAX_MARKER_LEN: usize = 4;

/// Byte order of multi-byte fields and samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// How the payload length is conveyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LengthSpec {
    /// One length byte.
    U8,
    /// Two length bytes.
    U16 {
        #[serde(default)]
        order: ByteOrder,
    },
    /// No length field; every payload is exactly `len` bytes.
    Fixed { len: usize },
}

impl LengthSpec {
    /// Width of the length field on the wire.
    #[inline]
    pub fn field_width(&self) -> usize {
        match self {
            LengthSpec::U8 => 1,
            LengthSpec::U16 { .. } => 2,
            LengthSpec::Fixed { .. } => 0,
        }
    }

    /// Largest payload length the field can express.
    #[inline]
    pub fn field_max(&self) -> usize {
        match self {
            LengthSpec::U8 => u8::MAX as usize,
            LengthSpec::U16 { .. } => u16::MAX as usize,
            LengthSpec::Fixed { len } => *len,
        }
    }

    /// Read the payload length from a field slice of `field_width()` bytes.
    pub fn read(&self, field: &[u8]) -> usize {
        match self {
            LengthSpec::U8 => field[0] as usize,
            LengthSpec::U16 { order } => {
                let raw = [field[0], field[1]];
                match order {
                    ByteOrder::Little => u16::from_le_bytes(raw) as usize,
                    ByteOrder::Big => u16::from_be_bytes(raw) as usize,
                }
            }
            LengthSpec::Fixed { len } => *len,
        }
    }

    /// Append the encoded length field for a payload of `len` bytes.
    pub fn write(&self, len: usize, out: &mut Vec<u8>) -> Result<()> {
        if len > self.field_max() {
            return Err(SensorwireError::Config(format!(
                "Payload size {} does not fit length field (max {})",
                len,
                self.field_max()
            )));
        }
        match self {
            LengthSpec::U8 => out.push(len as u8),
            LengthSpec::U16 { order } => match order {
                ByteOrder::Little => out.extend_from_slice(&(len as u16).to_le_bytes()),
                ByteOrder::Big => out.extend_from_slice(&(len as u16).to_be_bytes()),
            },
            LengthSpec::Fixed { len: fixed } => {
                if len != *fixed {
                    return Err(SensorwireError::Config(format!(
                        "Fixed-length format requires {} payload bytes, got {}",
                        fixed, len
                    )));
                }
            }
        }
        Ok(())
    }
}

/// End-of-frame validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trailer {
    /// Fixed end-marker bytes.
    EndMarker { bytes: Vec<u8> },
    /// One byte holding the XOR fold of the payload.
    Xor,
    /// No trailer at all.
    None,
}

impl Trailer {
    /// Width of the trailer on the wire.
    #[inline]
    pub fn width(&self) -> usize {
        match self {
            Trailer::EndMarker { bytes } => bytes.len(),
            Trailer::Xor => 1,
            Trailer::None => 0,
        }
    }

    /// Check a received trailer against the payload it closes.
    pub fn matches(&self, payload: &[u8], received: &[u8]) -> bool {
        match self {
            Trailer::EndMarker { bytes } => received == bytes.as_slice(),
            Trailer::Xor => received.first() == Some(&xor_checksum(payload)),
            Trailer::None => true,
        }
    }

    /// Append the trailer for `payload`.
    pub fn write(&self, payload: &[u8], out: &mut Vec<u8>) {
        match self {
            Trailer::EndMarker { bytes } => out.extend_from_slice(bytes),
            Trailer::Xor => out.push(xor_checksum(payload)),
            Trailer::None => {}
        }
    }
}

/// XOR fold of every byte in `data`.
#[inline]
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Complete description of one link's frame layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameFormat {
    /// Start marker bytes.
    pub start: Vec<u8>,
    /// Length field layout.
    pub length: LengthSpec,
    /// Trailer kind.
    pub trailer: Trailer,
    /// Declared lengths above this are treated as corruption.
    pub max_payload: usize,
    /// Declared lengths must be a multiple of this (element width).
    pub payload_multiple: usize,
}

impl FrameFormat {
    /// `[AA][u16 LE length][payload][XOR]`.
    pub fn checksummed() -> Self {
        Self {
            start: vec![DEFAULT_START_MARKER],
            length: LengthSpec::U16 {
                order: ByteOrder::Little,
            },
            trailer: Trailer::Xor,
            max_payload: DEFAULT_MAX_PAYLOAD,
            payload_multiple: 1,
        }
    }

    /// `[AA][u16 LE length][payload][55]`.
    ///
    /// A payload byte equal to 0x55 in the trailer slot is indistinguishable
    /// from a real trailer, so bit flips inside the payload go undetected.
    pub fn marker_terminated() -> Self {
        Self {
            trailer: Trailer::EndMarker {
                bytes: vec![DEFAULT_END_MARKER],
            },
            ..Self::checksummed()
        }
    }

    /// `[AA BB][floats * 4 bytes][XOR]`, no length field.
    pub fn imu(floats: usize) -> Self {
        Self {
            start: vec![DEFAULT_START_MARKER, SECOND_START_MARKER],
            length: LengthSpec::Fixed { len: floats * 4 },
            trailer: Trailer::Xor,
            max_payload: floats * 4,
            payload_multiple: 4,
        }
    }

    /// `[AA BB][rows * cols u16][CC DD]`, no length field.
    pub fn pressure_matrix(rows: usize, cols: usize) -> Self {
        let len = rows * cols * 2;
        Self {
            start: vec![DEFAULT_START_MARKER, SECOND_START_MARKER],
            length: LengthSpec::Fixed { len },
            trailer: Trailer::EndMarker {
                bytes: vec![0xCC, 0xDD],
            },
            max_payload: len,
            payload_multiple: 2,
        }
    }

    /// Set the element width that declared lengths must align to.
    pub fn with_payload_multiple(mut self, width: usize) -> Self {
        self.payload_multiple = width;
        self
    }

    /// Set the payload length sanity ceiling.
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Bytes before the payload.
    #[inline]
    pub fn header_len(&self) -> usize {
        self.start.len() + self.length.field_width()
    }

    /// Effective upper bound on a payload length.
    #[inline]
    pub fn payload_limit(&self) -> usize {
        self.max_payload.min(self.length.field_max())
    }

    /// Longest frame this format can produce.
    #[inline]
    pub fn max_frame_len(&self) -> usize {
        self.header_len() + self.payload_limit() + self.trailer.width()
    }

    /// Whether a declared payload length is plausible.
    #[inline]
    pub fn accepts_length(&self, len: usize) -> bool {
        len <= self.payload_limit() && len % self.payload_multiple == 0
    }

    /// Check the format for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.start.is_empty() || self.start.len() > MAX_MARKER_LEN {
            return Err(SensorwireError::Config(format!(
                "Start marker must be 1-{} bytes, got {}",
                MAX_MARKER_LEN,
                self.start.len()
            )));
        }

        if let Trailer::EndMarker { bytes } = &self.trailer {
            if bytes.is_empty() || bytes.len() > MAX_MARKER_LEN {
                return Err(SensorwireError::Config(format!(
                    "End marker must be 1-{} bytes, got {}",
                    MAX_MARKER_LEN,
                    bytes.len()
                )));
            }
        }

        if self.payload_multiple == 0 {
            return Err(SensorwireError::Config(
                "Payload multiple must be at least 1".to_string(),
            ));
        }

        if let LengthSpec::Fixed { len } = self.length {
            if len > u16::MAX as usize {
                return Err(SensorwireError::Config(format!(
                    "Fixed payload size {} exceeds {}",
                    len,
                    u16::MAX
                )));
            }
            if len > self.max_payload {
                return Err(SensorwireError::Config(format!(
                    "Fixed payload size {} exceeds maximum {}",
                    len, self.max_payload
                )));
            }
            if len % self.payload_multiple != 0 {
                return Err(SensorwireError::Config(format!(
                    "Fixed payload size {} is not a multiple of {}",
                    len, self.payload_multiple
                )));
            }
        }

        Ok(())
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::checksummed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_checksum() {
        assert_eq!(xor_checksum(&[]), 0);
        assert_eq!(xor_checksum(&[0x01, 0x02, 0x03, 0x04]), 0x04);
        assert_eq!(xor_checksum(&[0xFF, 0xFF]), 0);
    }

    #[test]
    fn test_length_u16_byte_order() {
        let le = LengthSpec::U16 {
            order: ByteOrder::Little,
        };
        let be = LengthSpec::U16 {
            order: ByteOrder::Big,
        };
        assert_eq!(le.read(&[0x04, 0x01]), 0x0104);
        assert_eq!(be.read(&[0x04, 0x01]), 0x0401);

        let mut out = Vec::new();
        le.write(96, &mut out).unwrap();
        assert_eq!(out, vec![96, 0]);
    }

    #[test]
    fn test_length_write_overflow() {
        let mut out = Vec::new();
        let result = LengthSpec::U8.write(300, &mut out);
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_fixed_length_write_mismatch() {
        let length = LengthSpec::Fixed { len: 40 };
        let mut out = Vec::new();
        assert!(length.write(40, &mut out).is_ok());
        assert!(out.is_empty());
        assert!(length.write(39, &mut out).is_err());
    }

    #[test]
    fn test_trailer_matches() {
        let payload = [1u8, 2, 3, 4];
        let marker = Trailer::EndMarker { bytes: vec![0x55] };
        assert!(marker.matches(&payload, &[0x55]));
        assert!(!marker.matches(&payload, &[0x00]));

        assert!(Trailer::Xor.matches(&payload, &[0x04]));
        assert!(!Trailer::Xor.matches(&payload, &[0x05]));

        assert!(Trailer::None.matches(&payload, &[]));
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(FrameFormat::checksummed().validate().is_ok());
        assert!(FrameFormat::marker_terminated().validate().is_ok());
        assert!(FrameFormat::imu(10).validate().is_ok());
        assert!(FrameFormat::imu(13).validate().is_ok());
        assert!(FrameFormat::pressure_matrix(6, 6).validate().is_ok());
    }

    #[test]
    fn test_frame_lengths() {
        let format = FrameFormat::marker_terminated();
        assert_eq!(format.header_len(), 3);
        assert_eq!(format.max_frame_len(), 3 + DEFAULT_MAX_PAYLOAD + 1);

        let imu = FrameFormat::imu(10);
        assert_eq!(imu.header_len(), 2);
        assert_eq!(imu.max_frame_len(), 2 + 40 + 1);
    }

    #[test]
    fn test_accepts_length() {
        let format = FrameFormat::checksummed()
            .with_payload_multiple(4)
            .with_max_payload(96);
        assert!(format.accepts_length(96));
        assert!(format.accepts_length(0));
        assert!(!format.accepts_length(95));
        assert!(!format.accepts_length(100));
    }

    #[test]
    fn test_validate_rejects_bad_markers() {
        let mut format = FrameFormat::checksummed();
        format.start.clear();
        assert!(format.validate().is_err());

        let format = FrameFormat {
            trailer: Trailer::EndMarker { bytes: vec![] },
            ..FrameFormat::checksummed()
        };
        let err = format.validate().unwrap_err();
        assert!(err.to_string().contains("End marker"));
    }

    #[test]
    fn test_validate_rejects_misaligned_fixed() {
        let format = FrameFormat {
            length: LengthSpec::Fixed { len: 10 },
            payload_multiple: 4,
            max_payload: 10,
            ..FrameFormat::checksummed()
        };
        assert!(format.validate().is_err());
    }

    #[test]
    fn test_format_json_roundtrip() {
        let json = r#"{
            "start": [170, 187],
            "length": { "kind": "fixed", "len": 40 },
            "trailer": { "kind": "xor" },
            "max_payload": 40,
            "payload_multiple": 4
        }"#;
        let format: FrameFormat = serde_json::from_str(json).unwrap();
        assert_eq!(format, FrameFormat::imu(10));

        let partial: FrameFormat =
            serde_json::from_str(r#"{ "trailer": { "kind": "end_marker", "bytes": [85] } }"#)
                .unwrap();
        assert_eq!(partial, FrameFormat::marker_terminated());
    }
}

//! IMU codec - ten-axis and fused-attitude packets.
//!
//! Two payload layouts, all little-endian `f32`:
//! ```text
//! 10 floats: accel xyz | gyro xyz | mag xyz | pressure
//! 13 floats: roll pitch yaw | accel xyz | gyro xyz | mag xyz | pressure
//! ```

use bytes::Bytes;
use serde::Serialize;

use super::{ArrayCodec, PayloadCodec};
use crate::error::PayloadError;
use crate::protocol::ByteOrder;

/// Floats in a raw ten-axis packet.
pub const RAW_FLOATS: usize = 10;

/// Floats in a packet carrying on-board fused attitude.
pub const FUSED_FLOATS: usize = 13;

/// One IMU sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ImuReading {
    /// Roll, pitch, yaw in degrees, when the board fuses on-chip.
    pub euler: Option<[f32; 3]>,
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    pub mag: [f32; 3],
    pub pressure: f32,
}

/// Codec for [`ImuReading`] packets.
#[derive(Debug, Clone)]
pub struct ImuCodec {
    floats: ArrayCodec<f32>,
    fused: bool,
}

impl ImuCodec {
    /// Raw ten-axis packets.
    pub fn raw() -> Self {
        Self {
            floats: ArrayCodec::new(ByteOrder::Little).with_count(RAW_FLOATS),
            fused: false,
        }
    }

    /// Packets with roll/pitch/yaw in front of the raw axes.
    pub fn fused() -> Self {
        Self {
            floats: ArrayCodec::new(ByteOrder::Little).with_count(FUSED_FLOATS),
            fused: true,
        }
    }

    /// Number of floats per packet.
    pub fn floats(&self) -> usize {
        if self.fused {
            FUSED_FLOATS
        } else {
            RAW_FLOATS
        }
    }

    /// Serialize a reading into a payload.
    pub fn encode(&self, reading: &ImuReading) -> Vec<u8> {
        let mut values = Vec::with_capacity(self.floats());
        if self.fused {
            values.extend_from_slice(&reading.euler.unwrap_or_default());
        }
        values.extend_from_slice(&reading.accel);
        values.extend_from_slice(&reading.gyro);
        values.extend_from_slice(&reading.mag);
        values.push(reading.pressure);
        self.floats.encode(&values)
    }
}

fn triple(values: &[f32]) -> [f32; 3] {
    [values[0], values[1], values[2]]
}

impl PayloadCodec for ImuCodec {
    type Record = ImuReading;

    fn decode(&self, payload: &Bytes) -> Result<ImuReading, PayloadError> {
        let samples = self.floats.decode(payload)?;
        let values = samples.values();

        let (euler, raw) = if self.fused {
            (Some(triple(&values[0..3])), &values[3..])
        } else {
            (None, values)
        };

        Ok(ImuReading {
            euler,
            accel: triple(&raw[0..3]),
            gyro: triple(&raw[3..6]),
            mag: triple(&raw[6..9]),
            pressure: raw[9],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reading() -> ImuReading {
        ImuReading {
            euler: None,
            accel: [0.0, 0.0, 9.81],
            gyro: [0.1, -0.2, 0.3],
            mag: [30.0, 5.0, -40.0],
            pressure: 1013.25,
        }
    }

    #[test]
    fn test_decode_raw_packet() {
        let codec = ImuCodec::raw();
        let payload = Bytes::from(codec.encode(&sample_reading()));
        assert_eq!(payload.len(), 40);

        let reading = codec.decode(&payload).unwrap();
        assert_eq!(reading, sample_reading());
    }

    #[test]
    fn test_decode_fused_packet() {
        let codec = ImuCodec::fused();
        let expected = ImuReading {
            euler: Some([10.0, -5.0, 180.0]),
            ..sample_reading()
        };
        let payload = Bytes::from(codec.encode(&expected));
        assert_eq!(payload.len(), 52);

        let reading = codec.decode(&payload).unwrap();
        assert_eq!(reading.euler, Some([10.0, -5.0, 180.0]));
        assert_eq!(reading.pressure, 1013.25);
    }

    #[test]
    fn test_wrong_size_rejected() {
        let codec = ImuCodec::fused();
        let payload = Bytes::from(ImuCodec::raw().encode(&sample_reading()));
        assert_eq!(
            codec.decode(&payload).unwrap_err(),
            PayloadError::ElementCount {
                expected: 13,
                actual: 10
            }
        );
    }
}

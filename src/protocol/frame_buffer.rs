//! Frame buffer for accumulating partial reads.
//!
//! Pairs an [`Accumulator`] with a [`FrameDecoder`]. Incoming chunks are fed
//! in slices no larger than the accumulator's free space and drained after
//! each slice, so a large read full of valid frames never trips the
//! overflow reset. Only a buffer that is full and still yields nothing is
//! discarded.
//!
//! # Example
//!
//! ```
//! use sensorwire::protocol::{encode_frame, FrameBuffer, FrameFormat};
//!
//! let mut buffer = FrameBuffer::new(FrameFormat::checksummed()).unwrap();
//! let bytes = encode_frame(buffer.format(), b"abc").unwrap();
//!
//! // Data arrives in chunks from the transport
//! assert!(buffer.push(&bytes[..2]).is_empty());
//! let frames = buffer.push(&bytes[2..]);
//! assert_eq!(frames[0].payload(), b"abc");
//! ```

use super::accumulator::{Accumulator, Append, DEFAULT_BUFFER_CEILING};
use super::decoder::{FrameDecoder, FramingStats};
use super::wire_format::FrameFormat;
use super::Frame;
use crate::error::{Result, SensorwireError};

/// Buffer for accumulating incoming bytes and extracting complete frames.
#[derive(Debug)]
pub struct FrameBuffer {
    acc: Accumulator,
    decoder: FrameDecoder,
}

impl FrameBuffer {
    /// Create a frame buffer with the default ceiling.
    pub fn new(format: FrameFormat) -> Result<Self> {
        Self::with_ceiling(format, DEFAULT_BUFFER_CEILING)
    }

    /// Create a frame buffer with a custom ceiling.
    ///
    /// The ceiling must hold at least one maximum-size frame.
    pub fn with_ceiling(format: FrameFormat, ceiling: usize) -> Result<Self> {
        let decoder = FrameDecoder::new(format)?;
        let max_frame = decoder.format().max_frame_len();
        if ceiling < max_frame {
            return Err(SensorwireError::Config(format!(
                "Buffer ceiling {} is smaller than the largest frame ({} bytes)",
                ceiling, max_frame
            )));
        }

        Ok(Self {
            acc: Accumulator::with_ceiling(ceiling),
            decoder,
        })
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the frames in arrival order (may be empty if still waiting
    /// for data). Corrupt candidates and overflow resets are counted in
    /// [`stats`](Self::stats).
    pub fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        self.push_into(data, &mut frames);
        frames
    }

    /// Like [`push`](Self::push), appending frames to `out`.
    pub fn push_into(&mut self, mut data: &[u8], out: &mut Vec<Frame>) -> usize {
        let before = out.len();

        while !data.is_empty() {
            // A full buffer that drained nothing holds no usable frame.
            if self.acc.space() == 0 {
                let discarded = self.clear();
                self.decoder.record_overflow(discarded);
                tracing::debug!(discarded, "Buffer overflow, resyncing");
            }

            let take = self.acc.space().min(data.len());
            if let Append::Overflowed { discarded } = self.acc.append(&data[..take]) {
                self.decoder.record_overflow(discarded);
            }

            self.decoder.drain(&mut self.acc, out);
            data = &data[take..];
        }

        out.len() - before
    }

    /// Append data to the buffer without extracting frames.
    pub fn extend(&mut self, data: &[u8]) -> Append {
        let outcome = self.acc.append(data);
        if let Append::Overflowed { discarded } = outcome {
            self.decoder.record_overflow(discarded);
        }
        outcome
    }

    /// Extract a single frame, reporting rejections to the caller.
    pub fn try_extract_one_frame(
        &mut self,
    ) -> std::result::Result<Option<Frame>, super::FrameReject> {
        self.decoder.try_extract_one_frame(&mut self.acc)
    }

    /// Frame layout in use.
    pub fn format(&self) -> &FrameFormat {
        self.decoder.format()
    }

    /// Framing counters.
    pub fn stats(&self) -> FramingStats {
        self.decoder.stats()
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.acc.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// Configured ceiling.
    pub fn ceiling(&self) -> usize {
        self.acc.ceiling()
    }

    /// Discard buffered bytes, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.acc.len();
        self.acc.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;

    fn marker_buffer() -> FrameBuffer {
        FrameBuffer::new(FrameFormat::marker_terminated()).unwrap()
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = marker_buffer();
        let frames = buffer.push(&[0xAA, 0x04, 0x00, 0x01, 0x02, 0x03, 0x04, 0x55]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &[1, 2, 3, 4]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = marker_buffer();
        let mut combined = Vec::new();
        combined.extend(encode_frame(buffer.format(), b"first").unwrap());
        combined.extend(encode_frame(buffer.format(), b"second").unwrap());
        combined.extend(encode_frame(buffer.format(), b"third").unwrap());

        let frames = buffer.push(&combined);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(frames[1].payload(), b"second");
        assert_eq!(frames[2].payload(), b"third");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = marker_buffer();
        let frame1 = encode_frame(buffer.format(), b"first").unwrap();
        let frame2 = encode_frame(buffer.format(), b"second").unwrap();

        let mut data = frame1.clone();
        data.extend_from_slice(&frame2[..5]);

        let frames = buffer.push(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(buffer.len(), 5);

        let frames = buffer.push(&frame2[5..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"second");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = marker_buffer();
        let frame_bytes = encode_frame(buffer.format(), b"hi").unwrap();

        let mut all_frames = Vec::new();
        for byte in &frame_bytes {
            all_frames.extend(buffer.push(&[*byte]));
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].payload(), b"hi");
    }

    #[test]
    fn test_resync_after_bad_trailer() {
        let mut buffer = marker_buffer();
        let mut data = vec![0xAA, 0x04, 0x00, 0x01, 0x02, 0x03, 0x04, 0x00];
        data.extend(encode_frame(buffer.format(), &[9, 9]).unwrap());

        let frames = buffer.push(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &[9, 9]);
        assert_eq!(buffer.stats().trailer_rejects, 1);
    }

    #[test]
    fn test_large_push_does_not_overflow() {
        let format = FrameFormat::checksummed().with_max_payload(64);
        let mut buffer = FrameBuffer::with_ceiling(format, 128).unwrap();

        let mut data = Vec::new();
        for i in 0..100u8 {
            data.extend(encode_frame(buffer.format(), &[i; 32]).unwrap());
        }

        let frames = buffer.push(&data);
        assert_eq!(frames.len(), 100);
        assert_eq!(buffer.stats().overflows, 0);
    }

    #[test]
    fn test_noise_overflow_resets() {
        let format = FrameFormat::checksummed().with_max_payload(16);
        let mut buffer = FrameBuffer::with_ceiling(format, 64).unwrap();

        let noise = vec![0x11u8; 1000];
        let frames = buffer.push(&noise);

        assert!(frames.is_empty());
        assert!(buffer.len() <= 64);
        assert!(buffer.stats().overflows > 0);

        // Recovers as soon as a real frame shows up
        let good = encode_frame(buffer.format(), &[1, 2, 3]).unwrap();
        let frames = buffer.push(&good);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_ceiling_smaller_than_frame_rejected() {
        let result = FrameBuffer::with_ceiling(FrameFormat::checksummed(), 64);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ceiling"));
    }

    #[test]
    fn test_clear() {
        let mut buffer = marker_buffer();
        buffer.push(&[0xAA, 0x10]);
        assert_eq!(buffer.clear(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_extend_then_extract() {
        let mut buffer = marker_buffer();
        buffer.extend(&[0xAA, 0x01, 0x00, 0x05, 0x55]);
        let frame = buffer.try_extract_one_frame().unwrap().unwrap();
        assert_eq!(frame.payload(), &[5]);
    }
}

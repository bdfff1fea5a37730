//! Frame decoder state machine.
//!
//! One call to [`FrameDecoder::try_extract_one_frame`] walks
//! `SeekingHeader -> ReadingLength -> ReadingPayload -> ReadingTrailer` at
//! most once and either emits a frame, asks for more bytes, or rejects the
//! candidate. Partial frames are never consumed: the state restarts from
//! `SeekingHeader` on every call and the bytes stay in the accumulator
//! until the rest arrives.
//!
//! A rejection drops exactly one byte (the first byte of the failed start
//! marker), so a genuine marker hidden inside the corrupted range is still
//! found on the next call.

use serde::Serialize;

use super::accumulator::Accumulator;
use super::frame::Frame;
use super::wire_format::FrameFormat;
use crate::error::Result;

/// Why a candidate frame was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameReject {
    /// Declared length above the ceiling or not aligned to the element width.
    Length { declared: usize },
    /// End marker or checksum did not match.
    Trailer,
}

/// Running framing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FramingStats {
    /// Frames emitted.
    pub frames: u64,
    /// Candidates dropped for a bad trailer.
    pub trailer_rejects: u64,
    /// Candidates dropped for an implausible length.
    pub length_rejects: u64,
    /// Bytes skipped while seeking a start marker or resyncing.
    pub garbage_bytes: u64,
    /// Accumulator resets after exceeding the ceiling.
    pub overflows: u64,
}

/// Position in the single-pass traversal.
#[derive(Debug, Clone, Copy)]
enum State {
    SeekingHeader,
    ReadingLength,
    ReadingPayload { len: usize },
    ReadingTrailer { len: usize },
}

/// Extracts frames of one [`FrameFormat`] from an [`Accumulator`].
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    format: FrameFormat,
    stats: FramingStats,
}

impl FrameDecoder {
    /// Create a decoder, validating the format first.
    pub fn new(format: FrameFormat) -> Result<Self> {
        format.validate()?;
        Ok(Self {
            format,
            stats: FramingStats::default(),
        })
    }

    /// The frame layout this decoder extracts.
    #[inline]
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Counters since creation.
    #[inline]
    pub fn stats(&self) -> FramingStats {
        self.stats
    }

    /// Try to extract a single frame from the front of `acc`.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete, valid frame was removed from `acc`
    /// - `Ok(None)` if more bytes are needed (nothing past leading garbage is consumed)
    /// - `Err(reject)` if a candidate was corrupt; one byte was dropped and the
    ///   caller should call again
    pub fn try_extract_one_frame(
        &mut self,
        acc: &mut Accumulator,
    ) -> std::result::Result<Option<Frame>, FrameReject> {
        let start_len = self.format.start.len();
        let header_len = self.format.header_len();
        let trailer_len = self.format.trailer.width();

        let mut state = State::SeekingHeader;
        loop {
            match state {
                State::SeekingHeader => {
                    let Some(offset) = acc.find(&self.format.start) else {
                        return Ok(None);
                    };
                    if offset > 0 {
                        acc.drop_prefix(offset);
                        self.stats.garbage_bytes += offset as u64;
                    }
                    state = State::ReadingLength;
                }

                State::ReadingLength => {
                    if acc.len() < header_len {
                        return Ok(None);
                    }

                    let len = self.format.length.read(&acc.bytes()[start_len..header_len]);
                    if !self.format.accepts_length(len) {
                        self.resync(acc);
                        self.stats.length_rejects += 1;
                        return Err(FrameReject::Length { declared: len });
                    }
                    state = State::ReadingPayload { len };
                }

                State::ReadingPayload { len } => {
                    if acc.len() < header_len + len {
                        return Ok(None);
                    }
                    state = State::ReadingTrailer { len };
                }

                State::ReadingTrailer { len } => {
                    let payload_end = header_len + len;
                    let total = payload_end + trailer_len;
                    if acc.len() < total {
                        return Ok(None);
                    }

                    let bytes = acc.bytes();
                    let payload = &bytes[header_len..payload_end];
                    let received = &bytes[payload_end..total];
                    if !self.format.trailer.matches(payload, received) {
                        self.resync(acc);
                        self.stats.trailer_rejects += 1;
                        return Err(FrameReject::Trailer);
                    }

                    let raw = acc.split_prefix(total);
                    self.stats.frames += 1;
                    return Ok(Some(Frame::from_raw(raw, start_len, header_len, len)));
                }
            }
        }
    }

    /// Extract every complete frame currently in `acc`, appending to `out`.
    ///
    /// Rejections are counted and skipped. Returns the number of frames added.
    pub fn drain(&mut self, acc: &mut Accumulator, out: &mut Vec<Frame>) -> usize {
        let before = out.len();
        loop {
            match self.try_extract_one_frame(acc) {
                Ok(Some(frame)) => out.push(frame),
                Ok(None) => break,
                Err(reject) => {
                    tracing::trace!(?reject, buffered = acc.len(), "Frame rejected, resyncing");
                }
            }
        }
        out.len() - before
    }

    /// Drop the first byte of the failed start marker.
    fn resync(&mut self, acc: &mut Accumulator) {
        acc.drop_prefix(1);
        self.stats.garbage_bytes += 1;
    }

    pub(crate) fn record_overflow(&mut self, discarded: usize) {
        self.stats.overflows += 1;
        self.stats.garbage_bytes += discarded as u64;
    }
}

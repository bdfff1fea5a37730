//! Capped byte accumulator for partial reads.
//!
//! Uses `bytes::BytesMut` so dropping a consumed prefix only moves the
//! read cursor. The buffer never holds more than its ceiling: an append
//! that pushes past it discards everything, which is how a link sending
//! garbage (wrong baud rate, unplugged ground) recovers.

use bytes::{Buf, Bytes, BytesMut};

/// Default accumulator ceiling in bytes.
pub const DEFAULT_BUFFER_CEILING: usize = 4096;

/// Outcome of [`Accumulator::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    /// Bytes were stored.
    Stored,
    /// The ceiling was exceeded and the whole buffer was discarded.
    Overflowed { discarded: usize },
}

/// Growable byte buffer owning every byte not yet framed or discarded.
#[derive(Debug)]
pub struct Accumulator {
    buf: BytesMut,
    ceiling: usize,
}

impl Accumulator {
    /// Create an accumulator with the default ceiling.
    pub fn new() -> Self {
        Self::with_ceiling(DEFAULT_BUFFER_CEILING)
    }

    /// Create an accumulator that resets once it holds more than `ceiling` bytes.
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(ceiling),
            ceiling,
        }
    }

    /// Append a chunk in arrival order.
    pub fn append(&mut self, chunk: &[u8]) -> Append {
        self.buf.extend_from_slice(chunk);

        if self.buf.len() > self.ceiling {
            let discarded = self.buf.len();
            self.buf.clear();
            return Append::Overflowed { discarded };
        }

        Append::Stored
    }

    /// Offset of the first occurrence of `marker`.
    pub fn find(&self, marker: &[u8]) -> Option<usize> {
        match marker {
            [] => None,
            [byte] => self.buf.iter().position(|b| b == byte),
            _ => self
                .buf
                .windows(marker.len())
                .position(|window| window == marker),
        }
    }

    /// Remove the first `n` bytes (clamped to the buffer length).
    #[inline]
    pub fn drop_prefix(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }

    /// Detach the first `n` bytes without copying.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the buffered length.
    #[inline]
    pub fn split_prefix(&mut self, n: usize) -> Bytes {
        self.buf.split_to(n).freeze()
    }

    /// Buffered bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured ceiling.
    #[inline]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Bytes that can be appended before the ceiling is reached.
    #[inline]
    pub fn space(&self) -> usize {
        self.ceiling.saturating_sub(self.buf.len())
    }

    /// Discard everything.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

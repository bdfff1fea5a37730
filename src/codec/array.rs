//! Array codec - fixed-width numeric samples.
//!
//! Most sensor boards send a flat run of identical numbers: a 6x4 grid of
//! `f32` stretch readings, 24 `f64` millivolt values, a vector of `i32`
//! glove channels, or a 6x6 big-endian `u16` pressure matrix. One codec
//! covers all of them, parameterised by sample type and byte order.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use sensorwire::codec::{ArrayCodec, PayloadCodec};
//! use sensorwire::protocol::ByteOrder;
//!
//! let codec = ArrayCodec::<u16>::new(ByteOrder::Big).with_shape(2, 3);
//! let payload = Bytes::from(codec.encode(&[1, 2, 3, 4, 5, 6]));
//!
//! let grid = codec.decode(&payload).unwrap();
//! assert_eq!(grid.rows(), 2);
//! assert_eq!(grid.row(1), Some(&[4u16, 5, 6][..]));
//! ```

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;

use super::PayloadCodec;
use crate::error::PayloadError;
use crate::protocol::ByteOrder;

/// A fixed-width number that can be read from a payload.
pub trait Sample: Copy + fmt::Debug + Send + Sync + 'static {
    /// Width on the wire in bytes.
    const WIDTH: usize;

    /// Read one sample from the first `WIDTH` bytes of `bytes`.
    fn read(bytes: &[u8], order: ByteOrder) -> Self;

    /// Append one sample.
    fn write(self, order: ByteOrder, out: &mut Vec<u8>);
}

macro_rules! impl_sample {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Sample for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn read(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::WIDTH]);
                    match order {
                        ByteOrder::Little => <$ty>::from_le_bytes(raw),
                        ByteOrder::Big => <$ty>::from_be_bytes(raw),
                    }
                }

                #[inline]
                fn write(self, order: ByteOrder, out: &mut Vec<u8>) {
                    match order {
                        ByteOrder::Little => out.extend_from_slice(&self.to_le_bytes()),
                        ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
                    }
                }
            }
        )*
    };
}

impl_sample!(u16, i16, u32, i32, f32, f64);

/// Decoded samples, optionally arranged in rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples<S> {
    values: Vec<S>,
    cols: Option<usize>,
}

impl<S: Sample> Samples<S> {
    /// All samples in wire order.
    #[inline]
    pub fn values(&self) -> &[S] {
        &self.values
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the payload held no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row width, if the codec declared a grid shape.
    #[inline]
    pub fn cols(&self) -> Option<usize> {
        self.cols
    }

    /// Number of rows (1 for an unshaped vector).
    pub fn rows(&self) -> usize {
        match self.cols {
            Some(cols) if cols > 0 => self.values.len() / cols,
            _ => 1,
        }
    }

    /// Samples of row `index`.
    pub fn row(&self, index: usize) -> Option<&[S]> {
        match self.cols {
            Some(cols) if cols > 0 => self.values.chunks_exact(cols).nth(index),
            _ if index == 0 => Some(&self.values),
            _ => None,
        }
    }

    /// Take ownership of the samples.
    pub fn into_vec(self) -> Vec<S> {
        self.values
    }
}

/// Codec for a payload made of `S` samples.
pub struct ArrayCodec<S> {
    order: ByteOrder,
    count: Option<usize>,
    cols: Option<usize>,
    _sample: PhantomData<fn() -> S>,
}

impl<S: Sample> ArrayCodec<S> {
    /// Accept any whole number of samples in `order`.
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            count: None,
            cols: None,
            _sample: PhantomData,
        }
    }

    /// Require exactly `count` samples.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Require a `rows x cols` grid (row-major).
    pub fn with_shape(mut self, rows: usize, cols: usize) -> Self {
        self.count = Some(rows * cols);
        self.cols = Some(cols);
        self
    }

    /// Byte order in use.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Payload size this codec expects, when the count is fixed.
    pub fn payload_len(&self) -> Option<usize> {
        self.count.map(|count| count * S::WIDTH)
    }

    /// Serialize samples into a payload.
    pub fn encode(&self, samples: &[S]) -> Vec<u8> {
        let mut out = Vec::with_capacity(samples.len() * S::WIDTH);
        for sample in samples {
            sample.write(self.order, &mut out);
        }
        out
    }
}

impl<S: Sample> PayloadCodec for ArrayCodec<S> {
    type Record = Samples<S>;

    fn decode(&self, payload: &Bytes) -> Result<Samples<S>, PayloadError> {
        if payload.len() % S::WIDTH != 0 {
            return Err(PayloadError::Misaligned {
                len: payload.len(),
                width: S::WIDTH,
            });
        }

        let actual = payload.len() / S::WIDTH;
        if let Some(expected) = self.count {
            if actual != expected {
                return Err(PayloadError::ElementCount { expected, actual });
            }
        }

        let values = payload
            .chunks_exact(S::WIDTH)
            .map(|chunk| S::read(chunk, self.order))
            .collect();

        Ok(Samples {
            values,
            cols: self.cols,
        })
    }
}

impl<S> Clone for ArrayCodec<S> {
    fn clone(&self) -> Self {
        Self {
            order: self.order,
            count: self.count,
            cols: self.cols,
            _sample: PhantomData,
        }
    }
}

impl<S> fmt::Debug for ArrayCodec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayCodec")
            .field("sample", &std::any::type_name::<S>())
            .field("order", &self.order)
            .field("count", &self.count)
            .field("cols", &self.cols)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_f32_grid() {
        // 6x4 stretch-sensor grid
        let codec = ArrayCodec::<f32>::new(ByteOrder::Little).with_shape(6, 4);
        let values: Vec<f32> = (0..24).map(|i| i as f32 * 0.5).collect();
        let payload = Bytes::from(codec.encode(&values));
        assert_eq!(payload.len(), 96);

        let grid = codec.decode(&payload).unwrap();
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.rows(), 6);
        assert_eq!(grid.row(0), Some(&[0.0, 0.5, 1.0, 1.5][..]));
        assert_eq!(grid.row(5).unwrap()[3], 11.5);
        assert_eq!(grid.row(6), None);
    }

    #[test]
    fn test_decode_big_endian_u16() {
        let codec = ArrayCodec::<u16>::new(ByteOrder::Big);
        let payload = Bytes::from_static(&[0x01, 0x02, 0xFF, 0x00]);

        let samples = codec.decode(&payload).unwrap();
        assert_eq!(samples.values(), &[0x0102, 0xFF00]);
        assert_eq!(samples.rows(), 1);
        assert_eq!(samples.row(0), Some(&[0x0102, 0xFF00][..]));
    }

    #[test]
    fn test_decode_i32_little_endian() {
        let codec = ArrayCodec::<i32>::new(ByteOrder::Little);
        let payload = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0x10, 0x00, 0x00, 0x00]);
        assert_eq!(codec.decode(&payload).unwrap().into_vec(), vec![-1, 16]);
    }

    #[test]
    fn test_decode_f64() {
        let codec = ArrayCodec::<f64>::new(ByteOrder::Little).with_count(2);
        let payload = Bytes::from(codec.encode(&[3.3, -0.25]));
        assert_eq!(codec.decode(&payload).unwrap().values(), &[3.3, -0.25]);
        assert_eq!(codec.payload_len(), Some(16));
    }

    #[test]
    fn test_misaligned_payload() {
        let codec = ArrayCodec::<f32>::new(ByteOrder::Little);
        let err = codec.decode(&Bytes::from_static(&[0; 10])).unwrap_err();
        assert_eq!(err, PayloadError::Misaligned { len: 10, width: 4 });
    }

    #[test]
    fn test_wrong_element_count() {
        let codec = ArrayCodec::<i16>::new(ByteOrder::Little).with_count(4);
        let err = codec.decode(&Bytes::from_static(&[0; 6])).unwrap_err();
        assert_eq!(
            err,
            PayloadError::ElementCount {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_empty_payload_without_count() {
        let codec = ArrayCodec::<u32>::new(ByteOrder::Little);
        let samples = codec.decode(&Bytes::new()).unwrap();
        assert!(samples.is_empty());
    }
}

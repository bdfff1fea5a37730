//! Raw codec - pass-through for payload bytes.
//!
//! Used when the consumer interprets the payload itself, or only needs
//! the bytes (logging, forwarding).
//!
//! # Example
//!
//! ```
//! use sensorwire::codec::{PayloadCodec, RawCodec};
//! use bytes::Bytes;
//!
//! let payload = Bytes::from_static(b"zero copy");
//! let record = RawCodec.decode(&payload).unwrap();
//! assert_eq!(record.as_ptr(), payload.as_ptr()); // Same memory
//! ```

use bytes::Bytes;

use super::PayloadCodec;
use crate::error::PayloadError;

/// Raw codec that hands back the payload without transformation.
///
/// Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl PayloadCodec for RawCodec {
    type Record = Bytes;

    #[inline]
    fn decode(&self, payload: &Bytes) -> Result<Bytes, PayloadError> {
        Ok(payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_zero_copy() {
        let payload = Bytes::from_static(b"static data");
        let record = RawCodec.decode(&payload).unwrap();

        assert_eq!(record.as_ptr(), payload.as_ptr());
        assert_eq!(record.len(), payload.len());
    }

    #[test]
    fn test_decode_empty() {
        let record = RawCodec.decode(&Bytes::new()).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_binary_data_preserved() {
        // All byte values survive
        let all_bytes: Vec<u8> = (0..=255).collect();
        let record = RawCodec.decode(&Bytes::from(all_bytes.clone())).unwrap();
        assert_eq!(&record[..], &all_bytes[..]);
    }
}

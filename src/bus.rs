//! Latest-value delivery between the read loop and consumers.
//!
//! The [`FrameBus`] is a single slot. Publishing overwrites whatever the
//! consumers have not taken yet, so the producer never waits and a slow
//! consumer always sees the newest reading. Intermediate values are
//! dropped, not queued.
//!
//! # Usage
//!
//! The pipeline's read loop owns one handle and publishes the last record
//! of every drain burst. Consumers poll [`FrameBus::take`] on their own
//! timer; `None` means "nothing new since the last take".
//!
//! ```
//! use sensorwire::FrameBus;
//!
//! let bus = FrameBus::new();
//! let consumer = bus.clone();
//!
//! bus.publish(1);
//! bus.publish(2); // overwrites 1
//!
//! assert_eq!(consumer.take(), Some(2));
//! assert_eq!(consumer.take(), None);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Single-slot, overwrite-on-write cell shared by clone.
pub struct FrameBus<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> FrameBus<T> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Store `value`, replacing any unread one.
    ///
    /// Returns `true` if an unread value was discarded.
    #[inline]
    pub fn publish(&self, value: T) -> bool {
        self.slot.lock().replace(value).is_some()
    }

    /// Remove and return the current value, leaving the slot empty.
    ///
    /// Never blocks waiting for data.
    #[inline]
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    /// Whether a value is waiting to be taken.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<T: Clone> FrameBus<T> {
    /// Copy of the current value without clearing it.
    pub fn peek(&self) -> Option<T> {
        self.slot.lock().clone()
    }
}

impl<T> Clone for FrameBus<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for FrameBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FrameBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBus")
            .field("pending", &self.has_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_take_returns_none() {
        let bus: FrameBus<u32> = FrameBus::new();
        assert_eq!(bus.take(), None);
        assert!(!bus.has_pending());
    }

    #[test]
    fn test_latest_wins_coalescing() {
        let bus = FrameBus::new();

        assert!(!bus.publish("first"));
        assert!(bus.publish("second"));

        assert_eq!(bus.take(), Some("second"));
        assert_eq!(bus.take(), None);
    }

    #[test]
    fn test_publish_after_take_is_not_coalesced() {
        let bus = FrameBus::new();
        bus.publish(1);
        assert_eq!(bus.take(), Some(1));
        assert!(!bus.publish(2));
        assert_eq!(bus.take(), Some(2));
    }

    #[test]
    fn test_peek_keeps_value() {
        let bus = FrameBus::new();
        bus.publish(vec![1u8, 2, 3]);
        assert_eq!(bus.peek(), Some(vec![1, 2, 3]));
        assert!(bus.has_pending());
        assert_eq!(bus.take(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_clones_share_slot() {
        let producer = FrameBus::new();
        let consumer = producer.clone();

        producer.publish(7);
        assert_eq!(consumer.take(), Some(7));
        assert!(!producer.has_pending());
    }

    #[test]
    fn test_concurrent_publish_and_take() {
        let bus = FrameBus::new();
        let producer = bus.clone();

        let handle = thread::spawn(move || {
            for i in 0..10_000u64 {
                producer.publish(i);
            }
        });

        // Values seen by the consumer only ever move forward
        let mut last = None;
        while !handle.is_finished() {
            if let Some(value) = bus.take() {
                if let Some(prev) = last {
                    assert!(value > prev);
                }
                last = Some(value);
            }
        }
        handle.join().unwrap();

        if let Some(value) = bus.take() {
            last = Some(value);
        }
        assert_eq!(last, Some(9_999));
    }
}

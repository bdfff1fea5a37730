//! Sliding-window rate measurement.
//!
//! Keeps the last `capacity` distinct timestamps on the monotonic clock,
//! each with the number of events seen at that instant. The rate is the
//! events after the oldest stamp divided by `newest - oldest`, so a read
//! that yields many frames at once counts every one of them.

use std::collections::VecDeque;
use std::time::Instant;

/// Default number of timestamps kept.
pub const DEFAULT_RATE_WINDOW: usize = 30;

/// Events-per-second over a fixed-size window.
#[derive(Debug, Clone)]
pub struct RateTracker {
    stamps: VecDeque<(Instant, u64)>,
    capacity: usize,
}

impl RateTracker {
    /// Create a tracker over the last `capacity` timestamps (at least 2).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            stamps: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an event now.
    #[inline]
    pub fn record_event(&mut self) {
        self.record_at(Instant::now());
    }

    /// Record one event at `at`.
    #[inline]
    pub fn record_at(&mut self, at: Instant) {
        self.record_events(1, at);
    }

    /// Record `count` events that all arrived at `at`.
    ///
    /// Events at the same instant as the newest stamp are merged into it.
    /// Otherwise a new stamp is pushed, dropping the oldest if the window is
    /// full.
    pub fn record_events(&mut self, count: u64, at: Instant) {
        if count == 0 {
            return;
        }
        if let Some((newest, n)) = self.stamps.back_mut() {
            if *newest >= at {
                *n += count;
                return;
            }
        }
        if self.stamps.len() == self.capacity {
            self.stamps.pop_front();
        }
        self.stamps.push_back((at, count));
    }

    /// Events per second, or 0.0 with fewer than two distinct stamps.
    pub fn rate(&self) -> f64 {
        let (Some((oldest, _)), Some((newest, _))) = (self.stamps.front(), self.stamps.back())
        else {
            return 0.0;
        };

        let elapsed = newest.duration_since(*oldest).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        // Events at the oldest stamp opened the window
        let events: u64 = self.stamps.iter().skip(1).map(|(_, n)| n).sum();
        events as f64 / elapsed
    }

    /// Distinct timestamps currently held.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// True before the first event or after [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Events across all held timestamps.
    pub fn events(&self) -> u64 {
        self.stamps.iter().map(|(_, n)| n).sum()
    }

    /// Window capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget all samples.
    pub fn clear(&mut self) {
        self.stamps.clear();
    }
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_zero_without_samples() {
        let tracker = RateTracker::default();
        assert_eq!(tracker.rate(), 0.0);
    }

    #[test]
    fn test_rate_zero_with_one_sample() {
        let mut tracker = RateTracker::default();
        tracker.record_event();
        assert_eq!(tracker.rate(), 0.0);
    }

    #[test]
    fn test_rate_for_known_interval() {
        let mut tracker = RateTracker::new(30);
        let start = Instant::now();
        for i in 0..5u32 {
            tracker.record_at(start + Duration::from_millis(10) * i);
        }

        // 4 intervals over 40ms
        assert!((tracker.rate() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_drops_oldest() {
        let mut tracker = RateTracker::new(3);
        let start = Instant::now();

        // Slow at first, then fast
        tracker.record_at(start);
        tracker.record_at(start + Duration::from_secs(1));
        tracker.record_at(start + Duration::from_millis(1_010));
        tracker.record_at(start + Duration::from_millis(1_020));

        assert_eq!(tracker.len(), 3);
        assert!((tracker.rate() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_identical_timestamps() {
        let mut tracker = RateTracker::new(4);
        let now = Instant::now();
        tracker.record_at(now);
        tracker.record_at(now);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.events(), 2);
        assert_eq!(tracker.rate(), 0.0);
    }

    #[test]
    fn test_burst_larger_than_window() {
        let mut tracker = RateTracker::new(30);
        let start = Instant::now();

        // 40 events in one read must not fill the window with one instant
        tracker.record_events(40, start);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.rate(), 0.0);

        tracker.record_events(40, start + Duration::from_millis(10));
        assert!((tracker.rate() - 4000.0).abs() < 1e-6);
    }

    #[test]
    fn test_bursty_reads_report_true_rate() {
        let mut tracker = RateTracker::new(5);
        let start = Instant::now();
        for i in 0..20u32 {
            tracker.record_events(40, start + Duration::from_millis(10) * i);
        }

        // 4 reads of 40 events over 40ms after the oldest stamp
        assert_eq!(tracker.len(), 5);
        assert!((tracker.rate() - 4000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_events_ignored() {
        let mut tracker = RateTracker::default();
        tracker.record_events(0, Instant::now());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_minimum_capacity() {
        let tracker = RateTracker::new(0);
        assert_eq!(tracker.capacity(), 2);
    }

    #[test]
    fn test_clear() {
        let mut tracker = RateTracker::default();
        tracker.record_event();
        tracker.record_event();
        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.rate(), 0.0);
    }
}

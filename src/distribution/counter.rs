//! Shared atomic counter
//!
//! Hands out strictly increasing ordinals to any number of threads. Clones
//! share the same cursor, so concurrent inserters never receive the same
//! ordinal.

use super::Generator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter generator backed by a shared `AtomicU64`
#[derive(Debug, Clone)]
pub struct CounterGenerator {
    next: Arc<AtomicU64>,
    start: u64,
    /// Last value drawn through this handle
    last: u64,
}

impl CounterGenerator {
    /// Create a counter whose first value is `start`
    pub fn new(start: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(start)),
            start,
            last: start,
        }
    }

    /// Next value that will be handed out (number of draws + start)
    #[inline]
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Acquire)
    }

    /// First value of the sequence
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of values handed out across all handles
    pub fn issued(&self) -> u64 {
        self.current() - self.start
    }

    /// Advance the shared cursor without touching this handle's last value
    ///
    /// Returns the value that was handed out.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.next.fetch_add(1, Ordering::AcqRel)
    }
}

impl Generator<u64> for CounterGenerator {
    #[inline]
    fn next_value(&mut self) -> u64 {
        self.last = self.next.fetch_add(1, Ordering::AcqRel);
        self.last
    }

    fn last_value(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_counter_sequence() {
        let mut counter = CounterGenerator::new(10);
        assert_eq!(counter.next_value(), 10);
        assert_eq!(counter.next_value(), 11);
        assert_eq!(counter.last_value(), 11);
        assert_eq!(counter.current(), 12);
        assert_eq!(counter.issued(), 2);
    }

    #[test]
    fn test_counter_clones_share_cursor() {
        let mut a = CounterGenerator::new(0);
        let mut b = a.clone();

        assert_eq!(a.next_value(), 0);
        assert_eq!(b.next_value(), 1);
        // Each handle remembers its own last draw
        assert_eq!(a.last_value(), 0);
        assert_eq!(b.last_value(), 1);
    }

    #[test]
    fn test_counter_increment_through_shared_handle() {
        let counter = CounterGenerator::new(5);
        let observer = counter.clone();
        assert_eq!(counter.increment(), 5);
        assert_eq!(counter.increment(), 6);
        assert_eq!(observer.current(), 7);
        assert_eq!(observer.issued(), 2);
        assert_eq!(counter.last_value(), 5);
    }

    #[test]
    fn test_counter_unique_across_threads() {
        let counter = CounterGenerator::new(0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut c = counter.clone();
                thread::spawn(move || (0..1000).map(|_| c.next_value()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for v in handle.join().unwrap() {
                assert!(seen.insert(v), "duplicate ordinal {}", v);
            }
        }
        assert_eq!(seen.len(), 4000);
        assert_eq!(counter.current(), 4000);
    }
}

//! Countdown latch
//!
//! A barrier initialized to a count that threads decrement once each. Waiters
//! block until the count reaches zero, either indefinitely or for a bounded
//! time. The bounded wait doubles as the status reporter's sleep.
//!
//! # Example
//!
//! ```
//! use kvpulse::util::latch::{CountDownLatch, LatchGuard};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let latch = Arc::new(CountDownLatch::new(2));
//! let handles: Vec<_> = (0..2)
//!     .map(|_| {
//!         let latch = Arc::clone(&latch);
//!         thread::spawn(move || {
//!             let _guard = LatchGuard::new(&latch);
//!             // work...
//!         })
//!     })
//!     .collect();
//!
//! latch.wait();
//! assert_eq!(latch.count(), 0);
//! # for h in handles { h.join().unwrap(); }
//! ```

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct CountDownLatch {
    count: Mutex<usize>,
    zero: Condvar,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Decrement the count, waking every waiter when it reaches zero
    ///
    /// Extra calls once the count is zero have no effect.
    pub fn count_down(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Block until the count reaches zero
    pub fn wait(&self) {
        let count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        let _count = self
            .zero
            .wait_while(count, |c| *c > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block for at most `timeout`; returns whether the count reached zero
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            count = self
                .zero
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Current count
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts a latch down exactly once, at the latest when dropped
///
/// Holding one of these across fallible work guarantees the latch is released
/// on early returns and panics.
#[derive(Debug)]
pub struct LatchGuard<'a> {
    latch: Option<&'a CountDownLatch>,
}

impl<'a> LatchGuard<'a> {
    pub fn new(latch: &'a CountDownLatch) -> Self {
        Self { latch: Some(latch) }
    }

    /// Count down now instead of at drop
    pub fn release(mut self) {
        if let Some(latch) = self.latch.take() {
            latch.count_down();
        }
    }
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        if let Some(latch) = self.latch.take() {
            latch.count_down();
        }
    }
}

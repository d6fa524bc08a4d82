//! Shared rate limiter
//!
//! Thin wrapper over [`ratelimit::Ratelimiter`] shared by every worker of a
//! phase to cap the aggregate issue rate. The bucket refills `amount` tokens
//! every `interval`, where `amount` is kept small enough that the interval
//! stays at microsecond granularity or above. `consume` blocks, sleeping for
//! whatever wait the bucket reports, until each of its tokens was granted.
//!
//! # Example
//!
//! ```
//! use kvpulse::util::rate_limit::RateLimiter;
//!
//! let limiter = RateLimiter::new(1_000).unwrap();
//! for _ in 0..10 {
//!     limiter.consume(1); // returns immediately while the bucket has tokens
//! }
//! assert_eq!(limiter.rate(), 1_000);
//! ```

use crate::Result;
use anyhow::Context;
use ratelimit::Ratelimiter;
use std::thread;
use std::time::Duration;

/// Token bucket shared between worker threads
pub struct RateLimiter {
    /// `None` when the rate is zero
    inner: Option<Ratelimiter>,
    rate: u64,
}

impl RateLimiter {
    /// Limiter allowing `rate` tokens per second with one second of burst
    ///
    /// A rate of zero means unlimited.
    pub fn new(rate: u64) -> Result<Self> {
        Self::with_capacity(rate, rate)
    }

    /// Limiter with an explicit burst size; the bucket starts full
    pub fn with_capacity(rate: u64, capacity: u64) -> Result<Self> {
        if rate == 0 {
            return Ok(Self { inner: None, rate });
        }

        let amount = rate.div_ceil(1_000_000);
        let interval = Duration::from_nanos(1_000_000_000 / (rate / amount));
        let max_tokens = capacity.max(amount);

        let inner = Ratelimiter::builder(amount, interval)
            .max_tokens(max_tokens)
            .initial_available(max_tokens)
            .build()
            .with_context(|| format!("Failed to build rate limiter for {} ops/sec", rate))?;

        Ok(Self {
            inner: Some(inner),
            rate,
        })
    }

    /// Take `n` tokens, sleeping until they are granted
    pub fn consume(&self, n: u64) {
        let Some(limiter) = &self.inner else {
            return;
        };
        for _ in 0..n {
            while let Err(wait) = limiter.try_wait() {
                thread::sleep(wait);
            }
        }
    }

    /// Configured tokens per second; zero when unlimited
    pub fn rate(&self) -> u64 {
        self.rate
    }

    pub fn is_unlimited(&self) -> bool {
        self.inner.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_burst_is_free() {
        let limiter = RateLimiter::new(100).unwrap();
        let start = Instant::now();
        for _ in 0..100 {
            limiter.consume(1);
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_ten_seconds_of_tokens_take_nine() {
        // One second of burst, then 45 tokens at 5/s
        let limiter = RateLimiter::new(5).unwrap();
        let start = Instant::now();
        for _ in 0..50 {
            limiter.consume(1);
        }
        assert!(start.elapsed() >= Duration::from_millis(8_950), "{:?}", start.elapsed());
    }

    #[test]
    fn test_shared_between_threads() {
        let limiter = Arc::new(RateLimiter::with_capacity(100, 10).unwrap());
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    for _ in 0..15 {
                        limiter.consume(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // 60 tokens, 10 up front, 50 at 100/s
        assert!(start.elapsed() >= Duration::from_millis(480));
    }

    #[test]
    fn test_consume_many_at_once() {
        let limiter = RateLimiter::with_capacity(50, 1).unwrap();
        let start = Instant::now();
        limiter.consume(6);
        // One from the bucket, five at 20ms each
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_zero_rate_is_unlimited() {
        let limiter = RateLimiter::new(0).unwrap();
        assert!(limiter.is_unlimited());
        assert_eq!(limiter.rate(), 0);
        let start = Instant::now();
        limiter.consume(1_000_000);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_high_rate_uses_larger_refills() {
        let limiter = RateLimiter::new(5_000_000).unwrap();
        assert!(!limiter.is_unlimited());
        assert_eq!(limiter.rate(), 5_000_000);
        limiter.consume(1_000);
    }
}

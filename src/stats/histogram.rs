//! Latency histogram using HdrHistogram
//!
//! Wraps an `hdrhistogram::Histogram` recording microseconds, from 1µs up to
//! one hour with 3 significant digits.
//!
//! # Example
//!
//! ```
//! use kvpulse::stats::histogram::LatencyHistogram;
//!
//! let mut hist = LatencyHistogram::new();
//! hist.record_us(100);
//! hist.record_us(150);
//! hist.record_us(200);
//!
//! assert_eq!(hist.len(), 3);
//! assert!(hist.percentile_us(50.0).unwrap() >= 100);
//! ```

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};

/// Largest trackable latency: one hour in microseconds
pub const MAX_TRACKABLE_US: u64 = 3_600_000_000;

/// Latency histogram in microseconds
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

/// Standard percentile set reported for every kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        // Bounds are constants, so construction cannot fail
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKABLE_US, 3)
            .expect("histogram bounds are valid");
        Self { histogram }
    }

    /// Record one sample, clamped into the trackable range
    #[inline]
    pub fn record_us(&mut self, micros: u64) {
        let value = micros.clamp(1, MAX_TRACKABLE_US);
        let _ = self.histogram.record(value);
    }

    /// Value at `percentile` (0.0 - 100.0), `None` when empty
    pub fn percentile_us(&self, percentile: f64) -> Option<u64> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(self.histogram.value_at_percentile(percentile))
    }

    /// p50/p95/p99/p99.9, `None` when empty
    pub fn percentiles(&self) -> Option<Percentiles> {
        Some(Percentiles {
            p50: self.percentile_us(50.0)?,
            p95: self.percentile_us(95.0)?,
            p99: self.percentile_us(99.0)?,
            p999: self.percentile_us(99.9)?,
        })
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Fold another histogram into this one
    pub fn merge(&mut self, other: &LatencyHistogram) {
        // Both sides share the same bounds
        let _ = self.histogram.add(&other.histogram);
    }

    pub fn reset(&mut self) {
        self.histogram.reset();
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

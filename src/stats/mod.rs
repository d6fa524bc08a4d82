//! Statistics collection
//!
//! Process-wide measurement store shared by every worker of a phase.
//!
//! Each `(operation kind, success|failure)` pair owns a slot of cache-line
//! aligned atomic counters (count, total latency, min, max), so recording a
//! sample is four relaxed atomic updates and never takes a lock. When
//! percentiles are requested, each pair additionally owns an HdrHistogram
//! behind a `Mutex`, so failure latencies never skew the success percentiles;
//! contention is limited to workers recording the same pair at the same
//! instant.
//!
//! # Example
//!
//! ```
//! use kvpulse::stats::Measurements;
//! use kvpulse::workload::Operation;
//! use std::time::Duration;
//!
//! let stats = Measurements::new(false);
//! stats.record(Operation::Read, true, Duration::from_micros(120));
//! stats.record(Operation::Read, false, Duration::from_micros(80));
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.total_operations, 2);
//! assert_eq!(snapshot.get(Operation::Read, true).unwrap().count, 1);
//! ```

pub mod histogram;
pub mod live;

use crate::workload::Operation;
use histogram::{LatencyHistogram, Percentiles};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Cache-line aligned atomic counter to prevent false sharing
///
/// ```text
/// [value: 8 bytes][padding: 56 bytes] = 64 bytes total
/// ```
#[repr(align(64))]
#[derive(Debug)]
pub struct AlignedCounter {
    value: AtomicU64,
    _padding: [u8; 56],
}

impl AlignedCounter {
    pub fn new() -> Self {
        Self::with_value(0)
    }

    pub fn with_value(val: u64) -> Self {
        Self {
            value: AtomicU64::new(val),
            _padding: [0; 56],
        }
    }

    /// Relaxed add; no ordering is needed between distinct counters
    #[inline]
    pub fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, val: u64) {
        self.value.store(val, Ordering::Relaxed);
    }

    /// Lower the value to `val` if smaller
    #[inline]
    pub fn min(&self, val: u64) {
        self.value.fetch_min(val, Ordering::Relaxed);
    }

    /// Raise the value to `val` if larger
    #[inline]
    pub fn max(&self, val: u64) {
        self.value.fetch_max(val, Ordering::Relaxed);
    }
}

impl Default for AlignedCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one `(kind, success|failure)` pair
#[derive(Debug)]
struct Slot {
    count: AlignedCounter,
    total_us: AlignedCounter,
    min_us: AlignedCounter,
    max_us: AlignedCounter,
}

impl Slot {
    fn new() -> Self {
        Self {
            count: AlignedCounter::new(),
            total_us: AlignedCounter::new(),
            min_us: AlignedCounter::with_value(u64::MAX),
            max_us: AlignedCounter::new(),
        }
    }

    #[inline]
    fn record(&self, micros: u64) {
        self.count.add(1);
        self.total_us.add(micros);
        self.min_us.min(micros);
        self.max_us.max(micros);
    }
}

/// Thread-safe per-kind aggregation of counts and latencies
#[derive(Debug)]
pub struct Measurements {
    /// Indexed by `op.index() * 2 + failed`
    slots: Vec<Slot>,
    /// One histogram per slot, same indexing
    histograms: Option<Vec<Mutex<LatencyHistogram>>>,
}

impl Measurements {
    /// Empty store; `histogram` enables per-kind percentiles
    pub fn new(histogram: bool) -> Self {
        let slots = (0..Operation::COUNT * 2).map(|_| Slot::new()).collect();
        let histograms = histogram.then(|| {
            (0..Operation::COUNT * 2)
                .map(|_| Mutex::new(LatencyHistogram::new()))
                .collect()
        });
        Self { slots, histograms }
    }

    #[inline]
    fn slot_index(op: Operation, success: bool) -> usize {
        op.index() * 2 + usize::from(!success)
    }

    #[inline]
    fn slot(&self, op: Operation, success: bool) -> &Slot {
        &self.slots[Self::slot_index(op, success)]
    }

    fn percentiles(&self, op: Operation, success: bool) -> Option<Percentiles> {
        self.histograms.as_ref().and_then(|h| {
            h[Self::slot_index(op, success)]
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .percentiles()
        })
    }

    /// Record one completed operation
    #[inline]
    pub fn record(&self, op: Operation, success: bool, latency: Duration) {
        let micros = latency.as_micros().min(u128::from(u64::MAX)) as u64;
        self.slot(op, success).record(micros);

        if let Some(histograms) = &self.histograms {
            histograms[Self::slot_index(op, success)]
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record_us(micros);
        }
    }

    /// Operations recorded for `op` with the given result
    pub fn count(&self, op: Operation, success: bool) -> u64 {
        self.slot(op, success).count.get()
    }

    /// Operations recorded across every kind and result
    pub fn total_count(&self) -> u64 {
        self.slots.iter().map(|s| s.count.get()).sum()
    }

    pub fn has_histograms(&self) -> bool {
        self.histograms.is_some()
    }

    /// Point-in-time copy of every non-empty slot
    ///
    /// Counters are read individually, so a snapshot taken while workers are
    /// running may be off by in-flight samples.
    pub fn snapshot(&self) -> MeasurementSnapshot {
        let mut kinds = Vec::new();

        for op in Operation::ALL {
            for success in [true, false] {
                let slot = self.slot(op, success);
                let count = slot.count.get();
                if count == 0 {
                    continue;
                }
                let total_us = slot.total_us.get();
                kinds.push(KindSnapshot {
                    operation: op,
                    success,
                    count,
                    total_us,
                    avg_us: total_us as f64 / count as f64,
                    min_us: slot.min_us.get(),
                    max_us: slot.max_us.get(),
                    percentiles: self.percentiles(op, success),
                });
            }
        }

        MeasurementSnapshot {
            total_operations: kinds.iter().map(|k| k.count).sum(),
            kinds,
        }
    }
}

/// Aggregated numbers for one `(kind, result)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSnapshot {
    pub operation: Operation,
    pub success: bool,
    pub count: u64,
    pub total_us: u64,
    pub avg_us: f64,
    pub min_us: u64,
    pub max_us: u64,
    /// Percentiles of this entry's own samples, when histograms are enabled
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub percentiles: Option<Percentiles>,
}

impl KindSnapshot {
    /// Label used in status lines: `READ`, `READ-FAILED`, ...
    pub fn label(&self) -> String {
        if self.success {
            self.operation.name().to_string()
        } else {
            format!("{}-FAILED", self.operation.name())
        }
    }
}

/// Serializable copy of a [`Measurements`] store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    pub total_operations: u64,
    pub kinds: Vec<KindSnapshot>,
}

impl MeasurementSnapshot {
    pub fn get(&self, op: Operation, success: bool) -> Option<&KindSnapshot> {
        self.kinds
            .iter()
            .find(|k| k.operation == op && k.success == success)
    }

    /// Successes plus failures for `op`
    pub fn attempts(&self, op: Operation) -> u64 {
        self.kinds
            .iter()
            .filter(|k| k.operation == op)
            .map(|k| k.count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_aligned_counter_layout() {
        assert_eq!(std::mem::size_of::<AlignedCounter>(), 64);
        assert_eq!(std::mem::align_of::<AlignedCounter>(), 64);
    }

    #[test]
    fn test_aligned_counter_min_max() {
        let c = AlignedCounter::with_value(u64::MAX);
        c.min(40);
        c.min(50);
        assert_eq!(c.get(), 40);

        let m = AlignedCounter::new();
        m.max(7);
        m.max(3);
        assert_eq!(m.get(), 7);
    }

    #[test]
    fn test_record_and_snapshot() {
        let stats = Measurements::new(false);
        stats.record(Operation::Update, true, Duration::from_micros(10));
        stats.record(Operation::Update, true, Duration::from_micros(30));
        stats.record(Operation::Update, false, Duration::from_micros(5));

        let snap = stats.snapshot();
        assert_eq!(snap.total_operations, 3);
        assert_eq!(stats.total_count(), 3);

        let ok = snap.get(Operation::Update, true).unwrap();
        assert_eq!(ok.count, 2);
        assert_eq!(ok.min_us, 10);
        assert_eq!(ok.max_us, 30);
        assert_eq!(ok.avg_us, 20.0);
        assert_eq!(ok.label(), "UPDATE");
        assert!(ok.percentiles.is_none());

        let failed = snap.get(Operation::Update, false).unwrap();
        assert_eq!(failed.count, 1);
        assert_eq!(failed.label(), "UPDATE-FAILED");

        assert_eq!(snap.attempts(Operation::Update), 3);
        assert!(snap.get(Operation::Read, true).is_none());
    }

    #[test]
    fn test_histogram_percentiles_in_snapshot() {
        let stats = Measurements::new(true);
        assert!(stats.has_histograms());
        for us in 1..=100 {
            stats.record(Operation::Read, true, Duration::from_micros(us));
        }
        let snap = stats.snapshot();
        let p = snap.get(Operation::Read, true).unwrap().percentiles.unwrap();
        assert_eq!(p.p50, 50);
        assert_eq!(p.p99, 99);
    }

    #[test]
    fn test_failure_latencies_have_own_percentiles() {
        let stats = Measurements::new(true);
        for us in 1..=100 {
            stats.record(Operation::Read, true, Duration::from_micros(us));
        }
        for _ in 0..100 {
            stats.record(Operation::Read, false, Duration::from_micros(5_000));
        }

        let snap = stats.snapshot();
        let ok = snap.get(Operation::Read, true).unwrap().percentiles.unwrap();
        assert_eq!(ok.p99, 99);
        let failed = snap.get(Operation::Read, false).unwrap().percentiles.unwrap();
        assert!(failed.p50 >= 4_990 && failed.p50 <= 5_010, "{:?}", failed);
    }

    #[test]
    fn test_concurrent_recording() {
        let stats = Arc::new(Measurements::new(true));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for i in 0..1000 {
                        stats.record(Operation::Insert, i % 10 != 0, Duration::from_micros(i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.total_count(), 8000);
        assert_eq!(stats.count(Operation::Insert, true), 7200);
        assert_eq!(stats.count(Operation::Insert, false), 800);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = Measurements::new(false);
        stats.record(Operation::ReadModifyWrite, true, Duration::from_micros(42));
        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert!(json.contains("\"READ-MODIFY-WRITE\""));
        assert!(!json.contains("percentiles"));
    }
}

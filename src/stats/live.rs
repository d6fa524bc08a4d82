//! Periodic status reporting
//!
//! While a phase runs, a reporter thread prints one line per interval with the
//! cumulative per-kind counts and latencies:
//!
//! ```text
//! 2024-05-01 12:00:10 10 sec: 48210 operations; [READ: Count=45811 Max=912 Min=3 Avg=11.52] [UPDATE: Count=2399 Max=1201 Min=5 Avg=17.03]
//! ```
//!
//! The first line appears one interval into the phase. The reporter sleeps on
//! the phase's completion latch, so it notices the end of the phase without a
//! separate shutdown signal and prints a final line before exiting.

use crate::stats::{MeasurementSnapshot, Measurements};
use crate::util::latch::CountDownLatch;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::warn;

/// Render one status line
pub fn format_status_line(now: DateTime<Local>, elapsed: Duration, snapshot: &MeasurementSnapshot) -> String {
    let mut line = format!(
        "{} {} sec: {} operations;",
        now.format("%F %T"),
        elapsed.as_secs(),
        snapshot.total_operations
    );
    for kind in &snapshot.kinds {
        let _ = write!(
            line,
            " [{}: Count={} Max={} Min={} Avg={:.2}]",
            kind.label(),
            kind.count,
            kind.max_us,
            kind.min_us,
            kind.avg_us
        );
    }
    line
}

/// Status reporter bound to one phase
pub struct StatusReporter {
    measurements: Arc<Measurements>,
    done: Arc<CountDownLatch>,
    interval: Duration,
}

impl StatusReporter {
    pub fn new(measurements: Arc<Measurements>, done: Arc<CountDownLatch>, interval: Duration) -> Self {
        Self {
            measurements,
            done,
            interval,
        }
    }

    /// Report to `out` every interval until the latch reaches zero, then once
    /// more
    pub fn run<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let start = Instant::now();
        loop {
            let finished = self.done.wait_timeout(self.interval);
            let line = format_status_line(Local::now(), start.elapsed(), &self.measurements.snapshot());
            writeln!(out, "{}", line)?;
            out.flush()?;

            if finished {
                return Ok(());
            }
        }
    }

    /// Run on a dedicated thread writing to stdout
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("kvpulse-status".to_string())
            .spawn(move || {
                let stdout = io::stdout();
                if let Err(e) = self.run(&mut stdout.lock()) {
                    warn!(error = %e, "status reporter stopped");
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::Operation;
    use chrono::TimeZone;

    #[test]
    fn test_status_line_format() {
        let stats = Measurements::new(false);
        stats.record(Operation::Read, true, Duration::from_micros(10));
        stats.record(Operation::Read, true, Duration::from_micros(20));
        stats.record(Operation::Update, false, Duration::from_micros(7));

        let now = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 10).unwrap();
        let line = format_status_line(now, Duration::from_millis(10_400), &stats.snapshot());
        assert_eq!(
            line,
            "2024-05-01 12:00:10 10 sec: 3 operations; \
             [READ: Count=2 Max=20 Min=10 Avg=15.00] \
             [UPDATE-FAILED: Count=1 Max=7 Min=7 Avg=7.00]"
        );
    }

    #[test]
    fn test_status_line_empty() {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let line = format_status_line(now, Duration::ZERO, &MeasurementSnapshot::default());
        assert_eq!(line, "2024-01-02 03:04:05 0 sec: 0 operations;");
    }

    #[test]
    fn test_reporter_stops_after_latch() {
        let stats = Arc::new(Measurements::new(false));
        let latch = Arc::new(CountDownLatch::new(1));
        let reporter = StatusReporter::new(Arc::clone(&stats), Arc::clone(&latch), Duration::from_millis(20));

        let worker = {
            let stats = Arc::clone(&stats);
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(70));
                stats.record(Operation::Insert, true, Duration::from_micros(5));
                latch.count_down();
            })
        };

        let mut out = Vec::new();
        reporter.run(&mut out).unwrap();
        worker.join().unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines.len() >= 2, "{:?}", lines);
        assert!(lines.last().unwrap().contains("1 operations; [INSERT: Count=1"));
    }

    #[test]
    fn test_reporter_waits_one_interval_before_first_line() {
        let stats = Arc::new(Measurements::new(false));
        let latch = Arc::new(CountDownLatch::new(1));
        let reporter = StatusReporter::new(Arc::clone(&stats), Arc::clone(&latch), Duration::from_secs(30));

        let worker = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                latch.count_down();
            })
        };

        let mut out = Vec::new();
        reporter.run(&mut out).unwrap();
        worker.join().unwrap();

        // Only the final line: the phase ended inside the first interval
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1, "{:?}", text);
    }
}

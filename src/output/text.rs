//! Human-readable text output
//!
//! The first three lines of a phase summary keep the classic YCSB wording so
//! scripts that scrape `Run throughput(ops/sec):` keep working:
//!
//! ```text
//! Run runtime(sec): 10.004
//! Run operations(ops): 100000
//! Run throughput(ops/sec): 9996.00
//!
//! Operation           Count  Failed         Avg         Min         Max         p50         p95         p99       p99.9
//! READ                95012       0     10.41us      2.00us    812.00us     10.00us     17.00us     25.00us    101.00us
//! UPDATE               4988       0     14.02us      3.00us      1.20ms     13.00us     22.00us     31.00us    150.00us
//! ```

use crate::coordinator::PhaseReport;
use crate::stats::{KindSnapshot, MeasurementSnapshot};
use crate::util::time::{format_micros, format_rate};
use crate::workload::Operation;
use std::io::{self, Write};

/// Print a phase summary to stdout
pub fn print_phase_summary(report: &PhaseReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_phase_summary(&mut out, report)?;
    out.flush()
}

/// Write a phase summary
pub fn write_phase_summary<W: Write>(out: &mut W, report: &PhaseReport) -> io::Result<()> {
    writeln!(out, "{} runtime(sec): {:.3}", report.phase, report.runtime_secs)?;
    writeln!(out, "{} operations(ops): {}", report.phase, report.operations)?;
    writeln!(out, "{} throughput(ops/sec): {:.2}", report.phase, report.throughput)?;

    if !report.measurements.kinds.is_empty() {
        writeln!(out)?;
        write_kind_table(out, &report.measurements)?;
    }
    Ok(())
}

/// Per-kind table of counts and latencies
pub fn write_kind_table<W: Write>(out: &mut W, snapshot: &MeasurementSnapshot) -> io::Result<()> {
    writeln!(
        out,
        "{:<18} {:>8} {:>7} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11}",
        "Operation", "Count", "Failed", "Avg", "Min", "Max", "p50", "p95", "p99", "p99.9"
    )?;

    // Latency columns describe successes, or failures when nothing succeeded
    for op in Operation::ALL {
        let ok = snapshot.get(op, true);
        let failed = snapshot.get(op, false);
        let Some(latency) = ok.or(failed) else {
            continue;
        };

        let percentiles = latency.percentiles;
        let pct = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| format_micros(v as f64));

        writeln!(
            out,
            "{:<18} {:>8} {:>7} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11}",
            op.name(),
            ok.map_or(0, |k| k.count),
            failed.map_or(0, |k| k.count),
            format_micros(latency.avg_us),
            format_micros(latency.min_us as f64),
            format_micros(latency.max_us as f64),
            pct(percentiles.map(|p| p.p50)),
            pct(percentiles.map(|p| p.p95)),
            pct(percentiles.map(|p| p.p99)),
            pct(percentiles.map(|p| p.p999)),
        )?;
    }
    Ok(())
}

/// One-line summary used in logs
pub fn summary_line(report: &PhaseReport) -> String {
    format!(
        "{}: {} ops in {:.3}s ({} ops/sec), {}",
        report.phase,
        report.operations,
        report.runtime_secs,
        format_rate(report.throughput),
        failure_summary(&report.measurements.kinds)
    )
}

fn failure_summary(kinds: &[KindSnapshot]) -> String {
    let failed: u64 = kinds.iter().filter(|k| !k.success).map(|k| k.count).sum();
    match failed {
        0 => "no failures".to_string(),
        1 => "1 failure".to_string(),
        n => format!("{} failures", n),
    }
}

//! Coordinator module
//!
//! Splits a phase's operation budget across worker threads, runs them, and
//! aggregates their results into a [`PhaseReport`].
//!
//! The throughput timer starts only after every worker passed its init latch
//! and stops after every worker was joined, so backend setup and teardown are
//! excluded from the measured runtime.

use crate::backend::BackendFactory;
use crate::config::RuntimeConfig;
use crate::error::InfraError;
use crate::stats::live::StatusReporter;
use crate::stats::{MeasurementSnapshot, Measurements};
use crate::util::rate_limit::RateLimiter;
use crate::util::time::ops_per_sec;
use crate::worker::{Worker, WorkerShared};
use crate::workload::Workload;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Benchmark phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Populate the key space with inserts
    Load,
    /// Execute the configured operation mix
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Load => write!(f, "Load"),
            Phase::Run => write!(f, "Run"),
        }
    }
}

/// Split `total` operations over `workers`
///
/// Every worker gets `total / workers`; the first `total % workers` get one
/// more. The shares always sum to `total`.
pub fn partition_operations(total: u64, workers: usize) -> Vec<u64> {
    let n = workers as u64;
    if n == 0 {
        return Vec::new();
    }
    (0..n).map(|i| total / n + u64::from(i < total % n)).collect()
}

/// Disjoint half-open ordinal ranges covering `[start, start + total)`
pub fn partition_ranges(start: u64, total: u64, workers: usize) -> Vec<(u64, u64)> {
    let mut next = start;
    partition_operations(total, workers)
        .into_iter()
        .map(|share| {
            let range = (next, next + share);
            next += share;
            range
        })
        .collect()
}

/// Worker count for a configured `threadcount`; zero means one per CPU
pub fn resolve_thread_count(configured: usize) -> usize {
    if configured == 0 {
        num_cpus::get().max(1)
    } else {
        configured
    }
}

/// Everything a phase needs besides the phase itself
pub struct PhaseContext {
    pub workload: Arc<dyn Workload>,
    pub factory: Arc<dyn BackendFactory>,
    pub runtime: RuntimeConfig,
    pub histogram: bool,
}

/// Result of one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub threads: usize,
    /// Successful operations counted after warm-up
    pub operations: u64,
    pub runtime_secs: f64,
    pub throughput: f64,
    pub measurements: MeasurementSnapshot,
}

impl PhaseReport {
    pub fn runtime(&self) -> Duration {
        Duration::from_secs_f64(self.runtime_secs)
    }
}

/// Run `phase` to completion
///
/// # Errors
///
/// Any worker that fails to set up or panics aborts the phase with the
/// corresponding [`InfraError`].
pub fn run_phase(ctx: &PhaseContext, phase: Phase) -> Result<PhaseReport> {
    let threads = resolve_thread_count(ctx.runtime.thread_count);
    let total = match phase {
        Phase::Load => ctx.workload.load_count(),
        Phase::Run => ctx.workload.operation_count(),
    };
    let shares = partition_operations(total, threads);

    let measurements = Arc::new(Measurements::new(ctx.histogram));
    let rate_limiter = match ctx.runtime.rate_limit {
        0 => None,
        rate => Some(Arc::new(RateLimiter::new(rate)?)),
    };
    let shared = Arc::new(WorkerShared::new(
        Arc::clone(&ctx.workload),
        Arc::clone(&ctx.factory),
        Arc::clone(&measurements),
        rate_limiter,
        threads,
        Duration::from_secs(ctx.runtime.warmup),
    ));

    info!(
        %phase,
        threads,
        operations = total,
        backend = ctx.factory.name(),
        "starting phase"
    );

    let handles = spawn_workers(&shared, phase, &shares)?;

    shared.init_latch.wait();
    let start = Instant::now();

    let status = if ctx.runtime.status && !shared.aborted() {
        let reporter = StatusReporter::new(
            Arc::clone(&measurements),
            Arc::clone(&shared.done_latch),
            Duration::from_secs(ctx.runtime.status_interval.max(1)),
        );
        match reporter.spawn() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "failed to start status reporter");
                None
            }
        }
    } else {
        None
    };

    let mut operations = 0u64;
    let mut failure: Option<InfraError> = None;
    for (worker, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(oks)) => operations += oks,
            Ok(Err(e)) => {
                let err = match e.downcast::<InfraError>() {
                    Ok(infra) => infra,
                    Err(source) => InfraError::WorkerFailed { worker, source },
                };
                failure.get_or_insert(err);
            }
            Err(_) => {
                failure.get_or_insert(InfraError::WorkerPanicked { worker });
            }
        }
    }
    let runtime = start.elapsed();

    if let Some(handle) = status {
        if handle.join().is_err() {
            warn!("status reporter panicked");
        }
    }

    if let Some(err) = failure {
        error!(%phase, error = %err, "phase aborted");
        return Err(err.into());
    }

    let report = PhaseReport {
        phase,
        threads,
        operations,
        runtime_secs: runtime.as_secs_f64(),
        throughput: ops_per_sec(operations, runtime),
        measurements: measurements.snapshot(),
    };
    info!(%phase, operations, runtime_secs = report.runtime_secs, "phase complete");
    Ok(report)
}

fn spawn_workers(shared: &Arc<WorkerShared>, phase: Phase, shares: &[u64]) -> Result<Vec<JoinHandle<Result<u64>>>> {
    let mut handles = Vec::with_capacity(shares.len());

    for (id, &operations) in shares.iter().enumerate() {
        let worker = Worker::new(id, shares.len(), phase, operations, Arc::clone(shared));
        let spawned = thread::Builder::new()
            .name(format!("kvpulse-worker-{}", id))
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                // Release the latch slots of the workers that never started
                shared.abort.store(true, std::sync::atomic::Ordering::Release);
                for _ in id..shares.len() {
                    shared.init_latch.count_down();
                    shared.done_latch.count_down();
                }
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(e).with_context(|| format!("Failed to spawn worker {}", id));
            }
        }
    }

    Ok(handles)
}

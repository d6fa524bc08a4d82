//! Worker thread implementation
//!
//! A [`Worker`] drives one share of a phase's operation budget against its own
//! backend handle. Its lifecycle:
//!
//! 1. Create and initialize the backend handle, build the private
//!    [`WorkloadThread`]
//! 2. Count down the init latch and wait for every other worker, so setup
//!    time never leaks into the throughput timer
//! 3. Loop over its share: consult the rate limiter, run one operation
//! 4. Clean up the backend handle (failures are logged, not propagated)
//! 5. Count down the completion latch and return the counted successes
//!
//! Both latches are held through [`LatchGuard`]s, so an early return or a
//! panic still releases them and the coordinator never waits forever.
//!
//! # Warm-up
//!
//! Operations completed during the first `warmup` of the loop are executed and
//! measured like any other, but are subtracted from the returned success count.

use crate::backend::{Backend, BackendFactory};
use crate::coordinator::Phase;
use crate::error::InfraError;
use crate::stats::Measurements;
use crate::util::latch::{CountDownLatch, LatchGuard};
use crate::util::rate_limit::RateLimiter;
use crate::workload::{Workload, WorkloadThread};
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// State shared by all workers of one phase
pub struct WorkerShared {
    pub workload: Arc<dyn Workload>,
    pub factory: Arc<dyn BackendFactory>,
    pub measurements: Arc<Measurements>,
    pub rate_limiter: Option<Arc<RateLimiter>>,
    /// Start synchronization; counted down once per worker after setup
    pub init_latch: Arc<CountDownLatch>,
    /// Completion; counted down once per worker on exit
    pub done_latch: Arc<CountDownLatch>,
    /// Set when any worker failed to initialize
    pub abort: Arc<AtomicBool>,
    pub warmup: Duration,
}

impl WorkerShared {
    /// Fresh latches and counters for `workers` threads
    pub fn new(
        workload: Arc<dyn Workload>,
        factory: Arc<dyn BackendFactory>,
        measurements: Arc<Measurements>,
        rate_limiter: Option<Arc<RateLimiter>>,
        workers: usize,
        warmup: Duration,
    ) -> Self {
        Self {
            workload,
            factory,
            measurements,
            rate_limiter,
            init_latch: Arc::new(CountDownLatch::new(workers)),
            done_latch: Arc::new(CountDownLatch::new(workers)),
            abort: Arc::new(AtomicBool::new(false)),
            warmup,
        }
    }

    pub fn aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }
}

/// One worker's share of a phase
pub struct Worker {
    id: usize,
    worker_count: usize,
    phase: Phase,
    operations: u64,
    shared: Arc<WorkerShared>,
}

impl Worker {
    pub fn new(id: usize, worker_count: usize, phase: Phase, operations: u64, shared: Arc<WorkerShared>) -> Self {
        Self {
            id,
            worker_count,
            phase,
            operations,
            shared,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run the worker to completion
    ///
    /// Returns the number of successful operations completed after the
    /// warm-up period.
    ///
    /// # Errors
    ///
    /// [`InfraError::BackendInit`] when the backend handle cannot be created or
    /// initialized. The shared abort flag is raised first so the other workers
    /// skip their loops.
    pub fn run(self) -> Result<u64> {
        let shared = Arc::clone(&self.shared);
        let _done = LatchGuard::new(&shared.done_latch);
        let init = LatchGuard::new(&shared.init_latch);

        let (mut db, mut thread) = match self.prepare() {
            Ok(prepared) => prepared,
            Err(e) => {
                error!(worker = self.id, error = %e, "worker setup failed");
                shared.abort.store(true, Ordering::Release);
                return Err(e);
            }
        };

        init.release();
        shared.init_latch.wait();

        let oks = if shared.aborted() {
            debug!(worker = self.id, "run aborted before start");
            0
        } else {
            debug!(worker = self.id, phase = %self.phase, operations = self.operations, "worker started");
            self.run_loop(db.as_mut(), thread.as_mut())
        };

        if let Err(e) = db.cleanup() {
            warn!(worker = self.id, error = %e, "backend cleanup failed");
        }

        debug!(worker = self.id, oks, "worker finished");
        Ok(oks)
    }

    fn prepare(&self) -> Result<(Box<dyn Backend>, Box<dyn WorkloadThread>)> {
        let backend_init = |source: anyhow::Error| InfraError::BackendInit { worker: self.id, source };

        let mut db = self.shared.factory.create(self.id).map_err(backend_init)?;
        db.init().map_err(backend_init)?;

        match Arc::clone(&self.shared.workload).init_thread(self.id, self.worker_count) {
            Ok(thread) => Ok((db, thread)),
            Err(e) => {
                if let Err(cleanup) = db.cleanup() {
                    warn!(worker = self.id, error = %cleanup, "backend cleanup failed");
                }
                Err(e)
            }
        }
    }

    fn run_loop(&self, db: &mut dyn Backend, thread: &mut dyn WorkloadThread) -> u64 {
        let stats = &self.shared.measurements;
        let warmup = self.shared.warmup;

        let start = Instant::now();
        let mut counting = warmup.is_zero();
        let mut oks = 0u64;
        let mut skipped = 0u64;

        for _ in 0..self.operations {
            if !counting && start.elapsed() > warmup {
                counting = true;
                skipped = oks;
            }

            if let Some(limiter) = &self.shared.rate_limiter {
                limiter.consume(1);
            }

            let ok = match self.phase {
                Phase::Load => thread.do_insert(db, stats),
                Phase::Run => thread.do_transaction(db, stats),
            };
            if ok {
                oks += 1;
            }
        }

        if counting {
            oks - skipped
        } else {
            0
        }
    }
}

//! Mock backend for testing
//!
//! Simulates a store without keeping any data. Every call is recorded so tests
//! can assert on exactly what the workload engine issued, and the outcome of
//! each operation kind can be scripted.
//!
//! # Example
//!
//! ```
//! use kvpulse::backend::{Backend, BackendFactory, Outcome};
//! use kvpulse::backend::mock::MockFactory;
//! use kvpulse::workload::Operation;
//!
//! let factory = MockFactory::new();
//! factory.set_outcome(Operation::Read, Outcome::NotFound);
//!
//! let mut db = factory.create(3).unwrap();
//! assert_eq!(db.read("usertable", "user1", None).0, Outcome::NotFound);
//!
//! let calls = factory.calls();
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].worker, 3);
//! assert_eq!(calls[0].key, "user1");
//! ```

use super::{Backend, BackendFactory, Field, FieldSet, Outcome};
use crate::workload::Operation;
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Record of one backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub worker: usize,
    pub op: Operation,
    pub table: String,
    pub key: String,
    /// Number of fields passed (writes) or requested (reads, `None` = all)
    pub fields: Option<usize>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct MockState {
    calls: Vec<CallRecord>,
    outcomes: HashMap<Operation, Outcome>,
    fail_init: bool,
    fail_cleanup: bool,
    inits: usize,
    cleanups: usize,
}

/// Factory whose handles all report into one shared call log
///
/// Cloning the factory shares the log and the scripted outcomes.
#[derive(Clone, Default)]
pub struct MockFactory {
    state: Arc<Mutex<MockState>>,
}

impl MockFactory {
    /// Mock that succeeds every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome returned for `op`
    pub fn set_outcome(&self, op: Operation, outcome: Outcome) {
        lock(&self.state).outcomes.insert(op, outcome);
    }

    /// Make every handle's `init` fail
    pub fn set_fail_init(&self, fail: bool) {
        lock(&self.state).fail_init = fail;
    }

    /// Make every handle's `cleanup` fail
    pub fn set_fail_cleanup(&self, fail: bool) {
        lock(&self.state).fail_cleanup = fail;
    }

    /// Copy of every call recorded so far, in arrival order
    pub fn calls(&self) -> Vec<CallRecord> {
        lock(&self.state).calls.clone()
    }

    /// Number of calls recorded for `op`
    pub fn count(&self, op: Operation) -> usize {
        lock(&self.state).calls.iter().filter(|c| c.op == op).count()
    }

    /// Number of successful `init` calls
    pub fn init_count(&self) -> usize {
        lock(&self.state).inits
    }

    /// Number of `cleanup` calls
    pub fn cleanup_count(&self) -> usize {
        lock(&self.state).cleanups
    }

    pub fn clear(&self) {
        lock(&self.state).calls.clear();
    }
}

impl BackendFactory for MockFactory {
    fn name(&self) -> &str {
        "mock"
    }

    fn create(&self, worker_id: usize) -> Result<Box<dyn Backend>> {
        Ok(Box::new(MockBackend {
            worker: worker_id,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Per-worker mock handle
pub struct MockBackend {
    worker: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    fn record(&self, op: Operation, table: &str, key: &str, fields: Option<usize>) -> Outcome {
        let mut state = lock(&self.state);
        state.calls.push(CallRecord {
            worker: self.worker,
            op,
            table: table.to_string(),
            key: key.to_string(),
            fields,
        });
        state.outcomes.get(&op).copied().unwrap_or(Outcome::Ok)
    }
}

impl Backend for MockBackend {
    fn init(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_init {
            anyhow::bail!("mock backend refused to initialize worker {}", self.worker);
        }
        state.inits += 1;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.cleanups += 1;
        if state.fail_cleanup {
            anyhow::bail!("mock backend failed to clean up worker {}", self.worker);
        }
        Ok(())
    }

    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> (Outcome, FieldSet) {
        let outcome = self.record(Operation::Read, table, key, fields.map(<[String]>::len));
        (outcome, Vec::new())
    }

    fn scan(
        &mut self,
        table: &str,
        start_key: &str,
        _len: usize,
        fields: Option<&[String]>,
    ) -> (Outcome, Vec<FieldSet>) {
        let outcome = self.record(Operation::Scan, table, start_key, fields.map(<[String]>::len));
        (outcome, Vec::new())
    }

    fn update(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome {
        self.record(Operation::Update, table, key, Some(values.len()))
    }

    fn insert(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome {
        self.record(Operation::Insert, table, key, Some(values.len()))
    }

    fn delete(&mut self, table: &str, key: &str) -> Outcome {
        self.record(Operation::Delete, table, key, None)
    }
}

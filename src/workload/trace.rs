//! Trace-replay insert workload
//!
//! `pure_insert` inserts keys read from pre-generated traces instead of drawing
//! them from a distribution. Worker `n` (zero-based) replays the file
//! `run.w.<n + 1>` under `workloadpath`. Each line holds an operation tag and a
//! key; only the key is used:
//!
//! ```text
//! I user21424693888996579940
//! I user7320932457709011744
//! ```
//!
//! Every key becomes an insert of one field holding `valuelength` printable
//! bytes, in the load phase and in the run phase alike. A worker that reaches
//! the end of its trace starts over from the first line.

use super::{printable_payload, registry, rng_for, stream_seed, Operation, Workload, WorkloadThread, STREAM_PAYLOAD};
use crate::backend::{Backend, Field};
use crate::config::workload::WorkloadConfig;
use crate::error::ConfigError;
use crate::stats::Measurements;
use crate::util::fast_time::FastInstant;
use crate::Result;
use anyhow::Context;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// File name prefix of per-worker traces
pub const TRACE_PREFIX: &str = "run.w.";

/// Name of the single value field
pub const VALUE_FIELD: &str = "field0";

/// Keys of one trace file with a wrapping cursor
#[derive(Debug, Clone)]
pub struct KeyTrace {
    keys: Vec<String>,
    next: usize,
}

impl KeyTrace {
    /// Keys from trace text; blank lines are skipped
    pub fn parse(text: &str) -> Self {
        let keys = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(char::is_whitespace) {
                Some((_, key)) => key.trim().to_string(),
                None => line.to_string(),
            })
            .collect();
        Self { keys, next: 0 }
    }

    /// Read and parse a trace file
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or holds no keys.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read key trace: {}", path.display()))?;
        let trace = Self::parse(&text);
        if trace.is_empty() {
            anyhow::bail!("Key trace {} holds no keys", path.display());
        }
        Ok(trace)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Next key, wrapping to the first after the last
    pub fn next_key(&mut self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        if self.next >= self.keys.len() {
            self.next = 0;
        }
        let key = &self.keys[self.next];
        self.next += 1;
        Some(key)
    }
}

/// Insert-only workload replaying per-worker key traces
#[derive(Debug, Clone)]
pub struct PureInsertWorkload {
    table: String,
    trace_dir: PathBuf,
    value_length: usize,
    load_count: u64,
    operation_count: u64,
    seed: Option<u64>,
}

impl PureInsertWorkload {
    /// Trace files are opened per worker in [`Workload::init_thread`]
    pub fn new(config: &WorkloadConfig) -> std::result::Result<Self, ConfigError> {
        let value_length = usize::try_from(config.value_length)
            .map_err(|_| ConfigError::invalid("valuelength", format!("{} does not fit in memory", config.value_length)))?;

        Ok(Self {
            table: config.table.clone(),
            trace_dir: config.workload_path.clone(),
            value_length,
            load_count: config.load_count(),
            operation_count: config.operation_count,
            seed: config.seed,
        })
    }

    /// Trace replayed by worker `worker`
    pub fn trace_path(&self, worker: usize) -> PathBuf {
        self.trace_dir.join(format!("{}{}", TRACE_PREFIX, worker + 1))
    }

    pub fn value_length(&self) -> usize {
        self.value_length
    }
}

struct TraceThread {
    workload: Arc<PureInsertWorkload>,
    trace: KeyTrace,
    payload_rng: Xoshiro256PlusPlus,
}

impl TraceThread {
    fn insert_next(&mut self, db: &mut dyn Backend, stats: &Measurements) -> bool {
        let Some(key) = self.trace.next_key() else {
            return false;
        };
        let values = [Field::new(
            VALUE_FIELD,
            printable_payload(&mut self.payload_rng, self.workload.value_length),
        )];

        let start = FastInstant::now();
        let outcome = db.insert(&self.workload.table, key, &values);
        stats.record(Operation::Insert, outcome.is_ok(), start.elapsed());
        outcome.is_ok()
    }
}

impl WorkloadThread for TraceThread {
    fn do_insert(&mut self, db: &mut dyn Backend, stats: &Measurements) -> bool {
        self.insert_next(db, stats)
    }

    fn do_transaction(&mut self, db: &mut dyn Backend, stats: &Measurements) -> bool {
        self.insert_next(db, stats)
    }
}

impl Workload for PureInsertWorkload {
    fn name(&self) -> &'static str {
        registry::PURE_INSERT
    }

    fn load_count(&self) -> u64 {
        self.load_count
    }

    fn operation_count(&self) -> u64 {
        self.operation_count
    }

    fn init_thread(self: Arc<Self>, worker: usize, _worker_count: usize) -> Result<Box<dyn WorkloadThread>> {
        let path = self.trace_path(worker);
        let trace = KeyTrace::load(&path)?;
        debug!(worker, path = %path.display(), keys = trace.len(), "key trace loaded");

        Ok(Box::new(TraceThread {
            payload_rng: rng_for(stream_seed(self.seed, worker, STREAM_PAYLOAD)),
            workload: self,
            trace,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockFactory;
    use crate::backend::memory::MemoryFactory;
    use crate::backend::{BackendFactory, Outcome};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_trace(dir: &TempDir, worker: usize, lines: &[&str]) {
        let mut file = fs::File::create(dir.path().join(format!("{}{}", TRACE_PREFIX, worker + 1))).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn workload(dir: &TempDir, value_length: u64) -> Arc<PureInsertWorkload> {
        let config = WorkloadConfig {
            record_count: 4,
            operation_count: 4,
            workload_path: dir.path().to_path_buf(),
            value_length,
            seed: Some(5),
            ..Default::default()
        };
        Arc::new(PureInsertWorkload::new(&config).unwrap())
    }

    #[test]
    fn test_parse_takes_key_after_tag() {
        let mut trace = KeyTrace::parse("I user1\nI  user2 \n\nuser3\n");
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.next_key(), Some("user1"));
        assert_eq!(trace.next_key(), Some("user2"));
        assert_eq!(trace.next_key(), Some("user3"));
    }

    #[test]
    fn test_trace_wraps_at_end() {
        let mut trace = KeyTrace::parse("I a\nI b\n");
        let keys: Vec<_> = (0..5).map(|_| trace.next_key().unwrap().to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "a", "b", "a"]);

        let mut empty = KeyTrace::parse("\n\n");
        assert!(empty.is_empty());
        assert_eq!(empty.next_key(), None);
    }

    #[test]
    fn test_each_worker_replays_its_own_file() {
        let dir = TempDir::new().unwrap();
        write_trace(&dir, 0, &["I user100", "I user101"]);
        write_trace(&dir, 1, &["I user200"]);
        let wl = workload(&dir, 16);
        assert_eq!(wl.trace_path(1), dir.path().join("run.w.2"));

        let factory = MockFactory::new();
        let stats = Measurements::new(false);
        for worker in 0..2 {
            let mut db = factory.create(worker).unwrap();
            let mut thread = Arc::clone(&wl).init_thread(worker, 2).unwrap();
            for _ in 0..3 {
                assert!(thread.do_insert(db.as_mut(), &stats));
            }
        }

        let keys: Vec<_> = factory.calls().into_iter().map(|c| (c.worker, c.key)).collect();
        assert_eq!(
            keys,
            vec![
                (0, "user100".to_string()),
                (0, "user101".to_string()),
                (0, "user100".to_string()),
                (1, "user200".to_string()),
                (1, "user200".to_string()),
                (1, "user200".to_string()),
            ]
        );
        assert_eq!(stats.count(Operation::Insert, true), 6);
    }

    #[test]
    fn test_run_phase_also_inserts_single_field() {
        let dir = TempDir::new().unwrap();
        write_trace(&dir, 0, &["I user7", "I user8"]);
        let wl = workload(&dir, 32);

        let factory = MemoryFactory::new();
        let mut db = factory.create(0).unwrap();
        let stats = Measurements::new(false);
        let mut thread = Arc::clone(&wl).init_thread(0, 1).unwrap();
        assert!(thread.do_transaction(db.as_mut(), &stats));
        assert!(thread.do_transaction(db.as_mut(), &stats));

        assert_eq!(factory.store().keys("usertable"), vec!["user7", "user8"]);
        let (outcome, row) = db.read("usertable", "user8", None);
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].name, VALUE_FIELD);
        assert_eq!(row[0].value.len(), 32);
        assert!(row[0].value.iter().all(|b| (b' '..=b'~').contains(b)));
        assert_eq!(stats.count(Operation::Insert, true), 2);
    }

    #[test]
    fn test_failed_insert_counted_as_failure() {
        let dir = TempDir::new().unwrap();
        write_trace(&dir, 0, &["I user1"]);
        let wl = workload(&dir, 8);

        let factory = MockFactory::new();
        factory.set_outcome(Operation::Insert, Outcome::Error);
        let mut db = factory.create(0).unwrap();
        let stats = Measurements::new(false);
        let mut thread = Arc::clone(&wl).init_thread(0, 1).unwrap();
        assert!(!thread.do_insert(db.as_mut(), &stats));
        assert_eq!(stats.count(Operation::Insert, false), 1);
    }

    #[test]
    fn test_missing_or_empty_trace_fails_init() {
        let dir = TempDir::new().unwrap();
        let wl = workload(&dir, 8);
        let err = Arc::clone(&wl).init_thread(0, 1).err().unwrap();
        assert!(err.to_string().contains("run.w.1"), "{}", err);

        write_trace(&dir, 0, &[""]);
        let err = Arc::clone(&wl).init_thread(0, 1).err().unwrap();
        assert!(err.to_string().contains("holds no keys"), "{}", err);
    }
}

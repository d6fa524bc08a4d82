//! Workload engine
//!
//! [`CoreWorkload`] turns a [`WorkloadConfig`] into a stream of backend calls.
//! It holds everything shared by the workers of a run (key formatting, the
//! insert counters, the distribution registry) and hands each worker a private
//! [`ThreadState`] with its own generator cursors, so the hot path never
//! touches shared state except the atomic insert counters.
//!
//! # Key space
//!
//! - The load phase inserts ordinals `[insertstart, insertstart + insertcount)`,
//!   either from one shared counter or from per-worker disjoint ranges.
//! - Run-phase reads, updates, scans, deletes and read-modify-writes draw
//!   ordinals from the request distribution over `[0, recordcount)`, redrawing
//!   any ordinal at or above the current record limit
//!   (`recordcount + acknowledged run-phase inserts`).
//! - Run-phase inserts take fresh ordinals from a second counter starting at
//!   `recordcount`.
//! - The `latest` request distribution is anchored on the record limit, so
//!   its hottest ordinal is always the newest acknowledged record.
//!
//! # Example
//!
//! ```
//! use kvpulse::backend::{BackendFactory, memory::MemoryFactory};
//! use kvpulse::config::workload::WorkloadConfig;
//! use kvpulse::distribution::DistributionRegistry;
//! use kvpulse::stats::Measurements;
//! use kvpulse::workload::CoreWorkload;
//!
//! let config = WorkloadConfig { record_count: 10, ..Default::default() };
//! let workload = CoreWorkload::new(&config, DistributionRegistry::with_defaults()).unwrap();
//! let stats = Measurements::new(false);
//!
//! let mut db = MemoryFactory::new().create(0).unwrap();
//! let mut state = workload.thread_state(0, 1).unwrap();
//! for _ in 0..10 {
//!     assert!(workload.do_insert(db.as_mut(), &mut state, &stats));
//! }
//! assert!(workload.do_transaction(db.as_mut(), &mut state, &stats));
//! ```

pub mod key;
pub mod operation;
pub mod registry;
pub mod trace;

pub use operation::Operation;
pub use registry::WorkloadRegistry;
pub use trace::PureInsertWorkload;

use crate::backend::{Backend, Field, Outcome};
use crate::config::workload::{KeyAssignment, WorkloadConfig};
use crate::coordinator::partition_ranges;
use crate::distribution::counter::CounterGenerator;
use crate::distribution::discrete::DiscreteGenerator;
use crate::distribution::registry::BoxedGenerator;
use crate::distribution::scrambled::mix64;
use crate::distribution::sequential::SequentialGenerator;
use crate::distribution::uniform::UniformGenerator;
use crate::distribution::{DistributionParams, DistributionRegistry, Generator};
use crate::error::ConfigError;
use crate::stats::Measurements;
use crate::util::fast_time::FastInstant;
use key::KeyFormatter;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::Arc;

/// Tolerance when checking that proportions sum to one
pub const PROPORTION_TOLERANCE: f64 = 1e-6;

// Independent seed streams per worker
const STREAM_OPS: u64 = 1;
const STREAM_KEYS: u64 = 2;
const STREAM_FIELDS: u64 = 3;
const STREAM_FIELD_LEN: u64 = 4;
const STREAM_SCAN_LEN: u64 = 5;
const STREAM_PAYLOAD: u64 = 6;

/// Check the operation mix
///
/// # Errors
///
/// [`ConfigError::InvalidProportion`] for negative or non-finite weights,
/// [`ConfigError::ProportionSum`] when the total is not 1.0 within
/// [`PROPORTION_TOLERANCE`].
pub fn validate_proportions(proportions: &[(Operation, f64)]) -> Result<(), ConfigError> {
    let mut sum = 0.0;
    for &(op, value) in proportions {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidProportion {
                name: proportion_key(op),
                value,
            });
        }
        sum += value;
    }
    if (sum - 1.0).abs() > PROPORTION_TOLERANCE {
        return Err(ConfigError::ProportionSum { sum });
    }
    Ok(())
}

fn proportion_key(op: Operation) -> &'static str {
    match op {
        Operation::Read => "readproportion",
        Operation::Update => "updateproportion",
        Operation::Insert => "insertproportion",
        Operation::Scan => "scanproportion",
        Operation::ReadModifyWrite => "readmodifywriteproportion",
        Operation::Delete => "deleteproportion",
    }
}

/// One worker's view of a workload
///
/// Created by [`Workload::init_thread`] on the worker's own thread and never
/// shared.
pub trait WorkloadThread: Send {
    /// Insert the next load-phase record; true on success
    fn do_insert(&mut self, db: &mut dyn Backend, stats: &Measurements) -> bool;

    /// Run one run-phase operation; true on success
    fn do_transaction(&mut self, db: &mut dyn Backend, stats: &Measurements) -> bool;
}

/// Workload shared by every worker of a benchmark
pub trait Workload: Send + Sync {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Operations the load phase issues
    fn load_count(&self) -> u64;

    /// Operations the run phase issues
    fn operation_count(&self) -> u64;

    /// Build the private state of worker `worker` out of `worker_count`
    fn init_thread(self: Arc<Self>, worker: usize, worker_count: usize) -> crate::Result<Box<dyn WorkloadThread>>;
}

/// Named distribution plus its parameters, instantiated once per worker
#[derive(Debug, Clone)]
struct GeneratorSpec {
    name: String,
    params: DistributionParams,
}

impl GeneratorSpec {
    fn build(
        &self,
        registry: &DistributionRegistry,
        worker: usize,
        stream: u64,
    ) -> Result<BoxedGenerator, ConfigError> {
        let params = self.params.clone().seed(stream_seed(self.params.seed, worker, stream));
        registry.build(&self.name, &params)
    }
}

/// Distinct, reproducible seed for one worker's generator
fn stream_seed(seed: Option<u64>, worker: usize, stream: u64) -> Option<u64> {
    seed.map(|s| mix64(s ^ mix64(((worker as u64) << 8) | stream)))
}

fn rng_for(seed: Option<u64>) -> Xoshiro256PlusPlus {
    match seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    }
}

/// `len` random bytes from the printable ASCII range
fn printable_payload(rng: &mut Xoshiro256PlusPlus, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(b' '..=b'~')).collect()
}

/// Where a worker's load-phase ordinals come from
enum LoadKeys {
    Shared(CounterGenerator),
    Partitioned(SequentialGenerator),
}

impl LoadKeys {
    fn next(&mut self) -> u64 {
        match self {
            LoadKeys::Shared(counter) => counter.next_value(),
            LoadKeys::Partitioned(range) => range.next_value(),
        }
    }
}

/// Per-worker generator cursors
///
/// Owned by exactly one worker; nothing in here is shared except the clones
/// of the insert counters.
pub struct ThreadState {
    worker: usize,
    op_chooser: DiscreteGenerator<Operation>,
    key_chooser: BoxedGenerator,
    field_chooser: UniformGenerator,
    field_length: BoxedGenerator,
    scan_length: BoxedGenerator,
    load_keys: LoadKeys,
    run_inserts: CounterGenerator,
    payload_rng: Xoshiro256PlusPlus,
    key_buf: String,
}

impl ThreadState {
    pub fn worker(&self) -> usize {
        self.worker
    }
}

/// Shared workload definition
pub struct CoreWorkload {
    table: String,
    field_names: Vec<String>,
    keys: KeyFormatter,
    operation_count: u64,
    insert_start: u64,
    load_count: u64,
    key_assignment: KeyAssignment,
    read_all_fields: bool,
    write_all_fields: bool,
    proportions: Vec<(Operation, f64)>,
    request: GeneratorSpec,
    field_length: GeneratorSpec,
    scan_length: GeneratorSpec,
    registry: DistributionRegistry,
    seed: Option<u64>,
    load_counter: CounterGenerator,
    run_inserts: CounterGenerator,
    /// Record limit: `recordcount` plus every acknowledged run-phase insert
    acknowledged: CounterGenerator,
}

impl CoreWorkload {
    /// Validate `config` and prepare the shared state
    ///
    /// Every distribution is instantiated once here so unknown names and bad
    /// parameters fail before any worker starts.
    pub fn new(config: &WorkloadConfig, registry: DistributionRegistry) -> Result<Self, ConfigError> {
        let proportions = config.proportions().to_vec();
        validate_proportions(&proportions)?;

        if config.field_count == 0 {
            return Err(ConfigError::invalid("fieldcount", "must be at least 1"));
        }
        if config.min_scan_length > config.max_scan_length {
            return Err(ConfigError::invalid(
                "minscanlength",
                format!(
                    "{} exceeds maxscanlength {}",
                    config.min_scan_length, config.max_scan_length
                ),
            ));
        }

        let run_inserts = CounterGenerator::new(config.record_count);
        let acknowledged = CounterGenerator::new(config.record_count);

        let request = GeneratorSpec {
            name: config.request_distribution.clone(),
            params: DistributionParams {
                exponential_percentile: config.exponential_percentile,
                exponential_range: config.record_count as f64 * config.exponential_frac,
                ..DistributionParams::new(0, config.record_count.saturating_sub(1))
                    .theta(config.zipfian_theta)
                    .hotspot(config.hotspot())
                    .counter(acknowledged.clone())
                    .seed(config.seed)
            },
        };
        let field_length = GeneratorSpec {
            name: config.field_length_distribution.clone(),
            params: DistributionParams::new(1, config.field_length.max(1))
                .theta(config.zipfian_theta)
                .seed(config.seed),
        };
        let scan_length = GeneratorSpec {
            name: config.scan_length_distribution.clone(),
            params: DistributionParams::new(config.min_scan_length, config.max_scan_length)
                .theta(config.zipfian_theta)
                .seed(config.seed),
        };

        for (spec, stream) in [
            (&request, STREAM_KEYS),
            (&field_length, STREAM_FIELD_LEN),
            (&scan_length, STREAM_SCAN_LEN),
        ] {
            spec.build(&registry, 0, stream)?;
        }

        Ok(Self {
            table: config.table.clone(),
            field_names: config.field_names(),
            keys: KeyFormatter::new(config.key_prefix.clone(), config.zero_padding, config.insert_order),
            operation_count: config.operation_count,
            insert_start: config.insert_start,
            load_count: config.load_count(),
            key_assignment: config.insert_key_assignment,
            read_all_fields: config.read_all_fields,
            write_all_fields: config.write_all_fields,
            proportions,
            request,
            field_length,
            scan_length,
            registry,
            seed: config.seed,
            load_counter: CounterGenerator::new(config.insert_start),
            run_inserts,
            acknowledged,
        })
    }

    /// Build the private state of worker `worker` out of `worker_count`
    pub fn thread_state(&self, worker: usize, worker_count: usize) -> Result<ThreadState, ConfigError> {
        let load_keys = match self.key_assignment {
            KeyAssignment::Counter => LoadKeys::Shared(self.load_counter.clone()),
            KeyAssignment::Partitioned => {
                let ranges = partition_ranges(self.insert_start, self.load_count, worker_count.max(1));
                let (start, end) = ranges.get(worker).copied().unwrap_or((self.insert_start, self.insert_start));
                LoadKeys::Partitioned(SequentialGenerator::new(start, end))
            }
        };

        let field_chooser = match stream_seed(self.seed, worker, STREAM_FIELDS) {
            Some(seed) => UniformGenerator::with_seed(0, self.field_names.len() as u64 - 1, seed),
            None => UniformGenerator::new(0, self.field_names.len() as u64 - 1),
        };
        let op_chooser = match stream_seed(self.seed, worker, STREAM_OPS) {
            Some(seed) => DiscreteGenerator::with_seed(&self.proportions, seed)?,
            None => DiscreteGenerator::new(&self.proportions)?,
        };

        Ok(ThreadState {
            worker,
            op_chooser,
            key_chooser: self.request.build(&self.registry, worker, STREAM_KEYS)?,
            field_chooser,
            field_length: self.field_length.build(&self.registry, worker, STREAM_FIELD_LEN)?,
            scan_length: self.scan_length.build(&self.registry, worker, STREAM_SCAN_LEN)?,
            load_keys,
            run_inserts: self.run_inserts.clone(),
            payload_rng: rng_for(stream_seed(self.seed, worker, STREAM_PAYLOAD)),
            key_buf: String::new(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn keys(&self) -> &KeyFormatter {
        &self.keys
    }

    /// Shared load-phase counter
    pub fn load_counter(&self) -> &CounterGenerator {
        &self.load_counter
    }

    /// Run-phase inserts acknowledged by the backend so far
    pub fn acknowledged_inserts(&self) -> u64 {
        self.acknowledged.issued()
    }

    /// Exclusive upper bound for run-phase key ordinals
    pub fn record_limit(&self) -> u64 {
        self.acknowledged.current()
    }

    /// Insert the next load-phase record; true on [`Outcome::Ok`]
    pub fn do_insert(&self, db: &mut dyn Backend, state: &mut ThreadState, stats: &Measurements) -> bool {
        let ordinal = state.load_keys.next();
        self.keys.format_into(ordinal, &mut state.key_buf);
        let values = self.build_values(state, true);

        let start = FastInstant::now();
        let outcome = db.insert(&self.table, &state.key_buf, &values);
        stats.record(Operation::Insert, outcome.is_ok(), start.elapsed());
        outcome.is_ok()
    }

    /// Run one operation chosen from the configured mix; true on success
    pub fn do_transaction(&self, db: &mut dyn Backend, state: &mut ThreadState, stats: &Measurements) -> bool {
        match state.op_chooser.next_value() {
            Operation::Read => self.transaction_read(db, state, stats),
            Operation::Update => self.transaction_update(db, state, stats),
            Operation::Insert => self.transaction_insert(db, state, stats),
            Operation::Scan => self.transaction_scan(db, state, stats),
            Operation::ReadModifyWrite => self.transaction_read_modify_write(db, state, stats),
            Operation::Delete => self.transaction_delete(db, state, stats),
        }
    }

    /// Draw a key ordinal below the current record limit
    fn next_key_ordinal(&self, state: &mut ThreadState) -> u64 {
        loop {
            let ordinal = state.key_chooser.next_value();
            let limit = self.record_limit();
            if ordinal < limit || limit == 0 {
                return ordinal;
            }
        }
    }

    fn next_key(&self, state: &mut ThreadState) {
        let ordinal = self.next_key_ordinal(state);
        self.keys.format_into(ordinal, &mut state.key_buf);
    }

    /// Fields to request: `None` for all, otherwise one random field
    fn read_fields(&self, state: &mut ThreadState) -> Option<Vec<String>> {
        if self.read_all_fields {
            None
        } else {
            let idx = state.field_chooser.next_value() as usize;
            Some(vec![self.field_names[idx].clone()])
        }
    }

    /// Random printable payloads for every field, or for one random field
    fn build_values(&self, state: &mut ThreadState, all_fields: bool) -> Vec<Field> {
        let names: &[String] = if all_fields {
            &self.field_names
        } else {
            let idx = state.field_chooser.next_value() as usize;
            std::slice::from_ref(&self.field_names[idx])
        };

        names
            .iter()
            .map(|name| {
                let len = state.field_length.next_value() as usize;
                Field::new(name.clone(), printable_payload(&mut state.payload_rng, len))
            })
            .collect()
    }

    fn timed_read(&self, db: &mut dyn Backend, key: &str, fields: Option<&[String]>, stats: &Measurements) -> Outcome {
        let start = FastInstant::now();
        let (outcome, _) = db.read(&self.table, key, fields);
        stats.record(Operation::Read, outcome.is_ok(), start.elapsed());
        outcome
    }

    fn timed_update(&self, db: &mut dyn Backend, key: &str, values: &[Field], stats: &Measurements) -> Outcome {
        let start = FastInstant::now();
        let outcome = db.update(&self.table, key, values);
        stats.record(Operation::Update, outcome.is_ok(), start.elapsed());
        outcome
    }

    fn transaction_read(&self, db: &mut dyn Backend, state: &mut ThreadState, stats: &Measurements) -> bool {
        self.next_key(state);
        let fields = self.read_fields(state);
        self.timed_read(db, &state.key_buf, fields.as_deref(), stats).is_ok()
    }

    fn transaction_update(&self, db: &mut dyn Backend, state: &mut ThreadState, stats: &Measurements) -> bool {
        self.next_key(state);
        let values = self.build_values(state, self.write_all_fields);
        self.timed_update(db, &state.key_buf, &values, stats).is_ok()
    }

    fn transaction_insert(&self, db: &mut dyn Backend, state: &mut ThreadState, stats: &Measurements) -> bool {
        let ordinal = state.run_inserts.next_value();
        self.keys.format_into(ordinal, &mut state.key_buf);
        let values = self.build_values(state, true);

        let start = FastInstant::now();
        let outcome = db.insert(&self.table, &state.key_buf, &values);
        stats.record(Operation::Insert, outcome.is_ok(), start.elapsed());

        if outcome.is_ok() {
            self.acknowledged.increment();
        }
        outcome.is_ok()
    }

    fn transaction_scan(&self, db: &mut dyn Backend, state: &mut ThreadState, stats: &Measurements) -> bool {
        self.next_key(state);
        let len = state.scan_length.next_value() as usize;
        let fields = self.read_fields(state);

        let start = FastInstant::now();
        let (outcome, _) = db.scan(&self.table, &state.key_buf, len, fields.as_deref());
        stats.record(Operation::Scan, outcome.is_ok(), start.elapsed());
        outcome.is_ok()
    }

    fn transaction_read_modify_write(
        &self,
        db: &mut dyn Backend,
        state: &mut ThreadState,
        stats: &Measurements,
    ) -> bool {
        self.next_key(state);
        let fields = self.read_fields(state);
        let values = self.build_values(state, self.write_all_fields);

        let start = FastInstant::now();
        let read = self.timed_read(db, &state.key_buf, fields.as_deref(), stats);
        let update = self.timed_update(db, &state.key_buf, &values, stats);
        let ok = read.is_ok() && update.is_ok();
        stats.record(Operation::ReadModifyWrite, ok, start.elapsed());
        ok
    }

    fn transaction_delete(&self, db: &mut dyn Backend, state: &mut ThreadState, stats: &Measurements) -> bool {
        self.next_key(state);

        let start = FastInstant::now();
        let outcome = db.delete(&self.table, &state.key_buf);
        stats.record(Operation::Delete, outcome.is_ok(), start.elapsed());
        outcome.is_ok()
    }
}

/// [`ThreadState`] bound to the workload that owns it
struct CoreThread {
    workload: Arc<CoreWorkload>,
    state: ThreadState,
}

impl WorkloadThread for CoreThread {
    fn do_insert(&mut self, db: &mut dyn Backend, stats: &Measurements) -> bool {
        self.workload.do_insert(db, &mut self.state, stats)
    }

    fn do_transaction(&mut self, db: &mut dyn Backend, stats: &Measurements) -> bool {
        self.workload.do_transaction(db, &mut self.state, stats)
    }
}

impl Workload for CoreWorkload {
    fn name(&self) -> &'static str {
        registry::CORE
    }

    fn load_count(&self) -> u64 {
        self.load_count
    }

    fn operation_count(&self) -> u64 {
        self.operation_count
    }

    fn init_thread(self: Arc<Self>, worker: usize, worker_count: usize) -> crate::Result<Box<dyn WorkloadThread>> {
        let state = self.thread_state(worker, worker_count)?;
        Ok(Box::new(CoreThread { workload: self, state }))
    }
}

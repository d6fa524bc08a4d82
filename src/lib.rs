//! kvpulse - key-value workload generator and benchmark harness
//!
//! kvpulse drives a configurable mix of reads, updates, inserts, scans,
//! read-modify-writes and deletes against a pluggable storage backend from
//! many threads at once, and records per-operation throughput and latency.
//!
//! # Architecture
//!
//! - **Number generators** ([`distribution`]): uniform, zipfian with hotspot,
//!   latest, exponential, sequential and counter sequences, selected by name
//! - **Workload engine** ([`workload`]): picks the next operation, its key and
//!   payload, calls the backend and times the call; workloads are selected by
//!   name, with a trace-replay insert workload next to the operation mix
//! - **Backends** ([`backend`]): narrow CRUD contract plus bundled adapters
//! - **Execution harness** ([`coordinator`], [`worker`]): splits the operation
//!   budget, synchronizes start and completion, optional rate limiting
//! - **Measurements** ([`stats`]): lock-free per-kind counters, optional
//!   histograms, periodic status lines

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod distribution;
pub mod error;
pub mod output;
pub mod stats;
pub mod util;
pub mod worker;
pub mod workload;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{Phase, PhaseReport};
pub use workload::{CoreWorkload, Workload, WorkloadRegistry};

/// Result type used throughout kvpulse
pub type Result<T> = anyhow::Result<T>;

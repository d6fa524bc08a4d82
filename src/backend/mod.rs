//! Storage backend abstraction
//!
//! This module defines the narrow CRUD contract the workload engine drives.
//! Anything storage-specific (engine, wire protocol, serialization) lives
//! behind it.
//!
//! # Architecture
//!
//! A [`BackendFactory`] is chosen once at startup from the
//! [`registry::BackendRegistry`]. Each worker asks the factory for its own
//! [`Backend`] handle, so adapters that need one connection per thread get it
//! without sharing; state common to all workers (an in-memory table, a
//! connection pool) lives inside the factory.
//!
//! # Bundled adapters
//!
//! - **memory**: ordered in-memory tables, rows stored in the [`codec`] format
//! - **basic**: accepts every call and logs it, useful to measure harness overhead
//! - **mock**: scripted test double that records every call
//!
//! # Example
//!
//! ```
//! use kvpulse::backend::{Backend, BackendFactory, Field, Outcome};
//! use kvpulse::backend::memory::MemoryFactory;
//!
//! let factory = MemoryFactory::new();
//! let mut db = factory.create(0).unwrap();
//! db.init().unwrap();
//!
//! let row = vec![Field::new("field0", b"hello".to_vec())];
//! assert_eq!(db.insert("usertable", "user1", &row), Outcome::Ok);
//!
//! let (outcome, fields) = db.read("usertable", "user1", None);
//! assert_eq!(outcome, Outcome::Ok);
//! assert_eq!(fields, row);
//! ```

pub mod basic;
pub mod codec;
pub mod memory;
pub mod mock;
pub mod registry;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use registry::BackendRegistry;

/// Adapter-specific options, taken verbatim from the `[backend.options]` table
pub type BackendOptions = toml::Table;

/// Result of a single backend call
///
/// Every call returns exactly one of these. Only [`Outcome::Ok`] counts as a
/// success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Ok,
    Error,
    NotFound,
    NotImplemented,
    Unexpected,
}

impl Outcome {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Outcome::Ok
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Ok => "OK",
            Outcome::Error => "ERROR",
            Outcome::NotFound => "NOT_FOUND",
            Outcome::NotImplemented => "NOT_IMPLEMENTED",
            Outcome::Unexpected => "UNEXPECTED_STATE",
        };
        f.write_str(name)
    }
}

/// One named column of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: Vec<u8>,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered record value
pub type FieldSet = Vec<Field>;

/// Keep only the requested fields (all of them when `fields` is `None`)
pub fn project(values: FieldSet, fields: Option<&[String]>) -> FieldSet {
    match fields {
        None => values,
        Some(wanted) => values
            .into_iter()
            .filter(|f| wanted.iter().any(|w| *w == f.name))
            .collect(),
    }
}

/// Storage backend contract
///
/// # Lifecycle
///
/// 1. Obtain a handle from [`BackendFactory::create`]
/// 2. Call [`init`](Self::init) once on the worker thread
/// 3. Issue operations
/// 4. Call [`cleanup`](Self::cleanup) when the worker is done
///
/// # Thread Safety
///
/// Handles must be `Send` so they can move into their worker thread. They are
/// never shared between workers.
///
/// # Error Handling
///
/// Per-operation failures are reported as [`Outcome`] values and never
/// unwind. `init` failures are fatal for the run; `cleanup` failures are
/// logged and ignored.
pub trait Backend: Send {
    /// Acquire per-worker resources (connections, sessions)
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release per-worker resources
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read a record, optionally restricted to `fields`
    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> (Outcome, FieldSet);

    /// Read up to `len` records starting at `start_key` in key order
    fn scan(
        &mut self,
        _table: &str,
        _start_key: &str,
        _len: usize,
        _fields: Option<&[String]>,
    ) -> (Outcome, Vec<FieldSet>) {
        (Outcome::NotImplemented, Vec::new())
    }

    /// Overwrite the given fields of an existing record
    fn update(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome;

    /// Insert a new record
    fn insert(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome;

    /// Delete a record
    fn delete(&mut self, _table: &str, _key: &str) -> Outcome {
        Outcome::NotImplemented
    }
}

/// Creates one backend handle per worker
pub trait BackendFactory: Send + Sync {
    /// Name the factory was registered under
    fn name(&self) -> &str;

    /// Create the handle for `worker_id`
    ///
    /// # Errors
    ///
    /// Failing here is fatal for the run.
    fn create(&self, worker_id: usize) -> Result<Box<dyn Backend>>;
}

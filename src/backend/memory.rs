//! In-memory backend
//!
//! Ordered tables kept in process memory. Every worker handle shares the same
//! store, so records written during the load phase are visible to the run
//! phase as long as both use the same factory. Rows are stored in the
//! [`codec`](super::codec) format to exercise real (de)serialization.

use super::codec::{decode_row, encode_row};
use super::{project, Backend, BackendFactory, BackendOptions, Field, FieldSet, Outcome};
use crate::Result;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

type Table = BTreeMap<String, Vec<u8>>;

/// Shared table storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    /// Number of records in `table`
    pub fn len(&self, table: &str) -> usize {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(table).map_or(0, BTreeMap::len)
    }

    /// Whether `table` holds no records
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// All keys of `table` in order
    pub fn keys(&self, table: &str) -> Vec<String> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(table)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Factory for [`MemoryBackend`] handles over one shared [`MemoryStore`]
#[derive(Debug, Default, Clone)]
pub struct MemoryFactory {
    store: Arc<MemoryStore>,
}

impl MemoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry constructor; the memory adapter takes no options
    pub fn from_options(options: &BackendOptions) -> Result<Self> {
        for key in options.keys() {
            warn!(option = %key, "ignoring unknown memory backend option");
        }
        Ok(Self::new())
    }

    /// The store shared by every handle
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }
}

impl BackendFactory for MemoryFactory {
    fn name(&self) -> &str {
        "memory"
    }

    fn create(&self, _worker_id: usize) -> Result<Box<dyn Backend>> {
        Ok(Box::new(MemoryBackend {
            store: Arc::clone(&self.store),
        }))
    }
}

/// Per-worker handle
pub struct MemoryBackend {
    store: Arc<MemoryStore>,
}

impl MemoryBackend {
    fn decode(key: &str, bytes: &[u8]) -> Option<FieldSet> {
        match decode_row(bytes) {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!(key, error = %e, "corrupt row in memory table");
                None
            }
        }
    }
}

impl Backend for MemoryBackend {
    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> (Outcome, FieldSet) {
        let tables = self.store.tables.read().unwrap_or_else(PoisonError::into_inner);
        let Some(bytes) = tables.get(table).and_then(|t| t.get(key)) else {
            return (Outcome::NotFound, Vec::new());
        };
        match Self::decode(key, bytes) {
            Some(row) => (Outcome::Ok, project(row, fields)),
            None => (Outcome::Error, Vec::new()),
        }
    }

    fn scan(
        &mut self,
        table: &str,
        start_key: &str,
        len: usize,
        fields: Option<&[String]>,
    ) -> (Outcome, Vec<FieldSet>) {
        let tables = self.store.tables.read().unwrap_or_else(PoisonError::into_inner);
        let Some(rows) = tables.get(table) else {
            return (Outcome::Ok, Vec::new());
        };

        let mut result = Vec::with_capacity(len.min(rows.len()));
        for (key, bytes) in rows.range::<str, _>((Bound::Included(start_key), Bound::Unbounded)).take(len) {
            match Self::decode(key, bytes) {
                Some(row) => result.push(project(row, fields)),
                None => return (Outcome::Error, result),
            }
        }
        (Outcome::Ok, result)
    }

    fn update(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome {
        let mut tables = self.store.tables.write().unwrap_or_else(PoisonError::into_inner);
        let Some(bytes) = tables.get_mut(table).and_then(|t| t.get_mut(key)) else {
            return Outcome::NotFound;
        };
        let Some(mut row) = Self::decode(key, bytes) else {
            return Outcome::Error;
        };

        for field in values {
            match row.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => existing.value.clone_from(&field.value),
                None => row.push(field.clone()),
            }
        }
        *bytes = encode_row(&row);
        Outcome::Ok
    }

    fn insert(&mut self, table: &str, key: &str, values: &[Field]) -> Outcome {
        let mut tables = self.store.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), encode_row(values));
        Outcome::Ok
    }

    fn delete(&mut self, table: &str, key: &str) -> Outcome {
        let mut tables = self.store.tables.write().unwrap_or_else(PoisonError::into_inner);
        match tables.get_mut(table).and_then(|t| t.remove(key)) {
            Some(_) => Outcome::Ok,
            None => Outcome::NotFound,
        }
    }
}

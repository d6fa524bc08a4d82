//! Backend registry
//!
//! Maps backend names (the `--db` flag / `backend.name` key) to factory
//! constructors. Built once at startup and passed around explicitly.

use super::basic::BasicFactory;
use super::memory::MemoryFactory;
use super::{BackendFactory, BackendOptions};
use crate::error::ConfigError;
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Factory constructor stored in the registry
pub type FactoryCtor = fn(&BackendOptions) -> Result<Arc<dyn BackendFactory>>;

/// Name to factory constructor mapping
#[derive(Clone)]
pub struct BackendRegistry {
    ctors: BTreeMap<String, FactoryCtor>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry with the bundled `memory` and `basic` adapters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("memory", build_memory);
        registry.register("basic", build_basic);
        registry
    }

    /// Add or replace a constructor
    pub fn register(&mut self, name: impl Into<String>, ctor: FactoryCtor) {
        self.ctors.insert(name.into(), ctor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }

    /// Instantiate the factory registered under `name`
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownBackend`] for unregistered names, or whatever the
    /// adapter's constructor rejects.
    pub fn create(&self, name: &str, options: &BackendOptions) -> Result<Arc<dyn BackendFactory>> {
        let ctor = self.ctors.get(name).ok_or_else(|| ConfigError::UnknownBackend {
            name: name.to_string(),
        })?;
        ctor(options)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ctors.keys()).finish()
    }
}

fn build_memory(options: &BackendOptions) -> Result<Arc<dyn BackendFactory>> {
    Ok(Arc::new(MemoryFactory::from_options(options)?))
}

fn build_basic(options: &BackendOptions) -> Result<Arc<dyn BackendFactory>> {
    Ok(Arc::new(BasicFactory::from_options(options)?))
}

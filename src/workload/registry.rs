//! Workload registry
//!
//! Maps workload names (the `workload` key of `[workload]`) to constructors.
//! Built once in `main` next to the distribution and backend registries.
//!
//! # Example
//!
//! ```
//! use kvpulse::config::workload::WorkloadConfig;
//! use kvpulse::distribution::DistributionRegistry;
//! use kvpulse::workload::{Workload, WorkloadRegistry};
//!
//! let registry = WorkloadRegistry::with_defaults();
//! let config = WorkloadConfig { record_count: 10, ..Default::default() };
//! let workload = registry
//!     .create("core", &config, DistributionRegistry::with_defaults())
//!     .unwrap();
//! assert_eq!(workload.name(), "core");
//! assert_eq!(workload.load_count(), 10);
//! ```

use super::trace::PureInsertWorkload;
use super::{CoreWorkload, Workload};
use crate::config::workload::WorkloadConfig;
use crate::distribution::DistributionRegistry;
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name of the operation-mix workload
pub const CORE: &str = "core";

/// Name of the trace-replay insert workload
pub const PURE_INSERT: &str = "pure_insert";

/// Workload constructor stored in the registry
pub type WorkloadCtor = fn(&WorkloadConfig, DistributionRegistry) -> Result<Arc<dyn Workload>, ConfigError>;

/// Name to workload constructor mapping
#[derive(Clone)]
pub struct WorkloadRegistry {
    ctors: BTreeMap<String, WorkloadCtor>,
}

impl WorkloadRegistry {
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry with `core` and `pure_insert`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CORE, build_core);
        registry.register(PURE_INSERT, build_pure_insert);
        registry
    }

    /// Add or replace a constructor
    pub fn register(&mut self, name: impl Into<String>, ctor: WorkloadCtor) {
        self.ctors.insert(name.into(), ctor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }

    /// Build the workload registered under `name`
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownWorkload`] for unregistered names, or whatever the
    /// workload's constructor rejects.
    pub fn create(
        &self,
        name: &str,
        config: &WorkloadConfig,
        distributions: DistributionRegistry,
    ) -> Result<Arc<dyn Workload>, ConfigError> {
        let ctor = self.ctors.get(name).ok_or_else(|| ConfigError::UnknownWorkload {
            name: name.to_string(),
        })?;
        ctor(config, distributions)
    }
}

impl Default for WorkloadRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for WorkloadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ctors.keys()).finish()
    }
}

fn build_core(config: &WorkloadConfig, distributions: DistributionRegistry) -> Result<Arc<dyn Workload>, ConfigError> {
    Ok(Arc::new(CoreWorkload::new(config, distributions)?))
}

fn build_pure_insert(config: &WorkloadConfig, _: DistributionRegistry) -> Result<Arc<dyn Workload>, ConfigError> {
    Ok(Arc::new(PureInsertWorkload::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workloads() {
        let registry = WorkloadRegistry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["core", "pure_insert"]);
        assert!(registry.contains(CORE));
        assert!(!registry.contains("CoreWorkload"));
    }

    #[test]
    fn test_create_by_name() {
        let registry = WorkloadRegistry::with_defaults();
        let config = WorkloadConfig {
            record_count: 20,
            operation_count: 7,
            ..Default::default()
        };

        let core = registry.create(CORE, &config, DistributionRegistry::with_defaults()).unwrap();
        assert_eq!(core.name(), CORE);
        assert_eq!(core.operation_count(), 7);

        let insert = registry
            .create(PURE_INSERT, &config, DistributionRegistry::with_defaults())
            .unwrap();
        assert_eq!(insert.name(), PURE_INSERT);
        assert_eq!(insert.load_count(), 20);
    }

    #[test]
    fn test_unknown_workload() {
        let registry = WorkloadRegistry::with_defaults();
        let err = registry
            .create("graph", &WorkloadConfig::default(), DistributionRegistry::with_defaults())
            .err();
        assert_eq!(
            err,
            Some(ConfigError::UnknownWorkload {
                name: "graph".to_string()
            })
        );
    }

    #[test]
    fn test_constructor_errors_propagate() {
        let registry = WorkloadRegistry::with_defaults();
        let config = WorkloadConfig {
            read_proportion: 0.5,
            update_proportion: 0.0,
            ..Default::default()
        };
        let err = registry.create(CORE, &config, DistributionRegistry::with_defaults()).err();
        assert!(matches!(err, Some(ConfigError::ProportionSum { .. })));
    }
}

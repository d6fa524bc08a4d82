//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! A configuration is assembled in layers: built-in defaults, then each
//! `-P` file in order, then `-p section.key=value` overrides, then the
//! dedicated CLI flags (`--threads`, `--db`, `--status`).
//!
//! # Example
//!
//! ```
//! use kvpulse::config::Config;
//!
//! let config: Config = toml::from_str(r#"
//!     [workload]
//!     recordcount = 1000
//!     operationcount = 5000
//!
//!     [runtime]
//!     threadcount = 4
//!
//!     [backend]
//!     name = "memory"
//! "#).unwrap();
//!
//! assert_eq!(config.workload.record_count, 1000);
//! assert_eq!(config.runtime.thread_count, 4);
//! assert_eq!(config.backend.name, "memory");
//! ```

pub mod cli;
pub mod toml;
pub mod validator;
pub mod workload;

use crate::backend::BackendOptions;
use serde::{Deserialize, Serialize};
pub use workload::WorkloadConfig;

/// Complete benchmark configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub workload: WorkloadConfig,
    pub runtime: RuntimeConfig,
    pub backend: BackendConfig,
    pub measurement: MeasurementConfig,
}

/// `[runtime]` section: how the workload is driven
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Worker threads; 0 means one per CPU
    #[serde(rename = "threadcount")]
    pub thread_count: usize,
    /// Aggregate operations per second; 0 means unlimited
    #[serde(rename = "ratelimit")]
    pub rate_limit: u64,
    /// Seconds at the start of each phase excluded from the reported count
    pub warmup: u64,
    /// Print a status line every `statusinterval` seconds
    pub status: bool,
    #[serde(rename = "statusinterval")]
    pub status_interval: u64,
    /// Seconds to pause between the load and run phases
    #[serde(rename = "sleepafterload")]
    pub sleep_after_load: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_count: 1,
            rate_limit: 0,
            warmup: 0,
            status: false,
            status_interval: 10,
            sleep_after_load: 0,
        }
    }
}

/// `[backend]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Registered backend name
    pub name: String,
    /// Adapter-specific settings, handed to the backend constructor untouched
    pub options: BackendOptions,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "basic".to_string(),
            options: BackendOptions::new(),
        }
    }
}

/// `[measurement]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MeasurementConfig {
    /// Keep per-kind latency histograms for percentile reporting
    pub histogram: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = ::toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.runtime.thread_count, 1);
        assert_eq!(config.runtime.status_interval, 10);
        assert_eq!(config.backend.name, "basic");
        assert!(!config.measurement.histogram);
    }

    #[test]
    fn test_backend_options_passthrough() {
        let config: Config = ::toml::from_str(
            r#"
            [backend]
            name = "basic"
            options = { verbose = true }
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.options.get("verbose").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(::toml::from_str::<Config>("[workers]\nthreads = 2").is_err());
        assert!(::toml::from_str::<Config>("[runtime]\nthreads = 2").is_err());
    }
}

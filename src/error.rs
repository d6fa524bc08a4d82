//! Error taxonomy
//!
//! Two classes of errors escape a benchmark run:
//!
//! - [`ConfigError`]: rejected configuration, raised before any worker starts.
//! - [`InfraError`]: a worker could not participate (backend init failure,
//!   panic). The run is aborted because its operation accounting is broken.
//!
//! Per-operation failures are not errors at all; they surface as
//! [`Outcome`](crate::backend::Outcome) values and are counted.

use thiserror::Error;

/// Configuration rejected at initialization
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("operation proportions must sum to 1.0, got {sum}")]
    ProportionSum { sum: f64 },

    #[error("proportion `{name}` must be a finite value >= 0, got {value}")]
    InvalidProportion { name: &'static str, value: f64 },

    #[error("unknown distribution `{name}`")]
    UnknownDistribution { name: String },

    #[error("unknown backend `{name}`")]
    UnknownBackend { name: String },

    #[error("unknown workload `{name}`")]
    UnknownWorkload { name: String },

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("discrete generator needs at least one positive weight")]
    EmptyDiscrete,
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Fatal infrastructure failure that aborts the whole run
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("worker {worker} failed to initialize backend")]
    BackendInit {
        worker: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("worker {worker} failed")]
    WorkerFailed {
        worker: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ProportionSum { sum: 0.9 };
        assert_eq!(err.to_string(), "operation proportions must sum to 1.0, got 0.9");

        let err = ConfigError::invalid("workload.fieldcount", "must be > 0");
        assert_eq!(err.to_string(), "invalid value for `workload.fieldcount`: must be > 0");
    }

    #[test]
    fn test_infra_error_keeps_source() {
        let err = InfraError::BackendInit {
            worker: 3,
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(err.to_string(), "worker 3 failed to initialize backend");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection refused"));
    }
}

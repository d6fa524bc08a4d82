//! Configuration validation
//!
//! Everything here runs before a single worker starts, so a bad property never
//! costs a half-finished load phase.

use super::{Config, RuntimeConfig, WorkloadConfig};
use crate::backend::BackendRegistry;
use crate::distribution::DistributionRegistry;
use crate::error::ConfigError;
use crate::workload::registry::CORE;
use crate::workload::{validate_proportions, Operation, WorkloadRegistry};

/// Validate complete configuration against the registered names
///
/// The operation-mix checks only apply to the `core` workload; other
/// workloads validate their own keys when they are constructed.
pub fn validate_config(
    config: &Config,
    workloads: &WorkloadRegistry,
    distributions: &DistributionRegistry,
    backends: &BackendRegistry,
) -> Result<(), ConfigError> {
    if !workloads.contains(&config.workload.workload) {
        return Err(ConfigError::UnknownWorkload {
            name: config.workload.workload.clone(),
        });
    }
    if config.workload.workload == CORE {
        validate_workload(&config.workload, distributions)?;
    }
    validate_runtime(&config.runtime)?;

    if !backends.contains(&config.backend.name) {
        return Err(ConfigError::UnknownBackend {
            name: config.backend.name.clone(),
        });
    }
    Ok(())
}

/// Validate the `[workload]` section of a `core` workload
pub fn validate_workload(workload: &WorkloadConfig, distributions: &DistributionRegistry) -> Result<(), ConfigError> {
    let proportions = workload.proportions();
    validate_proportions(&proportions)?;

    for name in [
        &workload.request_distribution,
        &workload.field_length_distribution,
        &workload.scan_length_distribution,
    ] {
        if !distributions.contains(name) {
            return Err(ConfigError::UnknownDistribution { name: name.clone() });
        }
    }

    if workload.field_count == 0 {
        return Err(ConfigError::invalid("fieldcount", "must be at least 1"));
    }
    if workload.min_scan_length > workload.max_scan_length {
        return Err(ConfigError::invalid(
            "minscanlength",
            format!(
                "{} exceeds maxscanlength {}",
                workload.min_scan_length, workload.max_scan_length
            ),
        ));
    }
    if !workload.zipfian_theta.is_finite() || workload.zipfian_theta <= 0.0 {
        return Err(ConfigError::invalid(
            "zipfian_theta",
            format!("must be a finite value > 0, got {}", workload.zipfian_theta),
        ));
    }
    if !(workload.exponential_percentile > 0.0 && workload.exponential_percentile < 100.0) {
        return Err(ConfigError::invalid(
            "exponential_percentile",
            format!("must be in (0, 100), got {}", workload.exponential_percentile),
        ));
    }
    if !(workload.exponential_frac > 0.0 && workload.exponential_frac.is_finite()) {
        return Err(ConfigError::invalid(
            "exponential_frac",
            format!("must be a finite value > 0, got {}", workload.exponential_frac),
        ));
    }

    match (workload.hotspot_data_fraction, workload.hotspot_opn_fraction) {
        (Some(_), Some(_)) | (None, None) => {}
        (Some(_), None) => return Err(ConfigError::invalid("hotspotopnfraction", "required with hotspotdatafraction")),
        (None, Some(_)) => return Err(ConfigError::invalid("hotspotdatafraction", "required with hotspotopnfraction")),
    }
    if let Some(hotspot) = workload.hotspot() {
        hotspot.validate()?;
    }

    // Run-phase reads need records to draw keys from
    let touches_existing = proportions
        .iter()
        .any(|&(op, weight)| op != Operation::Insert && weight > 0.0);
    if workload.operation_count > 0 && touches_existing && workload.record_count == 0 {
        return Err(ConfigError::invalid(
            "recordcount",
            "must be at least 1 when the operation mix touches existing records",
        ));
    }

    Ok(())
}

/// Validate the `[runtime]` section
pub fn validate_runtime(runtime: &RuntimeConfig) -> Result<(), ConfigError> {
    if runtime.status && runtime.status_interval == 0 {
        return Err(ConfigError::invalid("statusinterval", "must be at least 1 second"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.workload.record_count = 100;
        config.workload.operation_count = 100;
        config
    }

    fn check(config: &Config) -> Result<(), ConfigError> {
        validate_config(
            config,
            &WorkloadRegistry::with_defaults(),
            &DistributionRegistry::with_defaults(),
            &BackendRegistry::with_defaults(),
        )
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(check(&valid_config()).is_ok());
    }

    #[test]
    fn test_proportion_sum_checked() {
        let mut config = valid_config();
        config.workload.scan_proportion = 0.1;
        assert!(matches!(check(&config), Err(ConfigError::ProportionSum { .. })));
    }

    #[test]
    fn test_proportions_within_tolerance_pass() {
        let mut config = valid_config();
        config.workload.read_proportion = 0.5;
        config.workload.update_proportion = 0.3;
        config.workload.insert_proportion = 0.2 + 5e-7;
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_unknown_names_rejected() {
        let mut config = valid_config();
        config.workload.scan_length_distribution = "gaussian".to_string();
        assert_eq!(
            check(&config),
            Err(ConfigError::UnknownDistribution {
                name: "gaussian".to_string()
            })
        );

        let mut config = valid_config();
        config.workload.workload = "graph".to_string();
        assert_eq!(
            check(&config),
            Err(ConfigError::UnknownWorkload {
                name: "graph".to_string()
            })
        );

        let mut config = valid_config();
        config.backend.name = "rocksdb".to_string();
        assert_eq!(
            check(&config),
            Err(ConfigError::UnknownBackend {
                name: "rocksdb".to_string()
            })
        );
    }

    #[test]
    fn test_half_configured_hotspot_rejected() {
        let mut config = valid_config();
        config.workload.hotspot_data_fraction = Some(0.2);
        assert!(matches!(check(&config), Err(ConfigError::InvalidValue { key, .. }) if key == "hotspotopnfraction"));

        config.workload.hotspot_opn_fraction = Some(1.5);
        assert!(matches!(check(&config), Err(ConfigError::InvalidValue { key, .. }) if key == "hotspotopnfraction"));

        config.workload.hotspot_opn_fraction = Some(0.8);
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_scan_bounds_checked() {
        let mut config = valid_config();
        config.workload.min_scan_length = 10;
        config.workload.max_scan_length = 5;
        assert!(check(&config).is_err());
    }

    #[test]
    fn test_empty_key_space_rejected_for_reads() {
        let mut config = valid_config();
        config.workload.record_count = 0;
        assert!(check(&config).is_err());

        // Pure inserts are fine
        config.workload.read_proportion = 0.0;
        config.workload.update_proportion = 0.0;
        config.workload.insert_proportion = 1.0;
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_mix_checks_skipped_for_trace_workload() {
        let mut config = valid_config();
        config.workload.workload = "pure_insert".to_string();
        config.workload.record_count = 0;
        config.workload.read_proportion = 0.3;
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_status_interval_checked() {
        let mut config = valid_config();
        config.runtime.status = true;
        config.runtime.status_interval = 0;
        assert!(check(&config).is_err());
    }
}

//! `[workload]` section
//!
//! Key names follow the YCSB property names (`recordcount`, `readproportion`,
//! ...) so existing workload files translate line for line.

use crate::distribution::Hotspot;
use crate::workload::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How load-phase ordinals map to key text
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsertOrder {
    /// Key text follows the ordinal
    #[default]
    Ordered,
    /// Ordinal is scrambled before formatting
    Hashed,
}

/// How load-phase workers obtain their ordinals
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyAssignment {
    /// One shared atomic counter
    #[default]
    Counter,
    /// Each worker walks its own disjoint range
    Partitioned,
}

impl fmt::Display for KeyAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAssignment::Counter => write!(f, "counter"),
            KeyAssignment::Partitioned => write!(f, "partitioned"),
        }
    }
}

/// Workload definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadConfig {
    /// Registered workload name
    pub workload: String,
    pub table: String,
    #[serde(rename = "recordcount")]
    pub record_count: u64,
    #[serde(rename = "operationcount")]
    pub operation_count: u64,
    #[serde(rename = "fieldcount")]
    pub field_count: u64,
    #[serde(rename = "fieldlength")]
    pub field_length: u64,
    #[serde(rename = "fieldlengthdistribution")]
    pub field_length_distribution: String,

    #[serde(rename = "readproportion")]
    pub read_proportion: f64,
    #[serde(rename = "updateproportion")]
    pub update_proportion: f64,
    #[serde(rename = "insertproportion")]
    pub insert_proportion: f64,
    #[serde(rename = "scanproportion")]
    pub scan_proportion: f64,
    #[serde(rename = "readmodifywriteproportion")]
    pub read_modify_write_proportion: f64,
    #[serde(rename = "deleteproportion")]
    pub delete_proportion: f64,

    #[serde(rename = "requestdistribution")]
    pub request_distribution: String,
    pub zipfian_theta: f64,
    #[serde(rename = "hotspotdatafraction")]
    pub hotspot_data_fraction: Option<f64>,
    #[serde(rename = "hotspotopnfraction")]
    pub hotspot_opn_fraction: Option<f64>,
    pub exponential_percentile: f64,
    pub exponential_frac: f64,

    #[serde(rename = "minscanlength")]
    pub min_scan_length: u64,
    #[serde(rename = "maxscanlength")]
    pub max_scan_length: u64,
    #[serde(rename = "scanlengthdistribution")]
    pub scan_length_distribution: String,

    #[serde(rename = "readallfields")]
    pub read_all_fields: bool,
    #[serde(rename = "writeallfields")]
    pub write_all_fields: bool,

    #[serde(rename = "insertorder")]
    pub insert_order: InsertOrder,
    #[serde(rename = "insertstart")]
    pub insert_start: u64,
    /// Records this process loads; defaults to `recordcount - insertstart`
    #[serde(rename = "insertcount")]
    pub insert_count: Option<u64>,
    #[serde(rename = "keyprefix")]
    pub key_prefix: String,
    #[serde(rename = "zeropadding")]
    pub zero_padding: usize,
    #[serde(rename = "insertkeyassignment")]
    pub insert_key_assignment: KeyAssignment,

    /// Directory holding `run.w.<n>` key traces (`pure_insert`)
    #[serde(rename = "workloadpath")]
    pub workload_path: PathBuf,
    /// Bytes in the single value field (`pure_insert`)
    #[serde(rename = "valuelength")]
    pub value_length: u64,

    /// Fixed seed for every generator; unseeded runs draw from entropy
    pub seed: Option<u64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workload: crate::workload::registry::CORE.to_string(),
            table: "usertable".to_string(),
            record_count: 0,
            operation_count: 0,
            field_count: 10,
            field_length: 100,
            field_length_distribution: "constant".to_string(),
            read_proportion: 0.95,
            update_proportion: 0.05,
            insert_proportion: 0.0,
            scan_proportion: 0.0,
            read_modify_write_proportion: 0.0,
            delete_proportion: 0.0,
            request_distribution: "uniform".to_string(),
            zipfian_theta: crate::distribution::zipf::DEFAULT_THETA,
            hotspot_data_fraction: None,
            hotspot_opn_fraction: None,
            exponential_percentile: crate::distribution::exponential::DEFAULT_PERCENTILE,
            exponential_frac: crate::distribution::exponential::DEFAULT_FRAC,
            min_scan_length: 1,
            max_scan_length: 1000,
            scan_length_distribution: "uniform".to_string(),
            read_all_fields: true,
            write_all_fields: false,
            insert_order: InsertOrder::Ordered,
            insert_start: 0,
            insert_count: None,
            key_prefix: "user".to_string(),
            zero_padding: 1,
            insert_key_assignment: KeyAssignment::Counter,
            workload_path: PathBuf::from("."),
            value_length: 100,
            seed: None,
        }
    }
}

impl WorkloadConfig {
    /// Operation mix as `(kind, weight)` pairs in a fixed order
    pub fn proportions(&self) -> [(Operation, f64); 6] {
        [
            (Operation::Read, self.read_proportion),
            (Operation::Update, self.update_proportion),
            (Operation::Insert, self.insert_proportion),
            (Operation::Scan, self.scan_proportion),
            (Operation::ReadModifyWrite, self.read_modify_write_proportion),
            (Operation::Delete, self.delete_proportion),
        ]
    }

    /// Hotspot, when both fractions are configured
    pub fn hotspot(&self) -> Option<Hotspot> {
        match (self.hotspot_data_fraction, self.hotspot_opn_fraction) {
            (Some(data_fraction), Some(opn_fraction)) => Some(Hotspot {
                data_fraction,
                opn_fraction,
            }),
            _ => None,
        }
    }

    /// Number of records the load phase inserts
    pub fn load_count(&self) -> u64 {
        self.insert_count
            .unwrap_or_else(|| self.record_count.saturating_sub(self.insert_start))
    }

    /// Field names `field0 .. field{n-1}`
    pub fn field_names(&self) -> Vec<String> {
        (0..self.field_count).map(|i| format!("field{}", i)).collect()
    }
}

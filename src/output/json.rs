//! JSON output formatting
//!
//! One document per invocation holding the effective configuration and every
//! phase report, so a run can be compared against others without re-parsing
//! console output.

use crate::config::Config;
use crate::coordinator::PhaseReport;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    /// RFC 3339 local timestamp of when the report was written
    pub generated_at: String,
    pub config: Config,
    pub phases: Vec<PhaseReport>,
}

impl JsonReport {
    pub fn new(config: Config, phases: Vec<PhaseReport>) -> Self {
        Self::at(Local::now(), config, phases)
    }

    pub fn at(now: DateTime<Local>, config: Config, phases: Vec<PhaseReport>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: now.to_rfc3339(),
            config,
            phases,
        }
    }
}

/// Serialize `report` as pretty-printed JSON into `writer`
pub fn write_json<W: Write>(writer: W, report: &JsonReport) -> Result<()> {
    serde_json::to_writer_pretty(writer, report).context("Failed to serialize JSON report")
}

/// Write `report` to `path`, replacing any existing file
pub fn write_json_file(path: &Path, report: &JsonReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create JSON file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_json(&mut writer, report)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

//! TOML configuration file parsing
//!
//! Files are merged key by key in the order given, so a later file only needs
//! to name what it changes. Overrides of the form `section.key=value` are
//! applied last; the value is read as a TOML literal (`100`, `0.5`, `true`,
//! `"text"`) and anything that does not parse is taken as a plain string, so
//! `-p workload.requestdistribution=zipfian` needs no quoting. A key without
//! a section lands in `[workload]`, matching YCSB's `-p recordcount=1000`.

use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use ::toml::{Table, Value};

/// Section used for overrides that do not name one
pub const DEFAULT_SECTION: &str = "workload";

/// Parse TOML configuration file into a raw table
pub fn parse_toml_file(path: &Path) -> Result<Table> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    contents
        .parse::<Table>()
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let table = contents
        .parse::<Table>()
        .context("Failed to parse TOML configuration")?;
    into_config(table)
}

/// Deserialize a merged table
pub fn into_config(table: Table) -> Result<Config> {
    Value::Table(table)
        .try_into::<Config>()
        .context("Invalid configuration")
}

/// Merge `overlay` into `base`; nested tables merge, everything else replaces
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => merge_tables(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Read an override value as a TOML literal, falling back to a string
pub fn parse_override_value(raw: &str) -> Value {
    let raw = raw.trim();
    format!("value = {}", raw)
        .parse::<Table>()
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Apply one `section.key=value` assignment
pub fn apply_override(table: &mut Table, assignment: &str) -> Result<()> {
    let (path, raw) = assignment
        .split_once('=')
        .with_context(|| format!("Override `{}` is not of the form key=value", assignment))?;

    let mut segments: Vec<&str> = path.trim().split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        anyhow::bail!("Override `{}` has an empty key", assignment);
    }
    if segments.len() == 1 {
        segments.insert(0, DEFAULT_SECTION);
    }

    let (leaf, parents) = segments
        .split_last()
        .with_context(|| format!("Override `{}` has an empty key", assignment))?;

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        current = match entry {
            Value::Table(t) => t,
            _ => anyhow::bail!("Override `{}`: `{}` is not a table", assignment, segment),
        };
    }
    current.insert(leaf.to_string(), parse_override_value(raw));
    Ok(())
}

/// Build the configuration from files and overrides
pub fn load_config(files: &[PathBuf], overrides: &[String]) -> Result<Config> {
    let mut merged = Table::new();
    for path in files {
        merge_tables(&mut merged, parse_toml_file(path)?);
    }
    for assignment in overrides {
        apply_override(&mut merged, assignment)?;
    }
    into_config(merged)
}

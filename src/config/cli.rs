//! CLI argument parsing using clap

use super::Config;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// kvpulse - key-value workload generator and benchmark harness
#[derive(Parser, Debug)]
#[command(name = "kvpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Run the load phase (insert the initial records)
    #[arg(long)]
    pub load: bool,

    /// Run the transaction phase
    #[arg(long)]
    pub run: bool,

    /// Worker threads (overrides runtime.threadcount; 0 = one per CPU)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Backend name (overrides backend.name)
    #[arg(long)]
    pub db: Option<String>,

    /// Workload file; may repeat, later files override earlier ones
    #[arg(short = 'P', value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Single property override, e.g. -p workload.recordcount=1000
    #[arg(short = 'p', value_name = "SECTION.KEY=VALUE")]
    pub properties: Vec<String>,

    /// Print periodic status lines while a phase runs
    #[arg(short = 's', long)]
    pub status: bool,

    /// Write all phase reports as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Enable debug logging (same as RUST_LOG=debug)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// At least one phase must be requested
    pub fn validate(&self) -> Result<()> {
        if !self.load && !self.run {
            anyhow::bail!("Nothing to do: pass --load, --run, or both");
        }
        Ok(())
    }

    /// Load files and overrides, then apply the dedicated flags
    pub fn build_config(&self) -> Result<Config> {
        let mut config = super::toml::load_config(&self.files, &self.properties)?;
        self.apply(&mut config);
        Ok(config)
    }

    /// CLI flags take precedence over files and `-p` overrides
    pub fn apply(&self, config: &mut Config) {
        if let Some(threads) = self.threads {
            config.runtime.thread_count = threads;
        }
        if let Some(db) = &self.db {
            config.backend.name = db.clone();
        }
        if self.status {
            config.runtime.status = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ycsb_style_arguments() {
        let cli = Cli::try_parse_from([
            "kvpulse", "--load", "--run", "-P", "a.toml", "-P", "b.toml", "-p", "recordcount=10", "-t", "4", "--db",
            "memory", "-s",
        ])
        .unwrap();

        assert!(cli.load && cli.run && cli.status);
        assert_eq!(cli.files, vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]);
        assert_eq!(cli.properties, vec!["recordcount=10"]);
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.db.as_deref(), Some("memory"));
    }

    #[test]
    fn test_requires_a_phase() {
        let cli = Cli::try_parse_from(["kvpulse"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["kvpulse", "--run", "--threads", "0", "--db", "memory", "--status"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.runtime.thread_count, 0);
        assert_eq!(config.backend.name, "memory");
        assert!(config.runtime.status);
    }

    #[test]
    fn test_build_config_from_overrides() {
        let cli = Cli::try_parse_from(["kvpulse", "--load", "-p", "workload.recordcount=5", "-p", "backend.name=memory"])
            .unwrap();
        let config = cli.build_config().unwrap();
        assert_eq!(config.workload.record_count, 5);
        assert_eq!(config.backend.name, "memory");
    }
}

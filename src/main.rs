//! kvpulse CLI entry point

use anyhow::{Context, Result};
use kvpulse::backend::BackendRegistry;
use kvpulse::config::cli::Cli;
use kvpulse::config::validator::validate_config;
use kvpulse::coordinator::{run_phase, Phase, PhaseContext, PhaseReport};
use kvpulse::distribution::DistributionRegistry;
use kvpulse::output::json::{write_json_file, JsonReport};
use kvpulse::output::text;
use kvpulse::workload::WorkloadRegistry;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; results own stdout
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    cli.validate()?;

    let config = cli.build_config().context("Failed to load configuration")?;
    let workloads = WorkloadRegistry::with_defaults();
    let distributions = DistributionRegistry::with_defaults();
    let backends = BackendRegistry::with_defaults();
    validate_config(&config, &workloads, &distributions, &backends).context("Configuration validation failed")?;

    let workload = workloads
        .create(&config.workload.workload, &config.workload, distributions)
        .with_context(|| format!("Failed to set up workload `{}`", config.workload.workload))?;
    let factory = backends
        .create(&config.backend.name, &config.backend.options)
        .with_context(|| format!("Failed to create backend `{}`", config.backend.name))?;

    println!("kvpulse v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "workload: {}, backend: {}, records: {}, operations: {}",
        workload.name(),
        factory.name(),
        config.workload.record_count,
        config.workload.operation_count
    );
    println!();

    let ctx = PhaseContext {
        workload,
        factory,
        runtime: config.runtime.clone(),
        histogram: config.measurement.histogram,
    };

    let mut reports = Vec::new();
    if cli.load {
        reports.push(execute(&ctx, Phase::Load)?);

        let pause = config.runtime.sleep_after_load;
        if cli.run && pause > 0 {
            info!(seconds = pause, "sleeping after load");
            thread::sleep(Duration::from_secs(pause));
        }
    }
    if cli.run {
        reports.push(execute(&ctx, Phase::Run)?);
    }

    if let Some(path) = &cli.json {
        write_json_file(path, &JsonReport::new(config, reports))?;
        info!(path = %path.display(), "wrote JSON report");
    }
    Ok(())
}

fn execute(ctx: &PhaseContext, phase: Phase) -> Result<PhaseReport> {
    let report = run_phase(ctx, phase).with_context(|| format!("{} phase failed", phase))?;
    text::print_phase_summary(&report).context("Failed to print summary")?;
    println!();
    info!("{}", text::summary_line(&report));
    Ok(report)
}

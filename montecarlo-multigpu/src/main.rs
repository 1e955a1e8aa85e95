//! `mcm`: price a random European call portfolio across every device and
//! validate it against Black-Scholes.
//!
//! Exits with 0 when the last validation passed and 1 otherwise.

use clap::Parser;
use montecarlo_multigpu::core::{Error, Result};
use montecarlo_multigpu::devices::Platform;
use montecarlo_multigpu::engine::Orchestrator;
use montecarlo_multigpu::report::{write_banner, write_report};
use montecarlo_multigpu::{Cli, RunConfig};
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // a bad configuration is still logged with the flag's filter
    let cli_level = cli.log_level.clone();
    let loaded = RunConfig::load(cli);
    init_logging(match &loaded {
        Ok(config) => config.log_level.as_deref(),
        Err(_) => cli_level.as_deref(),
    });

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) if e.is_configuration() => {
            tracing::error!("nothing to run: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("run aborted: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &RunConfig) -> Result<bool> {
    let platform = Platform::detect(config.devices, config.compute_units);
    let orchestrator = Orchestrator::new(platform, config.settings);
    let total = orchestrator.total_options()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_banner(&mut out, orchestrator.settings(), orchestrator.platform(), total).map_err(io_error)?;
    out.flush().map_err(io_error)?;

    let report = orchestrator.run()?;
    write_report(&mut out, &report, orchestrator.platform()).map_err(io_error)?;
    out.flush().map_err(io_error)?;
    Ok(report.passed())
}

fn io_error(e: std::io::Error) -> Error {
    Error::Runtime(format!("cannot write report: {e}"))
}

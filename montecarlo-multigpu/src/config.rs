//! Run configuration: defaults, then environment (`.env` included), then
//! command-line flags.

use clap::Parser;
use mcm_core::{errors::Result, Error, Size};
use mcm_engine::{Method, RunSettings, Scaling};
use std::str::FromStr;

/// Command-line flags of `mcm`.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "mcm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Monte Carlo pricing of European calls across several devices", long_about = None)]
pub struct Cli {
    /// Parallelisation method: threaded (one host thread per device) or
    /// streamed (one host thread for all devices) [default: streamed]
    #[arg(long, value_name = "threaded|streamed")]
    pub method: Option<String>,

    /// Problem scaling: strong (constant problem size) or weak (problem
    /// size grows with the device count) [default: weak]
    #[arg(long, value_name = "strong|weak")]
    pub scaling: Option<String>,

    /// Run threaded then streamed and validate both
    #[arg(long)]
    pub qatest: bool,

    /// Number of host-backed devices [default: available parallelism]
    #[arg(long)]
    pub devices: Option<usize>,

    /// Compute units reported by every device
    #[arg(long)]
    pub compute_units: Option<u32>,

    /// Options per device before capability adjustment [default: 8192]
    #[arg(long)]
    pub options: Option<Size>,

    /// Simulation paths per option [default: 262144]
    #[arg(long)]
    pub paths: Option<Size>,

    /// Seed for the portfolio and the simulation [default: 123]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter (trace, debug, info, warn, error or a RUST_LOG directive)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// What to run.
    pub settings: RunSettings,
    /// Device count; `None` detects.
    pub devices: Option<usize>,
    /// Compute units per device; `None` uses the host default.
    pub compute_units: Option<u32>,
    /// Log filter from `MCM_LOG_LEVEL` or `--log-level`; `None` falls back
    /// to `RUST_LOG`.
    pub log_level: Option<String>,
}

impl RunConfig {
    /// Load `.env`, then resolve the process environment and `cli`.
    pub fn load(cli: Cli) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    /// Resolve defaults, then `env`, then `cli`; later layers win.
    pub fn resolve(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(&env)?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
        let settings = &mut self.settings;
        if let Some(method) = env("MCM_METHOD") {
            settings.method = Method::parse_lenient(&method);
        }
        if let Some(scaling) = env("MCM_SCALING") {
            settings.scaling = Scaling::parse_lenient(&scaling);
        }
        if let Some(qa) = env("MCM_QATEST") {
            settings.qa_test = parse_flag("MCM_QATEST", &qa)?;
        }
        if let Some(v) = env("MCM_OPTIONS") {
            settings.options_per_device = parse_number("MCM_OPTIONS", &v)?;
        }
        if let Some(v) = env("MCM_PATHS") {
            settings.path_count = parse_number("MCM_PATHS", &v)?;
        }
        if let Some(v) = env("MCM_SEED") {
            settings.seed = parse_number("MCM_SEED", &v)?;
        }
        if let Some(v) = env("MCM_DEVICES") {
            self.devices = Some(parse_number("MCM_DEVICES", &v)?);
        }
        if let Some(v) = env("MCM_COMPUTE_UNITS") {
            self.compute_units = Some(parse_number("MCM_COMPUTE_UNITS", &v)?);
        }
        if let Some(level) = env("MCM_LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
            self.log_level = Some(level.trim().to_string());
        }
        Ok(())
    }

    fn apply_cli(&mut self, cli: Cli) {
        let settings = &mut self.settings;
        if let Some(method) = cli.method {
            settings.method = Method::parse_lenient(&method);
        }
        if let Some(scaling) = cli.scaling {
            settings.scaling = Scaling::parse_lenient(&scaling);
        }
        settings.qa_test |= cli.qatest;
        if let Some(n) = cli.options {
            settings.options_per_device = n;
        }
        if let Some(n) = cli.paths {
            settings.path_count = n;
        }
        if let Some(seed) = cli.seed {
            settings.seed = seed;
        }
        self.devices = cli.devices.or(self.devices);
        self.compute_units = cli.compute_units.or(self.compute_units);
        self.log_level = cli.log_level.or(self.log_level.take());
    }

    fn validate(&self) -> Result<()> {
        if self.devices == Some(0) {
            return Err(Error::NoDevices);
        }
        if self.settings.path_count < 2 {
            return Err(Error::Config(format!(
                "at least 2 paths are required, got {}",
                self.settings.path_count
            )));
        }
        Ok(())
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key}: not a boolean: {other}"))),
    }
}

//! # montecarlo-multigpu
//!
//! Monte Carlo pricing of a European call portfolio spread across several
//! compute devices, validated against the closed-form Black-Scholes price.
//!
//! This crate is a façade over the workspace crates plus the pieces the
//! `mcm` binary is built from: layered configuration and the stdout report.
//!
//! ```rust
//! use montecarlo_multigpu::devices::Platform;
//! use montecarlo_multigpu::engine::{Orchestrator, RunSettings};
//!
//! let settings = RunSettings {
//!     options_per_device: 16,
//!     path_count: 4096,
//!     ..RunSettings::default()
//! };
//! let report = Orchestrator::new(Platform::host(2, 64), settings).run().unwrap();
//! assert_eq!(report.total_options(), 32);
//! assert_eq!(report.passes.len(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use mcm_core as core;

/// Normal distribution, random number generators, statistics.
pub use mcm_math as math;

/// Option data, the Monte Carlo kernel and the Black-Scholes reference.
pub use mcm_pricing as pricing;

/// Devices, queues, device memory and capability sizing.
pub use mcm_devices as devices;

/// Plans, strategies, orchestration and aggregation.
pub use mcm_engine as engine;

/// Layered run configuration.
pub mod config;

/// Stdout report.
pub mod report;

pub use config::{Cli, RunConfig};

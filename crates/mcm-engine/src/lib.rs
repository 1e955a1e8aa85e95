//! # mcm-engine
//!
//! Work distribution and execution for multi-device Monte Carlo pricing.
//!
//! A run generates a [`Portfolio`], partitions it into one
//! [`ExecutionPlan`] per device, drives every plan through a
//! [`DeviceSession`] under one of the [`ExecutionStrategy`] implementations,
//! and finally [`compare`]s the results against a closed-form reference.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Comparison of simulated prices against a reference.
pub mod aggregate;

/// Per-plan device lifecycle (init, simulate, teardown).
pub mod driver;

/// Partitioning of the portfolio into per-device plans.
pub mod plan;

/// Option inputs, result slots and their per-plan views.
pub mod portfolio;

/// Settings, orchestration and run reports.
pub mod run;

/// Threaded and streamed execution strategies.
pub mod strategy;

// ── Re-exports ───────────────────────────────────────────────────────────────

pub use aggregate::{compare, Comparison, EXACT_MATCH_TOLERANCE, PASS_THRESHOLD};
pub use driver::{DeviceSession, LaunchedSession, SimulatedSession};
pub use plan::{build_plans, partition, ExecutionPlan, PlanSet};
pub use portfolio::{PlanView, Portfolio};
pub use run::{
    Orchestrator, PassOutcome, RunReport, RunSettings, Scaling, DEFAULT_OPTIONS_PER_DEVICE,
    DEFAULT_PATH_COUNT, DEFAULT_SEED,
};
pub use strategy::{DeviceTiming, ExecutionStrategy, Method, PassTiming, Streamed, Threaded};

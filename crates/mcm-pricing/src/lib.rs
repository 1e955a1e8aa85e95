//! # mcm-pricing
//!
//! The numerical collaborators of the multi-device engine:
//!
//! * [`option`]: per-option market data and the per-option result
//! * [`analytic`]: the closed-form Black-Scholes call used as reference
//! * [`monte_carlo`]: the per-option path-simulation kernel

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Closed-form Black-Scholes pricing.
pub mod analytic;

/// Monte Carlo option kernel.
pub mod monte_carlo;

/// Option market data and simulation results.
pub mod option;

pub use analytic::{black_scholes_call, BlackScholesCall, ReferencePricer};
pub use monte_carlo::{EuropeanCallKernel, OptionKernel, CONFIDENCE_MULTIPLIER};
pub use option::{OptionData, OptionValue};

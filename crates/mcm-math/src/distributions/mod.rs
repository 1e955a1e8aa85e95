//! Probability distributions.
//!
//! Only the standard normal is needed: its CDF drives the closed-form
//! reference price and its inverse turns uniform deviates into the normal
//! shocks of the Monte Carlo kernel.

pub mod normal;

pub use normal::{normal_cdf, normal_pdf};

//! Monte Carlo option kernel.
//!
//! The kernel is the unit of work the multi-device engine schedules: given
//! one option and a path count it returns an [`OptionValue`].  The engine
//! treats it as opaque, so it sits behind the [`OptionKernel`] trait and
//! tests substitute deterministic, slow, or failing kernels.

use crate::option::{OptionData, OptionValue};
use mcm_core::{ensure, ensure_post, errors::Result, Error, Real, Size};
use mcm_math::random_numbers::{stream_seed, InverseCumulativeNormalRng};
use mcm_math::statistics::Statistics;

/// Two-sided 95 % normal quantile applied to the standard error.
pub const CONFIDENCE_MULTIPLIER: Real = 1.96;

/// A per-option path-simulation kernel.
///
/// `index` is the option's position in the whole portfolio.  Implementations
/// must derive any randomness from it (never from the device or plan), so
/// that the same option gets the same estimate however the portfolio is
/// partitioned.
pub trait OptionKernel: Send + Sync {
    /// Simulate `path_count` paths for `option` and return its estimate.
    fn simulate(&self, option: &OptionData, path_count: Size, index: Size) -> Result<OptionValue>;
}

/// Terminal-value GBM simulation of a European call.
///
/// Each path draws one standard normal `z` and evaluates
/// `S_T = S exp((r - v²/2) T + v √T z)`.  The estimate is the discounted
/// mean payoff and the confidence is `1.96 · σ / √n`, discounted.
#[derive(Debug, Clone, Copy)]
pub struct EuropeanCallKernel {
    seed: u64,
}

impl EuropeanCallKernel {
    /// Create a kernel whose per-option generators derive from `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The base seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl OptionKernel for EuropeanCallKernel {
    fn simulate(&self, option: &OptionData, path_count: Size, index: Size) -> Result<OptionValue> {
        ensure!(path_count >= 2, "at least 2 paths are required, got {path_count}");
        if !(option.t >= 0.0 && option.v >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "option {index}: maturity {} and volatility {} must be non-negative",
                option.t, option.v
            )));
        }

        let mut rng = InverseCumulativeNormalRng::new(stream_seed(self.seed, index as u64));
        let drift = (option.r - 0.5 * option.v * option.v) * option.t;
        let vol_sqrt_t = option.v * option.t.sqrt();

        let mut stats = Statistics::new();
        for _ in 0..path_count {
            let z = rng.next_real();
            let s_t = option.s * (drift + vol_sqrt_t * z).exp();
            stats.add((s_t - option.x).max(0.0));
        }

        let discount = option.discount();
        let expected = discount * stats.mean().unwrap_or(0.0);
        let confidence = discount * CONFIDENCE_MULTIPLIER * stats.error_estimate().unwrap_or(0.0);
        ensure_post!(
            expected.is_finite() && confidence.is_finite(),
            "option {index}: non-finite estimate {expected} ± {confidence}"
        );
        Ok(OptionValue::new(expected, confidence))
    }
}

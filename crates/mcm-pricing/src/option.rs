//! Option market data and per-option simulation results.

use mcm_core::{Price, Rate, Real, Time, Volatility};

/// Market parameters of one European call option.
///
/// Created once when the portfolio is generated; read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionData {
    /// Spot price of the underlying.
    pub s: Price,
    /// Strike.
    pub x: Price,
    /// Time to maturity in years.
    pub t: Time,
    /// Continuously compounded risk-free rate.
    pub r: Rate,
    /// Volatility.
    pub v: Volatility,
}

impl OptionData {
    /// Create option data from spot, strike, maturity, rate and volatility.
    pub fn new(s: Price, x: Price, t: Time, r: Rate, v: Volatility) -> Self {
        Self { s, x, t, r, v }
    }

    /// Discount factor `exp(-r t)` to maturity.
    pub fn discount(&self) -> Real {
        (-self.r * self.t).exp()
    }
}

/// Monte Carlo estimate for one option: the discounted expected payoff and
/// the half-width of its confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionValue {
    /// Estimated option value.
    pub expected: Real,
    /// Half-width of the confidence interval around `expected`.
    pub confidence: Real,
}

impl OptionValue {
    /// Sentinel for a result no device has written yet.
    pub const UNSET: OptionValue = OptionValue {
        expected: -1.0,
        confidence: -1.0,
    };

    /// Create a result.
    pub fn new(expected: Real, confidence: Real) -> Self {
        Self {
            expected,
            confidence,
        }
    }

    /// Whether a device has written this result.
    pub fn is_set(&self) -> bool {
        *self != Self::UNSET
    }
}

impl Default for OptionValue {
    fn default() -> Self {
        Self::UNSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unset() {
        let v = OptionValue::default();
        assert!(!v.is_set());
        assert_eq!(v.expected, -1.0);
        assert_eq!(v.confidence, -1.0);
        assert!(OptionValue::new(4.0, 0.5).is_set());
    }

    #[test]
    fn discount_factor() {
        let o = OptionData::new(30.0, 20.0, 2.0, 0.06, 0.10);
        assert!((o.discount() - (-0.12_f64).exp()).abs() < 1e-15);
    }
}

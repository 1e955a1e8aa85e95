//! Closed-form Black-Scholes call price (no dividends):
//!
//! $$C = S N(d_1) - X e^{-rT} N(d_2)$$
//!
//! where $d_{1,2} = \frac{\ln(S/X) + (r \pm v^2/2)T}{v\sqrt{T}}$.
//!
//! This is the reference every Monte Carlo estimate is validated against.

use crate::option::OptionData;
use mcm_core::Price;
use mcm_math::distributions::normal_cdf;

/// Black-Scholes price of a European call on `option`.
///
/// Expired options price at intrinsic value; zero volatility prices at the
/// discounted forward intrinsic value.
pub fn black_scholes_call(option: &OptionData) -> Price {
    let OptionData { s, x, t, r, v } = *option;
    if t <= 0.0 {
        return (s - x).max(0.0);
    }

    let discount = (-r * t).exp();
    let std_dev = v * t.sqrt();
    if std_dev <= 1e-15 {
        return (s - x * discount).max(0.0);
    }

    let d1 = ((s / x).ln() + (r + 0.5 * v * v) * t) / std_dev;
    let d2 = d1 - std_dev;
    s * normal_cdf(d1) - x * discount * normal_cdf(d2)
}

/// Source of the reference price an estimate is compared against.
///
/// Any `Fn(&OptionData) -> Price` closure is a reference pricer, which is
/// how tests pin reference prices to exact values.
pub trait ReferencePricer: Sync {
    /// Reference price of `option`.
    fn price(&self, option: &OptionData) -> Price;
}

impl<F> ReferencePricer for F
where
    F: Fn(&OptionData) -> Price + Sync,
{
    fn price(&self, option: &OptionData) -> Price {
        self(option)
    }
}

/// The closed-form Black-Scholes call as a [`ReferencePricer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholesCall;

impl ReferencePricer for BlackScholesCall {
    fn price(&self, option: &OptionData) -> Price {
        black_scholes_call(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn call(s: f64, x: f64, r: f64, v: f64, t: f64) -> Price {
        black_scholes_call(&OptionData::new(s, x, t, r, v))
    }

    #[test]
    fn at_the_money() {
        // S=100, X=100, r=5%, v=20%, T=1
        assert_abs_diff_eq!(call(100.0, 100.0, 0.05, 0.20, 1.0), 10.4506, epsilon = 0.01);
    }

    #[test]
    fn deep_in_the_money_is_forward_intrinsic() {
        let forward_intrinsic = 50.0 - 10.0 * (-0.30_f64).exp();
        assert_abs_diff_eq!(call(50.0, 10.0, 0.06, 0.10, 5.0), forward_intrinsic, epsilon = 1e-6);
    }

    #[test]
    fn zero_volatility() {
        let expected = 100.0 - 95.0 * (-0.05_f64).exp();
        assert_abs_diff_eq!(call(100.0, 95.0, 0.05, 0.0, 1.0), expected, epsilon = 1e-12);
        assert_eq!(call(80.0, 95.0, 0.05, 0.0, 1.0), 0.0);
    }

    #[test]
    fn expired_option_is_intrinsic() {
        assert_eq!(call(12.0, 10.0, 0.06, 0.1, 0.0), 2.0);
        assert_eq!(call(8.0, 10.0, 0.06, 0.1, 0.0), 0.0);
    }

    #[test]
    fn price_increases_with_spot() {
        let prices: Vec<Price> = [10.0, 15.0, 20.0, 25.0, 30.0]
            .iter()
            .map(|&s| call(s, 20.0, 0.06, 0.10, 2.0))
            .collect();
        assert!(prices.windows(2).all(|w| w[0] < w[1]), "{prices:?}");
    }

    #[test]
    fn closures_are_reference_pricers() {
        let fixed = |_: &OptionData| 4.0;
        let o = OptionData::new(30.0, 20.0, 2.0, 0.06, 0.10);
        assert_eq!(fixed.price(&o), 4.0);
        assert_eq!(BlackScholesCall.price(&o), black_scholes_call(&o));
    }
}

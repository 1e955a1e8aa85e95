//! The portfolio: option inputs and the result array devices write into.

use crate::plan::{ExecutionPlan, PlanSet};
use mcm_core::{ensure, errors::Result, Rate, Real, Volatility};
use mcm_pricing::{OptionData, OptionValue};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

/// Spot prices are drawn uniformly from this range.
pub const SPOT_RANGE: (Real, Real) = (5.0, 50.0);
/// Strikes are drawn uniformly from this range.
pub const STRIKE_RANGE: (Real, Real) = (10.0, 25.0);
/// Maturities (years) are drawn uniformly from this range.
pub const MATURITY_RANGE: (Real, Real) = (1.0, 5.0);
/// Risk-free rate shared by every generated option.
pub const RISK_FREE_RATE: Rate = 0.06;
/// Volatility shared by every generated option.
pub const VOLATILITY: Volatility = 0.10;

/// Option inputs plus one result slot per option.
#[derive(Debug, Clone)]
pub struct Portfolio {
    options: Vec<OptionData>,
    results: Vec<OptionValue>,
}

/// One plan's view of the portfolio: its options and its result slots.
#[derive(Debug)]
pub struct PlanView<'a> {
    /// The plan.
    pub plan: &'a ExecutionPlan,
    /// The plan's input options.
    pub options: &'a [OptionData],
    /// The plan's result slots; no other view aliases them.
    pub results: &'a mut [OptionValue],
}

impl Portfolio {
    /// A portfolio over `options` with every result unset.
    pub fn new(options: Vec<OptionData>) -> Self {
        let results = vec![OptionValue::UNSET; options.len()];
        Self { options, results }
    }

    /// Generate `count` random call options from `seed`.
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let spot = Uniform::new_inclusive(SPOT_RANGE.0, SPOT_RANGE.1);
        let strike = Uniform::new_inclusive(STRIKE_RANGE.0, STRIKE_RANGE.1);
        let maturity = Uniform::new_inclusive(MATURITY_RANGE.0, MATURITY_RANGE.1);

        let options = (0..count)
            .map(|_| {
                let s = spot.sample(&mut rng);
                let x = strike.sample(&mut rng);
                let t = maturity.sample(&mut rng);
                OptionData::new(s, x, t, RISK_FREE_RATE, VOLATILITY)
            })
            .collect();
        Self::new(options)
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether the portfolio holds no options.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Option inputs.
    pub fn options(&self) -> &[OptionData] {
        &self.options
    }

    /// Results, `UNSET` where no device has written yet.
    pub fn results(&self) -> &[OptionValue] {
        &self.results
    }

    /// Number of results no device has written.
    pub fn unset_count(&self) -> usize {
        self.results.iter().filter(|v| !v.is_set()).count()
    }

    /// Restore every result to `UNSET`.
    pub fn reset_results(&mut self) {
        self.results.fill(OptionValue::UNSET);
    }

    /// Split the portfolio into one disjoint view per plan.
    pub fn split_results<'a>(&'a mut self, plans: &'a PlanSet) -> Result<Vec<PlanView<'a>>> {
        plans.validate()?;
        ensure!(
            plans.total_options() == self.len(),
            "plans cover {} options, portfolio holds {}",
            plans.total_options(),
            self.len()
        );

        let mut views = Vec::with_capacity(plans.len());
        let mut rest: &'a mut [OptionValue] = &mut self.results;
        for plan in plans {
            let (results, tail) = std::mem::take(&mut rest).split_at_mut(plan.option_count);
            rest = tail;
            views.push(PlanView {
                plan,
                options: &self.options[plan.range()],
                results,
            });
        }
        Ok(views)
    }
}

//! Aggregator: compare simulated prices against a reference pricer.

use mcm_core::{ensure, errors::Result, Error, Real, Size};
use mcm_pricing::{OptionData, OptionValue, ReferencePricer};

/// Deltas at or below this are treated as exact matches and contribute no
/// reserve.
pub const EXACT_MATCH_TOLERANCE: Real = 1e-6;

/// A run passes when the average reserve exceeds this.
pub const PASS_THRESHOLD: Real = 1.0;

/// Accumulated comparison of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    /// Σ |reference − expected|.
    pub sum_delta: Real,
    /// Σ |reference|.
    pub sum_ref: Real,
    /// Σ confidence / delta over options with delta above tolerance.
    pub sum_reserve: Real,
    /// Number of options compared.
    pub option_count: Size,
    /// Number of results that were still unset.
    pub unset: Size,
    /// Relative L1 error: `sum_delta / sum_ref`.
    pub l1_norm: Real,
    /// `sum_reserve / option_count`.
    pub average_reserve: Real,
}

impl Comparison {
    /// Whether the average reserve clears [`PASS_THRESHOLD`].
    pub fn passed(&self) -> bool {
        self.average_reserve > PASS_THRESHOLD
    }
}

/// Compare `results` against `reference` option by option, in index order.
pub fn compare<R>(options: &[OptionData], results: &[OptionValue], reference: &R) -> Result<Comparison>
where
    R: ReferencePricer + ?Sized,
{
    if options.is_empty() {
        return Err(Error::EmptyPortfolio);
    }
    ensure!(
        options.len() == results.len(),
        "{} options but {} results",
        options.len(),
        results.len()
    );

    let mut sum_delta = 0.0;
    let mut sum_ref = 0.0;
    let mut sum_reserve = 0.0;
    let mut unset = 0;
    for (option, value) in options.iter().zip(results) {
        if !value.is_set() {
            unset += 1;
        }
        let reference = reference.price(option);
        let delta = (reference - value.expected).abs();
        sum_delta += delta;
        sum_ref += reference.abs();
        if delta > EXACT_MATCH_TOLERANCE {
            sum_reserve += value.confidence / delta;
        }
    }
    if unset > 0 {
        tracing::warn!(unset, "results left unset by the devices");
    }

    let option_count = options.len();
    let comparison = Comparison {
        sum_delta,
        sum_ref,
        sum_reserve,
        option_count,
        unset,
        l1_norm: sum_delta / sum_ref,
        average_reserve: sum_reserve / option_count as Real,
    };
    tracing::debug!(
        l1_norm = comparison.l1_norm,
        average_reserve = comparison.average_reserve,
        "comparison done"
    );
    Ok(comparison)
}

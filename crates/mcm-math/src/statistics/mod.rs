//! Running sample statistics for Monte Carlo estimators.

use mcm_core::{Real, Size};

/// Single-pass mean and variance accumulator (Welford's update).
///
/// Paths are folded in one at a time, so an estimator never has to keep
/// its payoffs around.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    n: Size,
    mean: Real,
    m2: Real,
}

impl Statistics {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one sample.
    pub fn add(&mut self, x: Real) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as Real;
        self.m2 += delta * (x - self.mean);
    }

    /// Number of samples folded in.
    pub fn samples(&self) -> Size {
        self.n
    }

    /// Sample mean, `None` when empty.
    pub fn mean(&self) -> Option<Real> {
        (self.n > 0).then_some(self.mean)
    }

    /// Bessel-corrected sample variance, `None` below two samples.
    pub fn variance(&self) -> Option<Real> {
        (self.n > 1).then(|| (self.m2 / (self.n - 1) as Real).max(0.0))
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> Option<Real> {
        self.variance().map(Real::sqrt)
    }

    /// Standard error of the mean, `σ / √n`.
    pub fn error_estimate(&self) -> Option<Real> {
        self.variance().map(|v| (v / self.n as Real).sqrt())
    }

    /// Forget every sample.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Extend<Real> for Statistics {
    fn extend<I: IntoIterator<Item = Real>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<Real> for Statistics {
    fn from_iter<I: IntoIterator<Item = Real>>(iter: I) -> Self {
        let mut s = Self::new();
        s.extend(iter);
        s
    }
}

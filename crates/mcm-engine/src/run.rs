//! Orchestration of a complete run: size, generate, plan, execute, compare.

use crate::aggregate::{compare, Comparison};
use crate::plan::{build_plans, PlanSet};
use crate::portfolio::Portfolio;
use crate::strategy::{Method, PassTiming};
use mcm_core::{errors::Result, Error, Size};
use mcm_devices::{adjust_problem_size, Platform};
use mcm_pricing::{BlackScholesCall, EuropeanCallKernel, OptionKernel, ReferencePricer};
use std::fmt;
use std::sync::Arc;

/// Default number of options per device before capability adjustment.
pub const DEFAULT_OPTIONS_PER_DEVICE: Size = 8192;
/// Default number of Monte Carlo paths per option.
pub const DEFAULT_PATH_COUNT: Size = 262_144;
/// Default seed for portfolio generation and the kernel.
pub const DEFAULT_SEED: u64 = 123;

/// How the total problem size follows the device count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scaling {
    /// Fixed total, split across devices.
    Strong,
    /// Per-device size held fixed; total grows with the device count.
    #[default]
    Weak,
}

impl Scaling {
    /// Case-insensitive parse; anything other than `strong` selects
    /// [`Scaling::Weak`].
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("strong") {
            Scaling::Strong
        } else {
            Scaling::Weak
        }
    }

    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Scaling::Strong => "strong",
            Scaling::Weak => "weak",
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Strategy for a single pass.
    pub method: Method,
    /// Problem scaling.
    pub scaling: Scaling,
    /// Run threaded then streamed, comparing after each.
    pub qa_test: bool,
    /// Option count per device before capability adjustment.
    pub options_per_device: Size,
    /// Paths per option.
    pub path_count: Size,
    /// Seed for the portfolio and the kernel.
    pub seed: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            method: Method::default(),
            scaling: Scaling::default(),
            qa_test: false,
            options_per_device: DEFAULT_OPTIONS_PER_DEVICE,
            path_count: DEFAULT_PATH_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

impl RunSettings {
    /// The passes to run, in order.
    pub fn methods(&self) -> Vec<Method> {
        if self.qa_test {
            vec![Method::Threaded, Method::Streamed]
        } else {
            vec![self.method]
        }
    }
}

/// Result of one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    /// Strategy used.
    pub method: Method,
    /// Timing reported by the strategy.
    pub timing: PassTiming,
    /// Comparison against the reference.
    pub comparison: Comparison,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Settings the run used.
    pub settings: RunSettings,
    /// Plans every pass ran.
    pub plans: PlanSet,
    /// Passes in execution order.
    pub passes: Vec<PassOutcome>,
}

impl RunReport {
    /// Total options priced per pass.
    pub fn total_options(&self) -> Size {
        self.plans.total_options()
    }

    /// Whether the last pass passed.
    pub fn passed(&self) -> bool {
        self.passes.last().is_some_and(|p| p.comparison.passed())
    }
}

/// Drives a run over a platform.
pub struct Orchestrator {
    platform: Platform,
    settings: RunSettings,
    kernel: Arc<dyn OptionKernel>,
    reference: Box<dyn ReferencePricer>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("platform", &self.platform)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Orchestrator using the Monte Carlo call kernel and the closed-form
    /// reference.
    pub fn new(platform: Platform, settings: RunSettings) -> Self {
        Self {
            kernel: Arc::new(EuropeanCallKernel::new(settings.seed)),
            reference: Box::new(BlackScholesCall),
            platform,
            settings,
        }
    }

    /// Replace the pricing kernel.
    pub fn with_kernel(mut self, kernel: Arc<dyn OptionKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    /// Replace the reference pricer.
    pub fn with_reference(mut self, reference: impl ReferencePricer + 'static) -> Self {
        self.reference = Box::new(reference);
        self
    }

    /// The platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The settings.
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Total options after capability adjustment and scaling.
    pub fn total_options(&self) -> Result<Size> {
        if self.platform.is_empty() {
            return Err(Error::NoDevices);
        }
        let per_device = adjust_problem_size(&self.platform, self.settings.options_per_device);
        let total = match self.settings.scaling {
            Scaling::Strong => per_device,
            Scaling::Weak => {
                let devices = self.platform.device_count();
                per_device.checked_mul(devices).ok_or_else(|| {
                    Error::Config(format!("options: {per_device} x {devices} devices overflows"))
                })?
            }
        };
        if total == 0 {
            return Err(Error::EmptyPortfolio);
        }
        Ok(total)
    }

    /// Run every configured pass.
    pub fn run(&self) -> Result<RunReport> {
        let total = self.total_options()?;
        let plans = build_plans(&self.platform, total, self.settings.path_count)?;
        let mut portfolio = Portfolio::generate(total, self.settings.seed);
        tracing::info!(
            devices = self.platform.device_count(),
            options = total,
            paths = self.settings.path_count,
            scaling = %self.settings.scaling,
            "portfolio generated"
        );

        let mut passes = Vec::new();
        for method in self.settings.methods() {
            portfolio.reset_results();
            let timing = method
                .strategy()
                .execute(&self.platform, &plans, &mut portfolio, &self.kernel)?;
            let comparison = compare(portfolio.options(), portfolio.results(), self.reference.as_ref())?;
            tracing::info!(
                method = %method,
                l1_norm = comparison.l1_norm,
                average_reserve = comparison.average_reserve,
                passed = comparison.passed(),
                "pass finished"
            );
            passes.push(PassOutcome {
                method,
                timing,
                comparison,
            });
        }

        Ok(RunReport {
            settings: self.settings,
            plans,
            passes,
        })
    }
}

//! Execution strategies: how a [`PlanSet`] is driven across devices.
//!
//! - [`Threaded`] runs one host thread per device, each timing its own span.
//! - [`Streamed`] drives every device queue from the calling thread and
//!   times the whole batch.
//!
//! Both fail fast: every device is still finished and torn down, then the
//! first device error in plan order is returned.

pub mod streamed;
pub mod threaded;

pub use streamed::Streamed;
pub use threaded::Threaded;

use crate::plan::PlanSet;
use crate::portfolio::Portfolio;
use mcm_core::{errors::Result, DeviceId, Error};
use mcm_devices::{Device, Platform};
use mcm_pricing::OptionKernel;
use std::fmt;
use std::sync::Arc;

/// Which strategy drives a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// One host thread per device.
    Threaded,
    /// One host thread multiplexing all device queues.
    #[default]
    Streamed,
}

impl Method {
    /// Case-insensitive parse; anything other than `threaded` selects
    /// [`Method::Streamed`].
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("threaded") {
            Method::Threaded
        } else {
            Method::Streamed
        }
    }

    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Threaded => "threaded",
            Method::Streamed => "streamed",
        }
    }

    /// The strategy implementing this method.
    pub fn strategy(self) -> Box<dyn ExecutionStrategy> {
        match self {
            Method::Threaded => Box::new(Threaded),
            Method::Streamed => Box::new(Streamed),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time spent by one device in a threaded pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceTiming {
    /// The device.
    pub device: DeviceId,
    /// Wall time from init to teardown-ready, in milliseconds.
    pub elapsed_ms: f64,
}

/// Timing of one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PassTiming {
    /// One entry per plan, in plan order.
    PerDevice(Vec<DeviceTiming>),
    /// One span covering every device.
    Batch {
        /// Elapsed milliseconds for all devices.
        elapsed_ms: f64,
    },
}

impl PassTiming {
    /// Time attributed to `device`: its own span for a threaded pass, the
    /// batch span otherwise.
    pub fn elapsed_ms(&self, device: DeviceId) -> Option<f64> {
        match self {
            PassTiming::PerDevice(timings) => timings
                .iter()
                .find(|t| t.device == device)
                .map(|t| t.elapsed_ms),
            PassTiming::Batch { elapsed_ms } => Some(*elapsed_ms),
        }
    }
}

/// Drives a full portfolio pass over every plan.
pub trait ExecutionStrategy: Send + Sync {
    /// Which method this is.
    fn method(&self) -> Method;

    /// Price every option of `portfolio` according to `plans`, writing each
    /// plan's results into its slice of the portfolio.
    fn execute(
        &self,
        platform: &Platform,
        plans: &PlanSet,
        portfolio: &mut Portfolio,
        kernel: &Arc<dyn OptionKernel>,
    ) -> Result<PassTiming>;
}

fn device_of(platform: &Platform, device: DeviceId) -> Result<&Device> {
    platform
        .device(device)
        .ok_or_else(|| Error::device(device, "no such device on this platform"))
}

/// First error in plan order, or every value.
fn first_error<T>(outcomes: Vec<Result<T>>) -> Result<Vec<T>> {
    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    if failed > 1 {
        tracing::warn!(failed, "several devices failed; reporting the first");
    }
    outcomes.into_iter().collect()
}

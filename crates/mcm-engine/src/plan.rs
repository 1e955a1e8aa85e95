//! Plan Builder: partitions a portfolio across devices.
//!
//! Every device receives `total / n` options; the first `total % n` devices,
//! in ordinal order, receive one more.  Ranges are laid out contiguously in
//! device order, so the same device count always yields the same plans.

use mcm_core::{ensure, errors::Result, DeviceId, Error, Size};
use mcm_devices::{adjust_grid_size, Platform};
use std::ops::Range;

/// The unit of work assigned to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Device the plan runs on.
    pub device: DeviceId,
    /// Index of the plan's first option in the portfolio.
    pub offset: Size,
    /// Number of options in the plan.
    pub option_count: Size,
    /// Paths simulated per option.
    pub path_count: Size,
    /// Options per kernel launch wave, clipped to device capability.
    pub grid_size: Size,
}

impl ExecutionPlan {
    /// The plan's index range into the portfolio.
    pub fn range(&self) -> Range<Size> {
        self.offset..self.offset + self.option_count
    }

    /// Whether the plan holds no options.
    pub fn is_empty(&self) -> bool {
        self.option_count == 0
    }
}

/// The plans of one run, in device order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSet {
    plans: Vec<ExecutionPlan>,
    total_options: Size,
}

impl PlanSet {
    /// Wrap plans after checking that they tile `0..total_options`.
    pub fn new(plans: Vec<ExecutionPlan>, total_options: Size) -> Result<Self> {
        let set = Self {
            plans,
            total_options,
        };
        set.validate()?;
        Ok(set)
    }

    /// Check that the plan ranges are contiguous, disjoint, start at zero,
    /// and cover exactly `total_options`.
    pub fn validate(&self) -> Result<()> {
        let mut next = 0;
        for plan in &self.plans {
            ensure!(
                plan.offset == next,
                "plan for device {} starts at {} instead of {next}",
                plan.device,
                plan.offset
            );
            next += plan.option_count;
        }
        ensure!(
            next == self.total_options,
            "plans cover {next} options out of {}",
            self.total_options
        );
        Ok(())
    }

    /// The plans in device order.
    pub fn plans(&self) -> &[ExecutionPlan] {
        &self.plans
    }

    /// Iterate over the plans.
    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionPlan> {
        self.plans.iter()
    }

    /// Number of plans.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether there are no plans.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Options covered by all plans.
    pub fn total_options(&self) -> Size {
        self.total_options
    }

    /// Option count of every plan, in device order.
    pub fn option_counts(&self) -> Vec<Size> {
        self.plans.iter().map(|p| p.option_count).collect()
    }
}

impl<'a> IntoIterator for &'a PlanSet {
    type Item = &'a ExecutionPlan;
    type IntoIter = std::slice::Iter<'a, ExecutionPlan>;

    fn into_iter(self) -> Self::IntoIter {
        self.plans.iter()
    }
}

/// Split `0..total_options` into `device_count` contiguous ranges.
pub fn partition(device_count: usize, total_options: Size) -> Result<Vec<Range<Size>>> {
    if device_count == 0 {
        return Err(Error::NoDevices);
    }
    let base = total_options / device_count;
    let remainder = total_options % device_count;

    let mut ranges = Vec::with_capacity(device_count);
    let mut offset = 0;
    for device in 0..device_count {
        let count = base + usize::from(device < remainder);
        ranges.push(offset..offset + count);
        offset += count;
    }
    Ok(ranges)
}

/// Build one plan per device of `platform`.
///
/// Each plan's grid size starts from its option count and is clipped to the
/// device's capability.
pub fn build_plans(platform: &Platform, total_options: Size, path_count: Size) -> Result<PlanSet> {
    let plans = partition(platform.device_count(), total_options)?
        .into_iter()
        .enumerate()
        .map(|(device, range)| {
            let option_count = range.len();
            ExecutionPlan {
                device,
                offset: range.start,
                option_count,
                path_count,
                grid_size: adjust_grid_size(platform, device, option_count),
            }
        })
        .collect::<Vec<_>>();

    for plan in &plans {
        tracing::debug!(
            device = plan.device,
            offset = plan.offset,
            options = plan.option_count,
            paths = plan.path_count,
            grid = plan.grid_size,
            "plan built"
        );
    }
    PlanSet::new(plans, total_options)
}

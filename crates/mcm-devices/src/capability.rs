//! Compute-unit based sizing.
//!
//! The compute-unit count of each device scales two defaults: the global
//! option count (weak devices must not be handed the full default problem)
//! and the grid width of each device's kernel launches.  An unknown
//! capability never fails the run; the unscaled default is kept.

use crate::device::Platform;
use mcm_core::DeviceId;

/// Devices with at most this many compute units count as small.
pub const SMALL_DEVICE_COMPUTE_UNITS: u32 = 32;

/// Grid-size ceiling per compute unit.
pub const GRID_SIZE_PER_COMPUTE_UNIT: usize = 40;

/// Clamp the global option count for small devices.
///
/// Scans devices in ordinal order; every device with at most
/// [`SMALL_DEVICE_COMPUTE_UNITS`] compute units lowers the count to at most
/// half its compute units.  The result never increases along the scan.
pub fn adjust_problem_size(platform: &Platform, default_count: usize) -> usize {
    let mut count = default_count;
    for device in platform.devices() {
        match device.compute_units() {
            Some(cu) if cu <= SMALL_DEVICE_COMPUTE_UNITS => {
                let cap = (cu / 2) as usize;
                if cap < count {
                    tracing::info!(
                        device = device.ordinal(),
                        compute_units = cu,
                        options = cap,
                        "small device, reducing problem size"
                    );
                    count = cap;
                }
            }
            Some(_) => {}
            None => tracing::warn!(
                device = device.ordinal(),
                "compute units unknown, problem size left unscaled"
            ),
        }
    }
    count
}

/// Clip a grid size to `compute_units * 40` of `device`.
pub fn adjust_grid_size(platform: &Platform, device: DeviceId, default_grid_size: usize) -> usize {
    match platform.compute_units(device) {
        Some(cu) => default_grid_size.min(cu as usize * GRID_SIZE_PER_COMPUTE_UNIT),
        None => default_grid_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn large_devices_keep_default() {
        let p = Platform::with_capabilities(&[Some(80), Some(64)]);
        assert_eq!(adjust_problem_size(&p, 8192), 8192);
    }

    #[test]
    fn small_device_halves_compute_units() {
        let p = Platform::with_capabilities(&[Some(80), Some(20)]);
        assert_eq!(adjust_problem_size(&p, 8192), 10);
    }

    #[test]
    fn most_restrictive_small_device_wins() {
        let p = Platform::with_capabilities(&[Some(12), Some(30), Some(32)]);
        assert_eq!(adjust_problem_size(&p, 8192), 6);
        let p = Platform::with_capabilities(&[Some(30), Some(12)]);
        assert_eq!(adjust_problem_size(&p, 8192), 6);
    }

    #[test]
    fn threshold_is_inclusive() {
        let p = Platform::with_capabilities(&[Some(32)]);
        assert_eq!(adjust_problem_size(&p, 8192), 16);
        let p = Platform::with_capabilities(&[Some(33)]);
        assert_eq!(adjust_problem_size(&p, 8192), 8192);
    }

    #[test]
    fn unknown_capability_is_skipped() {
        let p = Platform::with_capabilities(&[None, Some(8)]);
        assert_eq!(adjust_problem_size(&p, 8192), 4);
        assert_eq!(adjust_grid_size(&p, 0, 5000), 5000);
        assert_eq!(adjust_grid_size(&p, 9, 5000), 5000);
    }

    #[test]
    fn grid_size_clipped() {
        let p = Platform::with_capabilities(&[Some(10)]);
        assert_eq!(adjust_grid_size(&p, 0, 1000), 400);
        assert_eq!(adjust_grid_size(&p, 0, 400), 400);
        assert_eq!(adjust_grid_size(&p, 0, 17), 17);
    }

    proptest! {
        #[test]
        fn grid_size_ceiling(cu in 1u32..512, default in 0usize..100_000) {
            let p = Platform::with_capabilities(&[Some(cu)]);
            let grid = adjust_grid_size(&p, 0, default);
            let ceiling = cu as usize * GRID_SIZE_PER_COMPUTE_UNIT;
            prop_assert!(grid <= ceiling);
            if default <= ceiling {
                prop_assert_eq!(grid, default);
            }
        }

        #[test]
        fn problem_size_never_grows(
            cus in proptest::collection::vec(proptest::option::of(1u32..128), 0..8),
            default in 0usize..10_000,
        ) {
            let p = Platform::with_capabilities(&cus);
            prop_assert!(adjust_problem_size(&p, default) <= default);
        }
    }
}

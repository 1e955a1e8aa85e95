//! # mcm-devices
//!
//! The device layer the multi-device engine runs on.
//!
//! * [`Platform`] enumerates the accelerator devices of the host.
//! * [`capability`] derives problem and grid sizes from each device's
//!   compute-unit count.
//! * [`Queue`] is the execution context bound to one device: an in-order
//!   work queue whose submissions complete through [`Event`]s.
//! * [`DeviceBuffer`] is device-resident memory, released on drop.
//! * [`StopWatch`] is an explicit, per-run timer.
//!
//! Devices are host-backed: each queue is served by a dedicated worker
//! thread, which is what gives two devices real parallelism.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Compute-unit based sizing of problems and grids.
pub mod capability;

/// Devices and the platform that enumerates them.
pub mod device;

/// Device-resident memory.
pub mod memory;

/// Execution queues and completion events.
pub mod queue;

/// Wall-clock timers.
pub mod timer;

pub use capability::{
    adjust_grid_size, adjust_problem_size, GRID_SIZE_PER_COMPUTE_UNIT, SMALL_DEVICE_COMPUTE_UNITS,
};
pub use device::{Device, DeviceInfo, Platform, DEFAULT_HOST_COMPUTE_UNITS};
pub use memory::{BufferView, DeviceBuffer};
pub use queue::{Event, Queue};
pub use timer::StopWatch;

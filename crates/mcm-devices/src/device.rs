//! Devices and the platform that enumerates them.

use crate::memory::MemoryLedger;
use crate::queue::Queue;
use mcm_core::{errors::Result, DeviceId};
use std::sync::Arc;

/// Compute units reported by a host-backed device unless configured.
pub const DEFAULT_HOST_COMPUTE_UNITS: u32 = 64;

/// Static description of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Ordinal of the device on the platform.
    pub ordinal: DeviceId,
    /// Human-readable device name.
    pub name: String,
    /// Compute-unit count; `None` when the capability cannot be queried.
    pub compute_units: Option<u32>,
}

/// One accelerator device.
///
/// Cloning is cheap and clones share the device's memory accounting.
#[derive(Debug, Clone)]
pub struct Device {
    info: DeviceInfo,
    ledger: Arc<MemoryLedger>,
}

impl Device {
    /// Create a device from its description.
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            ledger: Arc::new(MemoryLedger::default()),
        }
    }

    /// Ordinal of the device.
    pub fn ordinal(&self) -> DeviceId {
        self.info.ordinal
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Compute-unit count, if known.
    pub fn compute_units(&self) -> Option<u32> {
        self.info.compute_units
    }

    /// Static description.
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Bytes currently allocated on the device.
    pub fn allocated_bytes(&self) -> usize {
        self.ledger.bytes()
    }

    /// Number of live allocations on the device.
    pub fn live_allocations(&self) -> usize {
        self.ledger.live()
    }

    /// Open a new execution context bound to this device.
    pub fn open_queue(&self) -> Result<Queue> {
        Queue::open(self.ordinal(), Arc::clone(&self.ledger))
    }
}

/// The set of devices available on the host.
#[derive(Debug, Clone, Default)]
pub struct Platform {
    devices: Vec<Device>,
}

impl Platform {
    /// Build a platform from device descriptions.
    ///
    /// Ordinals are reassigned to match each device's position.
    pub fn new(infos: Vec<DeviceInfo>) -> Self {
        let devices = infos
            .into_iter()
            .enumerate()
            .map(|(ordinal, info)| Device::new(DeviceInfo { ordinal, ..info }))
            .collect();
        Self { devices }
    }

    /// A platform of `count` host-backed devices with identical capability.
    pub fn host(count: usize, compute_units: u32) -> Self {
        Self::new(
            (0..count)
                .map(|ordinal| DeviceInfo {
                    ordinal,
                    name: format!("Host accelerator #{ordinal}"),
                    compute_units: Some(compute_units),
                })
                .collect(),
        )
    }

    /// A platform with one device per entry of `compute_units`.
    pub fn with_capabilities(compute_units: &[Option<u32>]) -> Self {
        Self::new(
            compute_units
                .iter()
                .enumerate()
                .map(|(ordinal, &cu)| DeviceInfo {
                    ordinal,
                    name: format!("Host accelerator #{ordinal}"),
                    compute_units: cu,
                })
                .collect(),
        )
    }

    /// Enumerate host-backed devices: `requested` of them, or one per
    /// available hardware thread.
    pub fn detect(requested: Option<usize>, compute_units: Option<u32>) -> Self {
        let count = requested.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let platform = Self::host(count, compute_units.unwrap_or(DEFAULT_HOST_COMPUTE_UNITS));
        tracing::debug!(devices = platform.device_count(), "platform enumerated");
        platform
    }

    /// Number of devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Whether the platform has no devices.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// All devices in ordinal order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// The device with the given ordinal.
    pub fn device(&self, ordinal: DeviceId) -> Option<&Device> {
        self.devices.get(ordinal)
    }

    /// Capability probe: compute-unit count of a device.
    ///
    /// `None` when the device does not exist or does not report it.
    pub fn compute_units(&self, ordinal: DeviceId) -> Option<u32> {
        self.device(ordinal).and_then(Device::compute_units)
    }

    /// Bytes allocated across all devices.
    pub fn allocated_bytes(&self) -> usize {
        self.devices.iter().map(Device::allocated_bytes).sum()
    }
}

//! Device Driver: the init → simulate → teardown sequence of one plan.
//!
//! Each step consumes the previous state, so a plan is launched at most once
//! and its results are delivered at most once:
//!
//! ```text
//! DeviceSession --launch--> LaunchedSession --wait--> SimulatedSession --complete--> (torn down)
//! ```
//!
//! The device allocations are [`DeviceBuffer`]s owned by whichever state is
//! current.  Dropping that state, on success or on any error path, is the
//! teardown.
//!
//! ```compile_fail
//! # use mcm_engine::DeviceSession;
//! fn twice(session: DeviceSession<'_>) {
//!     let _first = session.simulate();
//!     let _second = session.simulate();
//! }
//! ```

use crate::plan::ExecutionPlan;
use mcm_core::{errors::Result, DeviceId, Error};
use mcm_devices::{DeviceBuffer, Event, Queue};
use mcm_pricing::{OptionData, OptionKernel, OptionValue};
use std::sync::Arc;

/// Buffers of one plan; dropping them releases the device memory.
struct Resident {
    device: DeviceId,
    options: DeviceBuffer<OptionData>,
    values: DeviceBuffer<OptionValue>,
}

impl Drop for Resident {
    fn drop(&mut self) {
        tracing::debug!(
            device = self.device,
            bytes = self.options.bytes() + self.values.bytes(),
            "device torn down"
        );
    }
}

/// Initialised device state of one plan, ready to launch.
pub struct DeviceSession<'a> {
    plan: &'a ExecutionPlan,
    queue: &'a Queue,
    kernel: Arc<dyn OptionKernel>,
    resident: Resident,
}

impl std::fmt::Debug for DeviceSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("plan", self.plan)
            .field("queue", self.queue)
            .finish()
    }
}

impl<'a> DeviceSession<'a> {
    /// Upload the plan's options and allocate its result buffer, then wait
    /// for the upload to land.
    pub fn init(
        plan: &'a ExecutionPlan,
        options: &[OptionData],
        queue: &'a Queue,
        kernel: Arc<dyn OptionKernel>,
    ) -> Result<Self> {
        if options.len() != plan.option_count {
            return Err(Error::device(
                plan.device,
                format!(
                    "plan expects {} options, got {}",
                    plan.option_count,
                    options.len()
                ),
            ));
        }
        if queue.device() != plan.device {
            return Err(Error::device(
                plan.device,
                format!("queue is bound to device {}", queue.device()),
            ));
        }

        let (options, uploaded) = queue.upload(options)?;
        let values = queue.alloc(plan.option_count, OptionValue::UNSET);
        let resident = Resident {
            device: plan.device,
            options,
            values,
        };
        uploaded.wait()?;
        tracing::debug!(
            device = plan.device,
            options = plan.option_count,
            bytes = resident.options.bytes() + resident.values.bytes(),
            "device initialised"
        );
        Ok(Self {
            plan,
            queue,
            kernel,
            resident,
        })
    }

    /// The plan this session runs.
    pub fn plan(&self) -> &'a ExecutionPlan {
        self.plan
    }

    /// Enqueue the kernel over every option of the plan without blocking.
    ///
    /// Options run in waves of `grid_size`.  The launched session's event
    /// completes once all waves finished and the result buffer was copied
    /// back; it fails with the first kernel error.
    pub fn launch(self) -> Result<LaunchedSession<'a>> {
        let kernel = Arc::clone(&self.kernel);
        let options = self.resident.options.view();
        let values = self.resident.values.view();
        let device = self.plan.device;
        let offset = self.plan.offset;
        let paths = self.plan.path_count;
        let grid = self.plan.grid_size.max(1);

        let event = self.queue.submit(move || {
            let computed = options.read(|opts| -> Result<Vec<OptionValue>> {
                let mut out = Vec::with_capacity(opts.len());
                for (wave, chunk) in opts.chunks(grid).enumerate() {
                    let first = wave * grid;
                    for (i, option) in chunk.iter().enumerate() {
                        let index = offset + first + i;
                        let value = kernel.simulate(option, paths, index).map_err(|e| {
                            Error::device(device, format!("option {index}: {e}"))
                        })?;
                        out.push(value);
                    }
                    tracing::trace!(device, wave, options = chunk.len(), "wave finished");
                }
                Ok(out)
            })??;
            values.write(|dst| dst.copy_from_slice(&computed))?;
            values.read(|src| src.to_vec())
        })?;
        Ok(LaunchedSession {
            plan: self.plan,
            resident: self.resident,
            event,
        })
    }

    /// Run the kernel and block until the plan's results are available.
    pub fn simulate(self) -> Result<SimulatedSession<'a>> {
        self.launch()?.wait()
    }
}

/// A plan whose kernel is in flight.
#[must_use = "a launched session must be waited on"]
pub struct LaunchedSession<'a> {
    plan: &'a ExecutionPlan,
    resident: Resident,
    event: Event<Vec<OptionValue>>,
}

impl std::fmt::Debug for LaunchedSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchedSession")
            .field("plan", self.plan)
            .field("event", &self.event)
            .finish()
    }
}

impl<'a> LaunchedSession<'a> {
    /// The plan in flight.
    pub fn plan(&self) -> &'a ExecutionPlan {
        self.plan
    }

    /// Non-blocking completion check.
    pub fn poll(&mut self) -> bool {
        self.event.poll()
    }

    /// Block until the kernel finished.  On failure the session is torn
    /// down before the error is returned.
    pub fn wait(self) -> Result<SimulatedSession<'a>> {
        let Self {
            plan,
            resident,
            event,
        } = self;
        let values = event.wait()?;
        Ok(SimulatedSession {
            plan,
            resident,
            values,
        })
    }
}

/// A plan whose results are back on the host but not yet delivered.
pub struct SimulatedSession<'a> {
    plan: &'a ExecutionPlan,
    resident: Resident,
    values: Vec<OptionValue>,
}

impl std::fmt::Debug for SimulatedSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedSession")
            .field("plan", self.plan)
            .field("values", &self.values.len())
            .finish()
    }
}

impl<'a> SimulatedSession<'a> {
    /// The finished plan.
    pub fn plan(&self) -> &'a ExecutionPlan {
        self.plan
    }

    /// Copy the results into the plan's slots of the portfolio, then tear
    /// the session down.
    pub fn complete(self, out: &mut [OptionValue]) -> Result<()> {
        let Self {
            plan,
            resident,
            values,
        } = self;
        if values.len() != out.len() || out.len() != plan.option_count {
            return Err(Error::device(
                plan.device,
                format!(
                    "result size mismatch: {} values for {} slots",
                    values.len(),
                    out.len()
                ),
            ));
        }
        out.copy_from_slice(&values);
        drop(resident);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcm_core::Size;
    use mcm_devices::Platform;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    struct IndexKernel;

    impl OptionKernel for IndexKernel {
        fn simulate(&self, _: &OptionData, paths: Size, index: Size) -> Result<OptionValue> {
            Ok(OptionValue::new(index as f64, paths as f64))
        }
    }

    struct GatedKernel(Mutex<mpsc::Receiver<()>>);

    impl OptionKernel for GatedKernel {
        fn simulate(&self, _: &OptionData, _: Size, index: Size) -> Result<OptionValue> {
            self.0
                .lock()
                .map_err(|_| Error::Runtime("gate poisoned".into()))?
                .recv_timeout(Duration::from_secs(10))
                .map_err(|e| Error::Runtime(e.to_string()))?;
            Ok(OptionValue::new(index as f64, 0.0))
        }
    }

    struct FailingKernel;

    impl OptionKernel for FailingKernel {
        fn simulate(&self, _: &OptionData, _: Size, index: Size) -> Result<OptionValue> {
            if index == 3 {
                mcm_core::fail!("diverged");
            }
            Ok(OptionValue::new(1.0, 1.0))
        }
    }

    fn plan(device: usize, offset: usize, count: usize, grid: usize) -> ExecutionPlan {
        ExecutionPlan {
            device,
            offset,
            option_count: count,
            path_count: 64,
            grid_size: grid,
        }
    }

    fn options(n: usize) -> Vec<OptionData> {
        vec![OptionData::new(30.0, 20.0, 1.0, 0.06, 0.10); n]
    }

    #[test]
    fn runs_all_waves_with_global_indices() {
        let platform = Platform::host(1, 64);
        let queue = platform.devices()[0].open_queue().unwrap();
        let plan = plan(0, 100, 7, 3);
        let session = DeviceSession::init(&plan, &options(7), &queue, Arc::new(IndexKernel)).unwrap();
        let mut out = vec![OptionValue::UNSET; 7];
        session.simulate().unwrap().complete(&mut out).unwrap();
        let indices: Vec<f64> = out.iter().map(|v| v.expected).collect();
        assert_eq!(indices, vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 106.0]);
        assert!(out.iter().all(|v| v.confidence == 64.0));
        assert_eq!(platform.allocated_bytes(), 0);
    }

    #[test]
    fn launch_stays_pending_while_the_kernel_runs() {
        let platform = Platform::host(1, 64);
        let device = &platform.devices()[0];
        let queue = device.open_queue().unwrap();
        let (release, gate) = mpsc::channel();
        let plan = plan(0, 0, 2, 2);
        let session = DeviceSession::init(
            &plan,
            &options(2),
            &queue,
            Arc::new(GatedKernel(Mutex::new(gate))),
        )
        .unwrap();
        let mut launched = session.launch().unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert!(!launched.poll());
        assert_eq!(device.live_allocations(), 2);

        release.send(()).unwrap();
        release.send(()).unwrap();
        let simulated = launched.wait().unwrap();
        assert_eq!(device.live_allocations(), 2);
        let mut out = vec![OptionValue::UNSET; 2];
        simulated.complete(&mut out).unwrap();
        assert_eq!(out.iter().map(|v| v.expected).collect::<Vec<_>>(), vec![0.0, 1.0]);
        assert_eq!(device.live_allocations(), 0);
    }

    #[test]
    fn failure_still_releases_memory() {
        let platform = Platform::host(1, 64);
        let device = &platform.devices()[0];
        {
            let queue = device.open_queue().unwrap();
            let plan = plan(0, 0, 5, 2);
            let session = DeviceSession::init(&plan, &options(5), &queue, Arc::new(FailingKernel)).unwrap();
            assert!(device.allocated_bytes() > 0);
            match session.simulate() {
                Err(Error::Device { device: 0, message }) => assert!(message.contains("option 3")),
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(device.live_allocations(), 0);
        }
        assert_eq!(device.allocated_bytes(), 0);
    }

    #[test]
    fn size_mismatch_on_complete_still_releases_memory() {
        let platform = Platform::host(1, 64);
        let queue = platform.devices()[0].open_queue().unwrap();
        let plan = plan(0, 0, 3, 3);
        let session = DeviceSession::init(&plan, &options(3), &queue, Arc::new(IndexKernel)).unwrap();
        let mut short = vec![OptionValue::UNSET; 2];
        let err = session.simulate().unwrap().complete(&mut short).unwrap_err();
        assert!(matches!(err, Error::Device { device: 0, .. }), "{err:?}");
        assert!(short.iter().all(|v| !v.is_set()));
        assert_eq!(platform.allocated_bytes(), 0);
    }

    #[test]
    fn init_checks_plan_shape() {
        let platform = Platform::host(2, 64);
        let queue = platform.devices()[1].open_queue().unwrap();
        let wrong_device = plan(0, 0, 2, 2);
        assert!(DeviceSession::init(&wrong_device, &options(2), &queue, Arc::new(IndexKernel)).is_err());
        let right = plan(1, 0, 2, 2);
        assert!(DeviceSession::init(&right, &options(3), &queue, Arc::new(IndexKernel)).is_err());
        assert_eq!(platform.allocated_bytes(), 0);
    }

    #[test]
    fn empty_plan_is_fine() {
        let platform = Platform::host(1, 64);
        let queue = platform.devices()[0].open_queue().unwrap();
        let plan = plan(0, 0, 0, 0);
        let session = DeviceSession::init(&plan, &[], &queue, Arc::new(IndexKernel)).unwrap();
        session.simulate().unwrap().complete(&mut []).unwrap();
    }
}

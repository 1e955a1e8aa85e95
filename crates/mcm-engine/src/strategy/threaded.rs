//! One host thread per device.

use super::{device_of, first_error, DeviceTiming, ExecutionStrategy, Method, PassTiming};
use crate::driver::DeviceSession;
use crate::plan::PlanSet;
use crate::portfolio::{PlanView, Portfolio};
use mcm_core::{errors::Result, Error};
use mcm_devices::{Device, Platform, StopWatch};
use mcm_pricing::OptionKernel;
use std::sync::Arc;
use std::thread;

/// Spawns a scoped thread per plan; each thread owns its device queue and
/// its plan's result slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct Threaded;

impl ExecutionStrategy for Threaded {
    fn method(&self) -> Method {
        Method::Threaded
    }

    fn execute(
        &self,
        platform: &Platform,
        plans: &PlanSet,
        portfolio: &mut Portfolio,
        kernel: &Arc<dyn OptionKernel>,
    ) -> Result<PassTiming> {
        let views = portfolio.split_results(plans)?;
        tracing::info!(devices = views.len(), "threaded pass starting");

        let outcomes = thread::scope(|scope| {
            let handles: Vec<_> = views
                .into_iter()
                .map(|view| {
                    let device = view.plan.device;
                    let kernel = Arc::clone(kernel);
                    let spawned = device_of(platform, device).and_then(|dev| {
                        thread::Builder::new()
                            .name(format!("mcm-device-{device}"))
                            .spawn_scoped(scope, move || run_device(dev, view, kernel))
                            .map_err(|e| Error::device(device, format!("cannot spawn thread: {e}")))
                    });
                    (device, spawned)
                })
                .collect();

            handles
                .into_iter()
                .map(|(device, spawned)| {
                    spawned?
                        .join()
                        .map_err(|_| Error::device(device, "device thread panicked"))?
                })
                .collect::<Vec<_>>()
        });

        let timings = first_error(outcomes)?;
        Ok(PassTiming::PerDevice(timings))
    }
}

fn run_device(device: &Device, view: PlanView<'_>, kernel: Arc<dyn OptionKernel>) -> Result<DeviceTiming> {
    let plan = view.plan;
    let queue = device.open_queue()?;
    let mut timer = StopWatch::started();

    let session = DeviceSession::init(plan, view.options, &queue, kernel)?;
    let simulated = session.simulate();
    timer.stop();
    simulated?.complete(view.results)?;

    tracing::info!(
        device = plan.device,
        offset = plan.offset,
        options = plan.option_count,
        paths = plan.path_count,
        elapsed_ms = timer.elapsed_ms(),
        "device finished"
    );
    Ok(DeviceTiming {
        device: plan.device,
        elapsed_ms: timer.elapsed_ms(),
    })
}

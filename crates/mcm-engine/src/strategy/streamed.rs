//! All device queues driven from the calling thread.

use super::{device_of, first_error, ExecutionStrategy, Method, PassTiming};
use crate::driver::{DeviceSession, LaunchedSession};
use crate::plan::PlanSet;
use crate::portfolio::Portfolio;
use mcm_core::errors::Result;
use mcm_devices::{Platform, Queue, StopWatch};
use mcm_pricing::OptionKernel;
use std::sync::Arc;

/// Initialises every device in plan order, launches all of them without
/// blocking, then waits for the whole batch under one timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Streamed;

impl ExecutionStrategy for Streamed {
    fn method(&self) -> Method {
        Method::Streamed
    }

    fn execute(
        &self,
        platform: &Platform,
        plans: &PlanSet,
        portfolio: &mut Portfolio,
        kernel: &Arc<dyn OptionKernel>,
    ) -> Result<PassTiming> {
        let views = portfolio.split_results(plans)?;
        tracing::info!(devices = views.len(), "streamed pass starting");

        let queues = views
            .iter()
            .map(|view| device_of(platform, view.plan.device)?.open_queue())
            .collect::<Result<Vec<Queue>>>()?;

        // init waits per device; a failure drops the sessions already built
        let mut sessions = Vec::with_capacity(views.len());
        for (view, queue) in views.iter().zip(&queues) {
            sessions.push(DeviceSession::init(
                view.plan,
                view.options,
                queue,
                Arc::clone(kernel),
            )?);
        }

        let mut timer = StopWatch::started();
        let launched: Vec<_> = sessions.into_iter().map(DeviceSession::launch).collect();
        let finished: Vec<_> = launched
            .into_iter()
            .map(|session| session.and_then(LaunchedSession::wait))
            .collect();
        timer.stop();

        let outcomes: Vec<_> = finished
            .into_iter()
            .zip(views)
            .map(|(session, view)| session.and_then(|s| s.complete(view.results)))
            .collect();
        first_error(outcomes)?;

        tracing::info!(
            devices = plans.len(),
            options = plans.total_options(),
            elapsed_ms = timer.elapsed_ms(),
            "batch finished"
        );
        Ok(PassTiming::Batch {
            elapsed_ms: timer.elapsed_ms(),
        })
    }
}

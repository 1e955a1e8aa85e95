//! End-to-end tests for the execution strategies.
//!
//! These exercise plan building, both strategies, the device driver and the
//! aggregator together on host-backed platforms.

use mcm_core::{Error, Result, Size};
use mcm_devices::Platform;
use mcm_engine::{
    build_plans, compare, ExecutionStrategy, Method, Orchestrator, PassTiming, Portfolio,
    RunSettings, Scaling, Streamed, Threaded,
};
use mcm_pricing::{EuropeanCallKernel, OptionData, OptionKernel, OptionValue};
use std::sync::Arc;

/// Returns 4.0 for even global indices and 6.0 for odd ones.
struct AlternatingKernel;

impl OptionKernel for AlternatingKernel {
    fn simulate(&self, _: &OptionData, _: Size, index: Size) -> Result<OptionValue> {
        let expected = if index % 2 == 0 { 4.0 } else { 6.0 };
        Ok(OptionValue::new(expected, 0.5))
    }
}

/// Returns 4.0 for the first four global indices and 6.0 for the rest.
struct SplitKernel;

impl OptionKernel for SplitKernel {
    fn simulate(&self, _: &OptionData, _: Size, index: Size) -> Result<OptionValue> {
        let expected = if index < 4 { 4.0 } else { 6.0 };
        Ok(OptionValue::new(expected, 0.5))
    }
}

/// Fails every option of one device.
struct BrokenDevice {
    range: std::ops::Range<Size>,
}

impl OptionKernel for BrokenDevice {
    fn simulate(&self, option: &OptionData, _: Size, index: Size) -> Result<OptionValue> {
        if self.range.contains(&index) {
            mcm_core::fail!("device memory fault");
        }
        Ok(OptionValue::new(option.s, 0.1))
    }
}

fn run_pass(
    strategy: &dyn ExecutionStrategy,
    platform: &Platform,
    total: usize,
    kernel: Arc<dyn OptionKernel>,
) -> Result<(Portfolio, PassTiming)> {
    let plans = build_plans(platform, total, 32)?;
    let mut portfolio = Portfolio::generate(total, 123);
    let timing = strategy.execute(platform, &plans, &mut portfolio, &kernel)?;
    Ok((portfolio, timing))
}

// ───────────────────────── scenario ─────────────────────────

#[test]
fn test_exact_matches_fail_validation() {
    // 2 devices, 8 options; device 0 reports 4.0 and device 1 reports 6.0,
    // each equal to the reference of its options
    let platform = Platform::host(2, 64);
    let reference = |o: &OptionData| if o.s < 4.0 { 4.0 } else { 6.0 };
    let options: Vec<OptionData> = (0..8)
        .map(|i| OptionData::new(i as f64, 20.0, 1.0, 0.06, 0.10))
        .collect();
    let mut portfolio = Portfolio::new(options);
    let plans = build_plans(&platform, 8, 16).unwrap();
    assert_eq!(plans.option_counts(), vec![4, 4]);

    let kernel: Arc<dyn OptionKernel> = Arc::new(SplitKernel);
    for method in [Method::Threaded, Method::Streamed] {
        portfolio.reset_results();
        method
            .strategy()
            .execute(&platform, &plans, &mut portfolio, &kernel)
            .unwrap();
        let expected: Vec<f64> = portfolio.results().iter().map(|v| v.expected).collect();
        assert_eq!(expected, vec![4.0, 4.0, 4.0, 4.0, 6.0, 6.0, 6.0, 6.0]);
        let c = compare(portfolio.options(), portfolio.results(), &reference).unwrap();
        assert_eq!(c.l1_norm, 0.0);
        assert_eq!(c.average_reserve, 0.0);
        assert!(!c.passed());
    }
}

// ───────────────────────── equivalence ─────────────────────────

#[test]
fn test_threaded_and_streamed_agree_with_mock_kernel() {
    let platform = Platform::host(3, 64);
    let kernel: Arc<dyn OptionKernel> = Arc::new(AlternatingKernel);
    let (threaded, t1) = run_pass(&Threaded, &platform, 100, Arc::clone(&kernel)).unwrap();
    let (streamed, t2) = run_pass(&Streamed, &platform, 100, kernel).unwrap();
    assert_eq!(threaded.results(), streamed.results());
    assert!(matches!(t1, PassTiming::PerDevice(ref t) if t.len() == 3));
    assert!(matches!(t2, PassTiming::Batch { .. }));
}

#[test]
fn test_threaded_and_streamed_agree_with_monte_carlo_kernel() {
    let platform = Platform::with_capabilities(&[Some(64), None, Some(1)]);
    let kernel: Arc<dyn OptionKernel> = Arc::new(EuropeanCallKernel::new(7));
    let (threaded, _) = run_pass(&Threaded, &platform, 40, Arc::clone(&kernel)).unwrap();
    let (streamed, _) = run_pass(&Streamed, &platform, 40, kernel).unwrap();
    assert_eq!(threaded.unset_count(), 0);
    assert_eq!(threaded.results(), streamed.results());
}

#[test]
fn test_results_do_not_depend_on_device_count() {
    let kernel: Arc<dyn OptionKernel> = Arc::new(EuropeanCallKernel::new(11));
    let (one, _) = run_pass(&Streamed, &Platform::host(1, 64), 30, Arc::clone(&kernel)).unwrap();
    let (four, _) = run_pass(&Threaded, &Platform::host(4, 64), 30, kernel).unwrap();
    assert_eq!(one.results(), four.results());
}

// ───────────────────────── failure policy ─────────────────────────

#[test]
fn test_failing_device_aborts_and_releases_memory() {
    let platform = Platform::host(3, 64);
    // plans are [4, 3, 3]; device 1 owns 4..7
    let kernel: Arc<dyn OptionKernel> = Arc::new(BrokenDevice { range: 4..7 });
    for strategy in [&Threaded as &dyn ExecutionStrategy, &Streamed] {
        let err = run_pass(strategy, &platform, 10, Arc::clone(&kernel)).unwrap_err();
        match err {
            Error::Device { device, message } => {
                assert_eq!(device, 1);
                assert!(message.contains("device memory fault"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(platform.allocated_bytes(), 0);
        for device in platform.devices() {
            assert_eq!(device.live_allocations(), 0);
        }
    }
}

#[test]
fn test_orchestrator_propagates_device_errors() {
    let settings = RunSettings {
        options_per_device: 6,
        path_count: 16,
        ..RunSettings::default()
    };
    let orchestrator = Orchestrator::new(Platform::host(2, 64), settings)
        .with_kernel(Arc::new(BrokenDevice { range: 0..1 }));
    assert!(matches!(orchestrator.run(), Err(Error::Device { device: 0, .. })));
}

// ───────────────────────── orchestration ─────────────────────────

#[test]
fn test_qa_run_reports_both_passes() {
    let settings = RunSettings {
        qa_test: true,
        scaling: Scaling::Strong,
        options_per_device: 24,
        path_count: 20_000,
        ..RunSettings::default()
    };
    let report = Orchestrator::new(Platform::host(2, 64), settings).run().unwrap();
    assert_eq!(report.total_options(), 24);
    let methods: Vec<Method> = report.passes.iter().map(|p| p.method).collect();
    assert_eq!(methods, vec![Method::Threaded, Method::Streamed]);
    // both passes price identically, so they compare identically
    assert_eq!(report.passes[0].comparison, report.passes[1].comparison);
    for pass in &report.passes {
        assert_eq!(pass.comparison.unset, 0);
        assert!(pass.comparison.l1_norm < 0.05, "{:?}", pass.comparison);
    }
    assert_eq!(report.passed(), report.passes[1].comparison.passed());
}

#[test]
fn test_monte_carlo_beats_the_reserve_threshold() {
    let settings = RunSettings {
        options_per_device: 32,
        path_count: 50_000,
        ..RunSettings::default()
    };
    let report = Orchestrator::new(Platform::host(2, 64), settings).run().unwrap();
    assert_eq!(report.total_options(), 64);
    let c = report.passes[0].comparison;
    assert!(c.passed(), "{c:?}");
    assert!(report.passed());
}

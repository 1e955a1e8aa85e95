use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mcm_devices::Platform;
use mcm_engine::{build_plans, Method, Portfolio};
use mcm_pricing::{EuropeanCallKernel, OptionKernel};
use std::hint::black_box;
use std::sync::Arc;

const OPTIONS: usize = 256;
const PATHS: usize = 4096;

fn bench_strategies(c: &mut Criterion) {
    let kernel: Arc<dyn OptionKernel> = Arc::new(EuropeanCallKernel::new(123));
    let mut group = c.benchmark_group("portfolio_256x4096");
    group.sample_size(10);

    for devices in [1_usize, 2, 4] {
        let platform = Platform::host(devices, 64);
        let plans = build_plans(&platform, OPTIONS, PATHS).expect("plans should build");
        for method in [Method::Threaded, Method::Streamed] {
            let strategy = method.strategy();
            group.bench_with_input(
                BenchmarkId::new(method.as_str(), devices),
                &devices,
                |b, _| {
                    let mut portfolio = Portfolio::generate(OPTIONS, 123);
                    b.iter(|| {
                        portfolio.reset_results();
                        let timing = strategy
                            .execute(&platform, &plans, &mut portfolio, &kernel)
                            .expect("pass should succeed");
                        black_box(timing)
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);

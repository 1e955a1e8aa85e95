//! Human-readable run report written to stdout.

use mcm_core::Size;
use mcm_devices::Platform;
use mcm_engine::{Comparison, PassOutcome, PassTiming, PlanSet, RunReport, RunSettings};
use std::io::{self, Write};

/// Header describing the run about to start.
pub fn write_banner<W: Write>(
    out: &mut W,
    settings: &RunSettings,
    platform: &Platform,
    total_options: Size,
) -> io::Result<()> {
    writeln!(out, "MonteCarloMultiGPU")?;
    writeln!(out, "==================")?;
    writeln!(out, "Parallelization method  = {}", settings.method)?;
    if settings.qa_test {
        writeln!(out, "QA test                 = threaded, streamed")?;
    }
    writeln!(out, "Problem scaling         = {}", settings.scaling)?;
    writeln!(out, "Number of devices       = {}", platform.device_count())?;
    writeln!(out, "Total number of options = {total_options}")?;
    writeln!(out, "Number of paths         = {}", settings.path_count)?;
    Ok(())
}

/// Per-pass statistics and the closing summary.
pub fn write_report<W: Write>(out: &mut W, report: &RunReport, platform: &Platform) -> io::Result<()> {
    for pass in &report.passes {
        write_pass(out, pass, &report.plans, platform)?;
    }
    if let Some(last) = report.passes.last() {
        writeln!(out)?;
        writeln!(out, "Test Summary...")?;
        writeln!(out, "L1 norm        : {:E}", last.comparison.l1_norm)?;
        writeln!(out, "Average reserve: {:.6}", last.comparison.average_reserve)?;
        writeln!(out, "{}", verdict(&last.comparison))?;
    }
    Ok(())
}

/// The closing line for a comparison.
pub fn verdict(comparison: &Comparison) -> &'static str {
    if comparison.passed() {
        "Test passed"
    } else {
        "Test failed!"
    }
}

fn write_pass<W: Write>(out: &mut W, pass: &PassOutcome, plans: &PlanSet, platform: &Platform) -> io::Result<()> {
    let total = plans.total_options();
    writeln!(out)?;
    writeln!(out, "Device statistics, {}", pass.method)?;
    for plan in plans {
        let name = platform.device(plan.device).map_or("unknown", |d| d.name());
        writeln!(out, "Device #{}: {name}", plan.device)?;
        writeln!(out, "Options         : {}", plan.option_count)?;
        writeln!(out, "Simulation paths: {}", plan.path_count)?;
        if let PassTiming::PerDevice(_) = pass.timing {
            if let Some(ms) = pass.timing.elapsed_ms(plan.device) {
                writeln!(out, "Total time (ms.): {ms:.6}")?;
                writeln!(out, "Options per sec.: {:.6}", options_per_second(total, ms))?;
            }
        }
    }
    if let PassTiming::Batch { elapsed_ms } = pass.timing {
        writeln!(out)?;
        writeln!(out, "Total time (ms.): {elapsed_ms:.6}")?;
        writeln!(out, "\tNote: This is elapsed time for all to compute.")?;
        writeln!(out, "Options per sec.: {:.6}", options_per_second(total, elapsed_ms))?;
    }
    writeln!(out, "L1 norm: {:E}", pass.comparison.l1_norm)?;
    writeln!(out, "Average reserve: {:.6}", pass.comparison.average_reserve)?;
    Ok(())
}

fn options_per_second(options: Size, elapsed_ms: f64) -> f64 {
    options as f64 / (elapsed_ms * 0.001)
}

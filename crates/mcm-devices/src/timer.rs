//! Wall-clock timers.
//!
//! A [`StopWatch`] accumulates elapsed time across start/stop pairs until it
//! is reset.  Timers are plain values owned by whoever measures: one per
//! device for the threaded strategy, one for the whole batch when streamed.

use std::time::{Duration, Instant};

/// An accumulating stopwatch.
#[derive(Debug, Clone, Default)]
pub struct StopWatch {
    started: Option<Instant>,
    accumulated: Duration,
}

impl StopWatch {
    /// Create a stopped, zeroed stopwatch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopwatch that is already running.
    pub fn started() -> Self {
        let mut watch = Self::new();
        watch.start();
        watch
    }

    /// Start (or keep) running.
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stop and fold the running span into the accumulated time.
    pub fn stop(&mut self) {
        if let Some(t0) = self.started.take() {
            self.accumulated += t0.elapsed();
        }
    }

    /// Zero the accumulated time and stop.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the stopwatch is running.
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Total elapsed time, including the running span.
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.started.map(|t0| t0.elapsed()).unwrap_or_default()
    }

    /// Total elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1_000.0
    }
}

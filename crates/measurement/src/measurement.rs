//! Per-operation latency windows
//!
//! Every sample lands in two histograms: the current window, swapped out on
//! each periodic report, and the summary window, kept for the whole phase.
//! Failed operations are recorded under `<op>_ERR`.

use crate::histogram::{Histogram, LatencySummary};
use hdrhistogram::CreationError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Prefix used for periodic reports
pub const CURRENT_PREFIX: &str = "[Current] ";
/// Prefix used for the final report
pub const SUMMARY_PREFIX: &str = "[Summary] ";

#[derive(Default)]
struct Windows {
    current: BTreeMap<String, Histogram>,
    summary: BTreeMap<String, Histogram>,
}

/// Thread-safe collection of latency histograms keyed by operation
pub struct Measurement {
    template: Histogram,
    warm_up: AtomicBool,
    windows: Mutex<Windows>,
}

impl Measurement {
    /// Measurement clamping latencies at `max_latency`
    pub fn new(max_latency: Duration) -> Result<Self, CreationError> {
        Ok(Self {
            template: Histogram::new(max_latency)?,
            warm_up: AtomicBool::new(false),
            windows: Mutex::new(Windows::default()),
        })
    }

    /// While warming up, samples are dropped
    pub fn set_warm_up(&self, warm_up: bool) {
        debug!(target: "tpcc::measurement", warm_up, "Warm-up toggled");
        self.warm_up.store(warm_up, Ordering::Release);
    }

    /// Check if samples are currently dropped
    pub fn is_warm_up(&self) -> bool {
        self.warm_up.load(Ordering::Acquire)
    }

    /// Record one operation
    pub fn measure(&self, op: &str, latency: Duration, failed: bool) {
        if self.is_warm_up() {
            return;
        }
        let name = if failed {
            format!("{}_ERR", op)
        } else {
            op.to_string()
        };
        let template = &self.template;
        let mut windows = self.windows.lock();
        windows
            .current
            .entry(name.clone())
            .or_insert_with(|| template.empty_like())
            .record(latency);
        windows
            .summary
            .entry(name)
            .or_insert_with(|| template.empty_like())
            .record(latency);
    }

    /// Hand out the current window and start a new one
    pub fn take_current(&self) -> BTreeMap<String, Histogram> {
        std::mem::take(&mut self.windows.lock().current)
    }

    /// Copy of the summary window
    pub fn summary(&self) -> BTreeMap<String, Histogram> {
        self.windows.lock().summary.clone()
    }

    /// Summary statistics for one operation
    pub fn summary_info(&self, op: &str) -> Option<LatencySummary> {
        self.windows.lock().summary.get(op).map(Histogram::info)
    }

    /// Pass either the current window (swapping it out) or the summary window
    /// to `emit`, together with the matching report prefix
    pub fn output<F>(&self, final_summary: bool, mut emit: F)
    where
        F: FnMut(&str, &BTreeMap<String, Histogram>),
    {
        if final_summary {
            emit(SUMMARY_PREFIX, &self.summary());
        } else {
            emit(CURRENT_PREFIX, &self.take_current());
        }
    }
}

//! Report sinks
//!
//! The engine hands every report line to a `Reporter` instead of printing or
//! touching global gauges, so callers decide where results go.

use crate::histogram::LatencySummary;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Receives latency, wait-time and throughput reports
pub trait Reporter: Send + Sync {
    /// Latency statistics for one operation
    fn report_latency(&self, prefix: &str, op: &str, summary: &LatencySummary);

    /// Mean keying or thinking time for one operation, in seconds
    fn report_wait_time(&self, prefix: &str, op: &str, avg_secs: f64);

    /// Final throughput
    fn report_tpmc(&self, tpmc: f64, efficiency: f64);
}

/// Prints reports to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn report_latency(&self, prefix: &str, op: &str, summary: &LatencySummary) {
        println!("{}{:<6} - {}", prefix, op, summary);
    }

    fn report_wait_time(&self, prefix: &str, op: &str, avg_secs: f64) {
        println!("{}{:<6} - {:.1}s", prefix, op, avg_secs);
    }

    fn report_tpmc(&self, tpmc: f64, efficiency: f64) {
        println!("tpmC: {:.1}, efficiency: {:.1}%", tpmc, efficiency);
    }
}

/// One report received by a `RecordingReporter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportRecord {
    /// Latency statistics
    Latency {
        /// Report prefix
        prefix: String,
        /// Operation name
        op: String,
        /// Statistics
        summary: LatencySummary,
    },
    /// Mean wait time
    WaitTime {
        /// Report prefix
        prefix: String,
        /// Wait measurement name
        op: String,
        /// Mean in seconds
        avg_secs: f64,
    },
    /// Final throughput
    Tpmc {
        /// New orders per minute
        tpmc: f64,
        /// Percentage of the theoretical maximum
        efficiency: f64,
    },
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    records: Mutex<Vec<ReportRecord>>,
}

impl RecordingReporter {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far
    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().clone()
    }

    /// Last reported throughput
    pub fn tpmc(&self) -> Option<(f64, f64)> {
        self.records.lock().iter().rev().find_map(|r| match r {
            ReportRecord::Tpmc { tpmc, efficiency } => Some((*tpmc, *efficiency)),
            _ => None,
        })
    }
}

impl Reporter for RecordingReporter {
    fn report_latency(&self, prefix: &str, op: &str, summary: &LatencySummary) {
        self.records.lock().push(ReportRecord::Latency {
            prefix: prefix.to_string(),
            op: op.to_string(),
            summary: summary.clone(),
        });
    }

    fn report_wait_time(&self, prefix: &str, op: &str, avg_secs: f64) {
        self.records.lock().push(ReportRecord::WaitTime {
            prefix: prefix.to_string(),
            op: op.to_string(),
            avg_secs,
        });
    }

    fn report_tpmc(&self, tpmc: f64, efficiency: f64) {
        self.records
            .lock()
            .push(ReportRecord::Tpmc { tpmc, efficiency });
    }
}

//! Latency measurement and reporting
//!
//! - `Histogram`: HdrHistogram-backed latency histogram with exact sum and max
//! - `Measurement`: current and summary windows keyed by operation name
//! - `Reporter`: sink for periodic and final reports

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod histogram;
pub mod measurement;
pub mod reporter;

pub use hdrhistogram::CreationError;
pub use histogram::{Histogram, LatencySummary};
pub use measurement::{Measurement, CURRENT_PREFIX, SUMMARY_PREFIX};
pub use reporter::{RecordingReporter, ReportRecord, Reporter, StdoutReporter};

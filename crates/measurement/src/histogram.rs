//! Latency histogram on top of HdrHistogram
//!
//! Values are recorded in microseconds with three significant digits. Sum
//! and max are tracked exactly next to the HdrHistogram buckets, so averages
//! and the reported maximum carry no bucketing error.

use hdrhistogram::{CreationError, Histogram as HdrHistogram};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Significant decimal digits kept per value
const SIGNIFICANT_DIGITS: u8 = 3;

/// Latency statistics of one histogram, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Seconds since the histogram was created
    pub elapsed_secs: f64,
    /// Total latency
    pub sum_ms: f64,
    /// Number of samples
    pub count: u64,
    /// Samples per second
    pub ops: f64,
    /// Mean latency
    pub avg_ms: f64,
    /// Median
    pub p50_ms: f64,
    /// 90th percentile
    pub p90_ms: f64,
    /// 95th percentile
    pub p95_ms: f64,
    /// 99th percentile
    pub p99_ms: f64,
    /// 99.9th percentile
    pub p999_ms: f64,
    /// Largest sample
    pub max_ms: f64,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Takes(s): {:.1}, Count: {}, TPM: {:.1}, Sum(ms): {:.1}, Avg(ms): {:.1}, \
             50th(ms): {:.1}, 90th(ms): {:.1}, 95th(ms): {:.1}, 99th(ms): {:.1}, \
             99.9th(ms): {:.1}, Max(ms): {:.1}",
            self.elapsed_secs,
            self.count,
            self.ops * 60.0,
            self.sum_ms,
            self.avg_ms,
            self.p50_ms,
            self.p90_ms,
            self.p95_ms,
            self.p99_ms,
            self.p999_ms,
            self.max_ms
        )
    }
}

/// Latency histogram clamped at a maximum trackable latency
#[derive(Debug, Clone)]
pub struct Histogram {
    inner: HdrHistogram<u64>,
    sum_us: u64,
    max_us: u64,
    max_trackable_us: u64,
    start: Instant,
}

impl Histogram {
    /// Histogram tracking latencies from 1us up to `max_latency`
    pub fn new(max_latency: Duration) -> Result<Self, CreationError> {
        let max_trackable_us = u64::try_from(max_latency.as_micros())
            .unwrap_or(u64::MAX)
            .max(2);
        let inner = HdrHistogram::new_with_bounds(1, max_trackable_us, SIGNIFICANT_DIGITS)?;
        Ok(Self {
            inner,
            sum_us: 0,
            max_us: 0,
            max_trackable_us,
            start: Instant::now(),
        })
    }

    /// Empty histogram with the same bounds, starting its clock now
    pub fn empty_like(&self) -> Self {
        Self {
            inner: HdrHistogram::new_from(&self.inner),
            sum_us: 0,
            max_us: 0,
            max_trackable_us: self.max_trackable_us,
            start: Instant::now(),
        }
    }

    /// Record one sample; values above the maximum are clamped
    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros())
            .unwrap_or(u64::MAX)
            .min(self.max_trackable_us);
        self.inner.saturating_record(micros);
        self.sum_us = self.sum_us.saturating_add(micros);
        self.max_us = self.max_us.max(micros);
    }

    /// Number of samples
    pub fn count(&self) -> u64 {
        self.inner.len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Largest sample in microseconds
    pub fn max_micros(&self) -> u64 {
        self.max_us
    }

    /// Value at quantile `q` (0.0..=1.0) in microseconds, never above the max
    pub fn value_at_quantile(&self, q: f64) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.inner.value_at_quantile(q).min(self.max_us)
    }

    /// Statistics since creation
    pub fn info(&self) -> LatencySummary {
        let elapsed_secs = self.start.elapsed().as_secs_f64();
        let count = self.count();
        let ms = |us: u64| us as f64 / 1000.0;
        let avg_ms = if count == 0 {
            0.0
        } else {
            ms(self.sum_us) / count as f64
        };
        let ops = if elapsed_secs > 0.0 {
            count as f64 / elapsed_secs
        } else {
            0.0
        };
        LatencySummary {
            elapsed_secs,
            sum_ms: ms(self.sum_us),
            count,
            ops,
            avg_ms,
            p50_ms: ms(self.value_at_quantile(0.5)),
            p90_ms: ms(self.value_at_quantile(0.9)),
            p95_ms: ms(self.value_at_quantile(0.95)),
            p99_ms: ms(self.value_at_quantile(0.99)),
            p999_ms: ms(self.value_at_quantile(0.999)),
            max_ms: ms(self.max_us),
        }
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        self.info().to_string()
    }
}

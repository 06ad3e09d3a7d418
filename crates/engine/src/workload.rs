//! Lifecycle contract between a workload and the harness driving it
//!
//! The harness creates one state per worker with `init_thread`, calls one of
//! the phase methods (`prepare`, `check_prepare`, `run`, `check`, `cleanup`)
//! with that state, and hands the state back to `cleanup_thread`. `run`
//! executes one transaction per call; the harness loops. `output_stats` may be
//! called from any thread at any time.

use tpcc_core::{CancelToken, Result};

/// A benchmark workload
pub trait Workload: Send + Sync {
    /// Worker-owned state
    type State: Send;

    /// Workload name
    fn name(&self) -> &str;

    /// Database name the workload targets
    fn db_name(&self) -> &str;

    /// Create the state of worker `thread_id`
    fn init_thread(&self, thread_id: usize) -> Result<Self::State>;

    /// Release a worker's state, flushing anything it still buffers
    fn cleanup_thread(&self, state: Self::State) -> Result<()>;

    /// Create tables and load this worker's share of the data
    fn prepare(&self, state: &mut Self::State, cancel: &CancelToken) -> Result<()>;

    /// Run every consistency condition on this worker's warehouses
    fn check_prepare(&self, state: &mut Self::State, cancel: &CancelToken) -> Result<()>;

    /// Execute one transaction
    fn run(&self, state: &mut Self::State, cancel: &CancelToken) -> Result<()>;

    /// Run the post-run consistency conditions on this worker's warehouses
    fn check(&self, state: &mut Self::State, cancel: &CancelToken) -> Result<()>;

    /// Drop the schema (worker 0 only)
    fn cleanup(&self, state: &mut Self::State, cancel: &CancelToken) -> Result<()>;

    /// Report the current window, or the whole phase when `final_summary`
    fn output_stats(&self, final_summary: bool);
}

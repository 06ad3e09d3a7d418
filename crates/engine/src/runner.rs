//! Multi-threaded phase driver
//!
//! `Runner::execute` spawns one scoped thread per worker. Each worker builds
//! its state with `init_thread`, performs the action and hands the state back
//! to `cleanup_thread`. A stats thread reports the current window every
//! `output_interval` and the whole phase once the workers are done.
//!
//! Failure handling per action:
//! - Prepare: the first failure cancels every other worker
//! - Run: a failure stops the failing worker unless `ignore_error` is set,
//!   in which case it is only counted
//! - CheckPrepare, Check, Cleanup: a failure stops the failing worker
//!
//! Every failure ends up in the returned `ExecutionReport`, either as an
//! error or in `ignored_errors`.

use crate::workload::Workload;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tpcc_core::{CancelToken, Error, Result};
use tracing::{error, info};

/// Harness settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Worker threads
    pub threads: usize,
    /// Transactions over all workers for a run; 0 means unbounded
    pub total_count: u64,
    /// Time budget of a run
    pub duration: Option<Duration>,
    /// Keep running after a failed transaction
    pub ignore_error: bool,
    /// Do not log failed transactions
    pub silence: bool,
    /// Drop existing tables before preparing
    pub drop_data: bool,
    /// Period of the progress report
    pub output_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            total_count: 0,
            duration: None,
            ignore_error: false,
            silence: false,
            drop_data: false,
            output_interval: Duration::from_secs(10),
        }
    }
}

/// Workload phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create the schema and load the initial population
    Prepare,
    /// Verify every consistency condition right after loading
    CheckPrepare,
    /// Execute the transaction mix
    Run,
    /// Verify the consistency conditions after a run
    Check,
    /// Drop the schema
    Cleanup,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Prepare => "prepare",
            Action::CheckPrepare => "check_prepare",
            Action::Run => "run",
            Action::Check => "check",
            Action::Cleanup => "cleanup",
        })
    }
}

/// Outcome of one `Runner::execute`
#[derive(Debug)]
pub struct ExecutionReport {
    /// Phase that was executed
    pub action: Action,
    /// Wall time of the phase
    pub elapsed: Duration,
    /// Failures as `(thread_id, error)`, in the order they happened
    pub errors: Vec<(usize, Error)>,
    /// Failed transactions skipped because of `ignore_error`
    pub ignored_errors: u64,
}

impl ExecutionReport {
    /// Whether no worker failed and no transaction failure was ignored
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.ignored_errors == 0
    }

    /// First failure as an error
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some((_, e)) => Err(e),
            None if self.ignored_errors > 0 => Err(Error::IgnoredFailures {
                count: self.ignored_errors,
            }),
            None => Ok(()),
        }
    }
}

/// Drives a workload over a pool of worker threads
#[derive(Debug, Clone, Default)]
pub struct Runner {
    cfg: RunnerConfig,
}

impl Runner {
    /// Runner with the given settings
    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    /// Harness settings
    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    fn iterations(&self) -> Option<u64> {
        if self.cfg.total_count == 0 {
            None
        } else {
            Some(self.cfg.total_count / self.cfg.threads.max(1) as u64)
        }
    }

    /// Execute `action` on every worker and wait for all of them
    pub fn execute<W: Workload>(&self, workload: &W, action: Action) -> ExecutionReport {
        let threads = self.cfg.threads.max(1);
        let cancel = match (action, self.cfg.duration) {
            (Action::Run, Some(duration)) => CancelToken::with_timeout(duration),
            _ => CancelToken::new(),
        };
        let stats_done = CancelToken::new();
        let errors = Mutex::new(Vec::new());
        let ignored = AtomicU64::new(0);
        let start = Instant::now();

        info!(
            target: "tpcc::runner",
            workload = workload.name(),
            action = %action,
            threads,
            "Starting phase"
        );

        thread::scope(|scope| {
            let stats = thread::Builder::new()
                .name("tpcc-stats".into())
                .spawn_scoped(scope, || {
                    while stats_done.sleep(self.cfg.output_interval) {
                        workload.output_stats(false);
                    }
                    workload.output_stats(true);
                });
            if let Err(e) = &stats {
                error!(target: "tpcc::runner", error = %e, "Failed to spawn stats thread");
            }

            let mut workers = Vec::with_capacity(threads);
            for thread_id in 0..threads {
                let spawned = thread::Builder::new()
                    .name(format!("tpcc-worker-{}", thread_id))
                    .spawn_scoped(scope, {
                        let cancel = &cancel;
                        let errors = &errors;
                        let ignored = &ignored;
                        move || {
                            if let Err(e) =
                                self.worker(workload, action, thread_id, cancel, ignored)
                            {
                                if action == Action::Prepare {
                                    cancel.cancel();
                                }
                                if !e.is_cancelled() {
                                    error!(
                                        target: "tpcc::runner",
                                        thread = thread_id,
                                        action = %action,
                                        error = %e,
                                        "Worker failed"
                                    );
                                }
                                errors.lock().push((thread_id, e));
                            }
                        }
                    });
                match spawned {
                    Ok(handle) => workers.push((thread_id, handle)),
                    Err(e) => {
                        cancel.cancel();
                        errors.lock().push((thread_id, Error::Io(e)));
                    }
                }
            }

            for (thread_id, handle) in workers {
                if handle.join().is_err() {
                    cancel.cancel();
                    errors.lock().push((thread_id, Error::WorkerPanicked { thread_id }));
                }
            }
            stats_done.cancel();
            if let Ok(handle) = stats {
                let _ = handle.join();
            }
        });

        let elapsed = start.elapsed();
        let ignored_errors = ignored.into_inner();
        let mut errors = errors.into_inner();
        // A cancelled worker only reports that another one failed first
        if errors.iter().any(|(_, e)| !e.is_cancelled()) {
            errors.retain(|(_, e)| !e.is_cancelled());
        }
        info!(
            target: "tpcc::runner",
            action = %action,
            elapsed_ms = elapsed.as_millis() as u64,
            failures = errors.len(),
            ignored_errors,
            "Finished phase"
        );
        ExecutionReport {
            action,
            elapsed,
            errors,
            ignored_errors,
        }
    }

    fn worker<W: Workload>(
        &self,
        workload: &W,
        action: Action,
        thread_id: usize,
        cancel: &CancelToken,
        ignored: &AtomicU64,
    ) -> Result<()> {
        let mut state = workload.init_thread(thread_id)?;
        let result = self.perform(workload, &mut state, action, thread_id, cancel, ignored);
        let cleanup = workload.cleanup_thread(state);
        result.and(cleanup)
    }

    fn perform<W: Workload>(
        &self,
        workload: &W,
        state: &mut W::State,
        action: Action,
        thread_id: usize,
        cancel: &CancelToken,
        ignored: &AtomicU64,
    ) -> Result<()> {
        match action {
            Action::Prepare => {
                if self.cfg.drop_data && thread_id == 0 {
                    workload.cleanup(state, cancel)?;
                }
                workload.prepare(state, cancel)
            }
            Action::CheckPrepare => workload.check_prepare(state, cancel),
            Action::Check => workload.check(state, cancel),
            Action::Cleanup => workload.cleanup(state, cancel),
            Action::Run => self.run_loop(workload, state, thread_id, cancel, ignored),
        }
    }

    fn run_loop<W: Workload>(
        &self,
        workload: &W,
        state: &mut W::State,
        thread_id: usize,
        cancel: &CancelToken,
        ignored: &AtomicU64,
    ) -> Result<()> {
        let limit = self.iterations();
        let mut done = 0u64;
        while limit.map_or(true, |n| done < n) && !cancel.is_cancelled() {
            if let Err(e) = workload.run(state, cancel) {
                if !self.cfg.silence {
                    error!(target: "tpcc::runner", thread = thread_id, error = %e, "Transaction failed");
                }
                if !self.cfg.ignore_error {
                    return Err(e);
                }
                ignored.fetch_add(1, Ordering::Relaxed);
            }
            done += 1;
        }
        Ok(())
    }
}

//! Cooperative cancellation
//!
//! A `CancelToken` is shared by every worker of a phase. It trips either when
//! `cancel()` is called or when its deadline passes. Workers poll it between
//! units of work and use `sleep` for keying/thinking delays so a cancelled
//! phase does not wait out a long sleep.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
    deadline: Option<Instant>,
}

/// Shared cancellation flag with optional deadline
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Token that only trips on `cancel()`
    pub fn new() -> Self {
        Self::with_deadline(None)
    }

    /// Token that also trips after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now().checked_add(timeout))
    }

    fn with_deadline(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: Mutex::new(false),
                wake: Condvar::new(),
                deadline,
            }),
        }
    }

    /// Trip the token and wake every sleeper
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.wake.notify_all();
    }

    /// Check if the token was cancelled or its deadline passed
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock() || self.deadline_passed(Instant::now())
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.inner.deadline.map_or(false, |d| now >= d)
    }

    /// Sleep for `duration` unless the token trips first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if interrupted.
    pub fn sleep(&self, duration: Duration) -> bool {
        let end = Instant::now() + duration;
        let mut cancelled = self.inner.cancelled.lock();
        loop {
            if *cancelled {
                return false;
            }
            let now = Instant::now();
            if self.deadline_passed(now) {
                return false;
            }
            if now >= end {
                return true;
            }
            let wake_at = match self.inner.deadline {
                Some(deadline) if deadline < end => deadline,
                _ => end,
            };
            self.inner.wake.wait_until(&mut cancelled, wake_at);
        }
    }
}

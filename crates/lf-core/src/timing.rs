//! Monotonic clocks and the cooperative stop signal.
//!
//! The control loop never calls `Instant::now()` or `thread::sleep` directly.
//! It goes through a [`Clock`], so that:
//! - real runs pace themselves against the wall clock ([`SystemClock`])
//! - simulated runs and tests advance virtual time instantly ([`ManualClock`])
//!
//! Every sleep takes a [`StopSignal`] and returns early once it fires; that is
//! the only suspension point of the loop.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time plus an interruptible sleep.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Suspend for `duration` or until `stop` fires.
    ///
    /// Returns `true` if the stop signal is set when the call returns.
    fn sleep(&self, duration: Duration, stop: &StopSignal) -> bool;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration, stop: &StopSignal) -> bool {
        (**self).sleep(duration, stop)
    }
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration, stop: &StopSignal) -> bool {
        stop.wait_timeout(duration)
    }
}

/// Virtual time that only moves when someone sleeps or calls [`advance`].
///
/// Sleeping never blocks, so a simulated hour of control runs in milliseconds.
///
/// [`advance`]: ManualClock::advance
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward, e.g. to model time spent doing work.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration, stop: &StopSignal) -> bool {
        if stop.is_stopped() {
            return true;
        }
        self.advance(duration);
        stop.is_stopped()
    }
}

#[derive(Debug, Default)]
struct StopInner {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// One-way cancellation flag shared between the control loop and whoever
/// requests the stop (Ctrl-C handler, run-duration limit, tests).
///
/// Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop and wake any sleeper. Idempotent.
    pub fn trigger(&self) {
        let mut stopped = self.inner.stopped.lock();
        *stopped = true;
        self.inner.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.stopped.lock()
    }

    /// Block for at most `timeout`; returns early when the signal fires.
    ///
    /// Returns `true` if the signal is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.inner.stopped.lock();
        while !*stopped {
            if self.inner.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

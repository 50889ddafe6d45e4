//! Single in-flight command guard and progress throttling (spec §3.3, §4.3.13).
//!
//! An `IMAPSession` may have at most one command outstanding at a time.
//! Attempting to start a second while one is in flight must return the
//! distinct `EAGAIN` status without ever touching the socket (spec §3.3
//! invariant, §8 "Single in-flight"). The original groups this with a
//! one-worker thread pool so that a long fetch can run while the caller's
//! event loop stays responsive; the async translation is a shared
//! [`Worker`] guard plus ordinary `tokio::spawn`, rather than a literal
//! OS thread and hand-rolled done/progress polling.
//!
//! [`Session`](super::Session) holds one [`Worker`] and acquires it
//! around its long-running operations (the header-fetch loop, body
//! download); callers driving the *same* session from two tasks at once
//! (e.g. a background sync task and a foreground cancel button) observe
//! [`crate::Error::WouldBlock`] from the second caller rather than
//! blocking or corrupting the wire protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Minimum spacing between progress callback invocations (spec §4.3.9:
/// "no more often than once per configured interval, default 200 ms").
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Tracks whether a command is currently in flight on a session.
///
/// Cheaply cloneable (internally an `Arc`) so it can be shared between a
/// [`Session`](super::Session) and any background task spawned to drive
/// a long-running fetch on its behalf.
#[derive(Debug, Clone, Default)]
pub struct Worker {
    in_flight: Arc<AtomicBool>,
}

impl Worker {
    /// Creates a new, idle worker guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to mark a command as in flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WouldBlock`] (the session-level `EAGAIN` status)
    /// if another command is already in flight. No bytes are written to
    /// the wire in that case.
    pub fn try_begin(&self) -> Result<InFlightGuard<'_>> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(Error::WouldBlock);
        }
        Ok(InFlightGuard { worker: self })
    }

    /// Returns whether a command is currently in flight.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// RAII guard marking the session as idle again on every exit path,
/// including early returns, cancellation, and unwinding through `?`.
#[must_use = "dropping this immediately releases the in-flight guard"]
pub struct InFlightGuard<'a> {
    worker: &'a Worker,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.worker.in_flight.store(false, Ordering::Release);
    }
}

/// Throttles a progress callback to at most one invocation per
/// [`PROGRESS_INTERVAL`] (spec §4.3.9 / §4.5), always firing on the
/// final `current == total` notification so callers see completion.
pub struct ProgressThrottle<F> {
    callback: F,
    last_fired: Option<Instant>,
}

impl<F: FnMut(u64, u64)> ProgressThrottle<F> {
    /// Wraps `callback` with the standard throttle interval.
    pub const fn new(callback: F) -> Self {
        Self {
            callback,
            last_fired: None,
        }
    }

    /// Reports `(current, total)`, invoking the callback only if the
    /// throttle interval has elapsed since the last invocation or this
    /// is the final (`current == total`) notification.
    pub fn notify(&mut self, current: u64, total: u64) {
        let now = Instant::now();
        let due = self
            .last_fired
            .is_none_or(|last| now.duration_since(last) >= PROGRESS_INTERVAL);

        if due || current >= total {
            (self.callback)(current, total);
            self.last_fired = Some(now);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_returns_would_block() {
        let worker = Worker::new();
        let guard = worker.try_begin().unwrap();
        assert!(worker.is_in_flight());

        let second = worker.try_begin();
        assert!(matches!(second, Err(Error::WouldBlock)));

        drop(guard);
        assert!(!worker.is_in_flight());
        assert!(worker.try_begin().is_ok());
    }

    #[test]
    fn guard_releases_on_early_return() {
        let worker = Worker::new();

        fn fallible(worker: &Worker) -> Result<()> {
            let _guard = worker.try_begin()?;
            Err(Error::Protocol("boom".to_string()))
        }

        assert!(fallible(&worker).is_err());
        assert!(!worker.is_in_flight());
    }

    #[test]
    fn progress_throttle_always_fires_on_completion() {
        let mut calls = Vec::new();
        {
            let mut throttle = ProgressThrottle::new(|cur, total| calls.push((cur, total)));
            throttle.notify(0, 10);
            throttle.notify(10, 10);
        }
        assert_eq!(calls.first(), Some(&(0, 10)));
        assert_eq!(calls.last(), Some(&(10, 10)));
    }
}

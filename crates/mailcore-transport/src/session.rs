//! Abstract protocol session state shared by IMAP, NNTP, and SMTP clients
//! (spec §3.2 `Session`).

use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Lifecycle state of a protocol session, independent of which protocol is
/// layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected and idle, ready to send the next command.
    Ready,
    /// A command is being written to the socket.
    Send,
    /// A response is being read from the socket.
    Recv,
    /// The peer closed the connection.
    Eof,
    /// The last operation exceeded its timeout.
    Timeout,
    /// An unrecoverable protocol or transport error occurred.
    Error,
    /// The session has been explicitly disconnected.
    Disconnected,
}

/// Callback surface a caller can register to observe session activity,
/// generalizing the original's `RecvMsgNotify` / `*DataProgressiveNotify`
/// function-pointer fields into a single trait object. Every method has a
/// no-op default so callers only override what they need.
pub trait SessionObserver: Send + Sync {
    /// Called once for every line-oriented message the session receives.
    fn on_message(&self, _msg: &str) {}

    /// Called periodically while a bulk receive is in progress.
    fn on_recv_progress(&self, _cur_len: u64, _total_len: u64) {}

    /// Called periodically while a bulk send is in progress.
    fn on_send_progress(&self, _cur_len: u64, _total_len: u64) {}
}

/// A no-op observer, used when the caller does not care about progress
/// notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}

/// Tracks the state common to every protocol session: lifecycle state,
/// last-access timestamp (for idle/keepalive decisions), and the
/// configured per-operation timeout. Protocol clients embed this rather
/// than re-deriving it, matching how `Session` in the original is a base
/// struct every protocol-specific session starts with.
#[derive(Debug)]
pub struct SessionTimers {
    state: SessionState,
    last_access: Instant,
    timeout: Duration,
    cancelled: bool,
}

impl SessionTimers {
    /// Creates a fresh tracker in the `Ready` state with `timeout` applied
    /// to future `check_timeout` calls.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: SessionState::Ready,
            last_access: Instant::now(),
            timeout,
            cancelled: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Transitions to a new state and, for any state other than
    /// `Disconnected`/`Error`/`Eof`, refreshes the access timestamp.
    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
        if matches!(state, SessionState::Ready | SessionState::Send | SessionState::Recv) {
            self.touch();
        }
    }

    /// Updates the last-access timestamp to now.
    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    /// How long has elapsed since the last access.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_access.elapsed()
    }

    /// Replaces the timeout interval used by `check_timeout`.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Marks the session as cancelled; subsequent `check_cancelled` calls
    /// will return [`Error::Cancelled`].
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Returns [`Error::Cancelled`] if `cancel` has been called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the session was cancelled.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancelled {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Returns [`Error::Timeout`] if more than the configured timeout has
    /// elapsed since the last access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the session has been idle too long.
    pub fn check_timeout(&self) -> Result<()> {
        if self.idle_for() > self.timeout {
            Err(Error::Timeout(self.timeout))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_starts_ready_and_uncancelled() {
        let timers = SessionTimers::new(Duration::from_secs(30));
        assert_eq!(timers.state(), SessionState::Ready);
        assert!(timers.check_cancelled().is_ok());
        assert!(timers.check_timeout().is_ok());
    }

    #[test]
    fn cancel_is_observed() {
        let mut timers = SessionTimers::new(Duration::from_secs(30));
        timers.cancel();
        assert!(matches!(timers.check_cancelled(), Err(Error::Cancelled)));
    }

    #[test]
    fn zero_timeout_trips_immediately() {
        let timers = SessionTimers::new(Duration::from_nanos(0));
        std::thread::sleep(Duration::from_millis(1));
        assert!(matches!(timers.check_timeout(), Err(Error::Timeout(_))));
    }
}

//! Checkpointed waits and elapsed-time phase timing.
//!
//! Every wait in the control loop (a dwell, a stroke, the end-sensor
//! reversal) is one call to [`poll_until`] per tick: the checkpoints are
//! evaluated first, then the readiness predicate. Nothing ever blocks, so a
//! pause or stop is seen on the very next tick.
//!
//! [`PhaseTimer`] measures phase durations by elapsed monotonic time and can
//! be suspended across a pause without losing the time already served.
//!
//! [`DoubleSample`] implements the two-sample check on the start trigger.
//!
//! # Example
//!
//! ```rust
//! use drive_cycle::latch::SharedFlags;
//! use drive_cycle::wait::{poll_until, PhaseTimer, WaitStatus, RUN_CHECKPOINTS};
//!
//! let flags = SharedFlags::new();
//! let mut timer = PhaseTimer::new();
//! timer.start(3_000, 0);
//!
//! assert_eq!(
//!     poll_until(&flags, RUN_CHECKPOINTS, || timer.is_expired(1_000)),
//!     WaitStatus::Pending
//! );
//!
//! flags.set_paused(true);
//! assert_eq!(
//!     poll_until(&flags, RUN_CHECKPOINTS, || timer.is_expired(1_000)),
//!     WaitStatus::Paused
//! );
//! ```

use crate::latch::SharedFlags;

/// A condition checked before every wait predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Checkpoint {
    /// Emergency stop latched.
    Stop,
    /// Pause latched.
    Pause,
}

/// Checkpoints for every motion phase. Stop wins over pause.
pub const RUN_CHECKPOINTS: &[Checkpoint] = &[Checkpoint::Stop, Checkpoint::Pause];

/// Result of one poll of a checkpointed wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitStatus {
    /// The awaited condition holds.
    Ready,
    /// Keep polling.
    Pending,
    /// A pause checkpoint fired; the predicate was not evaluated.
    Paused,
    /// A stop checkpoint fired; the predicate was not evaluated.
    Stopped,
}

/// Evaluate `checkpoints` in order, then `ready`.
///
/// The first checkpoint that fires decides the outcome; `ready` is only
/// called once all checkpoints are clear.
pub fn poll_until<F>(flags: &SharedFlags, checkpoints: &[Checkpoint], ready: F) -> WaitStatus
where
    F: FnOnce() -> bool,
{
    for checkpoint in checkpoints {
        match checkpoint {
            Checkpoint::Stop if flags.is_emergency_stop() => return WaitStatus::Stopped,
            Checkpoint::Pause if flags.is_paused() => return WaitStatus::Paused,
            _ => {}
        }
    }
    if ready() {
        WaitStatus::Ready
    } else {
        WaitStatus::Pending
    }
}

/// Suspendable phase timer.
///
/// Tracks time served in closed intervals (`banked_ms`) plus the currently
/// running interval, so suspending and resuming never restarts the phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTimer {
    duration_ms: u64,
    banked_ms: u64,
    running_since: Option<u64>,
}

impl PhaseTimer {
    /// Creates an idle timer.
    pub const fn new() -> Self {
        Self {
            duration_ms: 0,
            banked_ms: 0,
            running_since: None,
        }
    }

    /// Starts a fresh phase of `duration_ms` at `now_ms`.
    pub fn start(&mut self, duration_ms: u64, now_ms: u64) {
        self.duration_ms = duration_ms;
        self.banked_ms = 0;
        self.running_since = Some(now_ms);
    }

    /// Stops the clock, banking the time served so far.
    pub fn suspend(&mut self, now_ms: u64) {
        if let Some(since) = self.running_since.take() {
            self.banked_ms += now_ms.saturating_sub(since);
        }
    }

    /// Restarts the clock after [`suspend`](Self::suspend).
    pub fn resume(&mut self, now_ms: u64) {
        if self.running_since.is_none() {
            self.running_since = Some(now_ms);
        }
    }

    /// Clears the timer.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Time served in this phase.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let running = self
            .running_since
            .map(|since| now_ms.saturating_sub(since))
            .unwrap_or(0);
        self.banked_ms + running
    }

    /// Time left in this phase.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.duration_ms.saturating_sub(self.elapsed_ms(now_ms))
    }

    /// True once the full duration has been served.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.elapsed_ms(now_ms) >= self.duration_ms
    }

    /// True while the clock is running.
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}

/// Two-sample contact debounce.
///
/// Fires once when the input reads asserted on two samples at least
/// `interval_ms` apart with no deasserted reading in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoubleSample {
    interval_ms: u32,
    first_seen_ms: Option<u64>,
}

impl DoubleSample {
    /// Creates a debouncer with the given sample separation.
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            first_seen_ms: None,
        }
    }

    /// Feeds one reading; returns true when the trigger is confirmed.
    pub fn sample(&mut self, asserted: bool, now_ms: u64) -> bool {
        if !asserted {
            self.first_seen_ms = None;
            return false;
        }
        match self.first_seen_ms {
            None => {
                self.first_seen_ms = Some(now_ms);
                false
            }
            Some(first) if now_ms.saturating_sub(first) >= u64::from(self.interval_ms) => {
                self.first_seen_ms = None;
                true
            }
            Some(_) => false,
        }
    }

    /// Forgets a pending first sample.
    pub fn reset(&mut self) {
        self.first_seen_ms = None;
    }
}

//! Flags shared between the control loop and the home-sensor interrupt.
//!
//! [`SharedFlags`] is the only state both execution contexts touch. It is an
//! explicit struct passed by reference to the controller and to the
//! interrupt registration; on hardware a single `static` instance backs both.
//!
//! [`PauseLatch`] is the interrupt-side handler. Each accepted falling edge on
//! the home line toggles `paused` and forces the actuator lines off through a
//! caller-supplied stop path. Edges inside the refractory interval are bounce
//! and are discarded.
//!
//! # Example
//!
//! ```rust
//! use drive_cycle::latch::{PauseLatch, SharedFlags};
//!
//! static FLAGS: SharedFlags = SharedFlags::new();
//! static LATCH: PauseLatch<'static> = PauseLatch::new(&FLAGS, 150);
//!
//! // First edge toggles
//! assert!(LATCH.on_edge(1_000, true, || {}));
//! assert!(FLAGS.is_paused());
//!
//! // Bounce 20ms later is discarded
//! assert!(!LATCH.on_edge(1_020, true, || {}));
//! assert!(FLAGS.is_paused());
//!
//! // Release bounce reads the line high and is dropped
//! assert!(!LATCH.on_edge(1_400, false, || {}));
//! assert!(FLAGS.is_paused());
//!
//! // A real second press toggles back
//! assert!(LATCH.on_edge(1_500, true, || {}));
//! assert!(!FLAGS.is_paused());
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Pause and emergency-stop flags.
///
/// Every operation is a single atomic load, store or swap. Callers must not
/// assume a load followed by a store is atomic with respect to the
/// interrupt.
#[derive(Debug, Default)]
pub struct SharedFlags {
    paused: AtomicBool,
    emergency_stop: AtomicBool,
}

impl SharedFlags {
    /// Creates cleared flags. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            emergency_stop: AtomicBool::new(false),
        }
    }

    /// Returns true while a pause is latched.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Atomically flips the pause flag, returning the new value.
    #[inline]
    pub fn toggle_paused(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::AcqRel)
    }

    /// Sets the pause flag.
    #[inline]
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// Returns true while an emergency stop is latched.
    #[inline]
    pub fn is_emergency_stop(&self) -> bool {
        self.emergency_stop.load(Ordering::Acquire)
    }

    /// Latches an emergency stop.
    #[inline]
    pub fn request_stop(&self) {
        self.emergency_stop.store(true, Ordering::Release);
    }

    /// Clears both flags.
    pub fn clear(&self) {
        self.paused.store(false, Ordering::Release);
        self.emergency_stop.store(false, Ordering::Release);
    }
}

/// Smallest accepted refractory interval.
pub const MIN_REFRACTORY_MS: u32 = 100;

/// Largest accepted refractory interval.
pub const MAX_REFRACTORY_MS: u32 = 200;

/// Debounced pause toggle bound to the home-sensor falling edge.
///
/// Runs in interrupt context: bounded time, no blocking, no display or
/// keypad access. Timestamps are `u32` milliseconds compared with
/// wrapping arithmetic so the latch works on targets without 64-bit
/// atomics.
#[derive(Debug)]
pub struct PauseLatch<'a> {
    flags: &'a SharedFlags,
    refractory_ms: u32,
    last_accepted_ms: AtomicU32,
    armed: AtomicBool,
}

impl<'a> PauseLatch<'a> {
    /// Creates a latch over `flags`.
    ///
    /// `refractory_ms` is clamped to
    /// [`MIN_REFRACTORY_MS`]..=[`MAX_REFRACTORY_MS`].
    pub const fn new(flags: &'a SharedFlags, refractory_ms: u32) -> Self {
        let refractory_ms = if refractory_ms < MIN_REFRACTORY_MS {
            MIN_REFRACTORY_MS
        } else if refractory_ms > MAX_REFRACTORY_MS {
            MAX_REFRACTORY_MS
        } else {
            refractory_ms
        };
        Self {
            flags,
            refractory_ms,
            last_accepted_ms: AtomicU32::new(0),
            armed: AtomicBool::new(false),
        }
    }

    /// The effective refractory interval.
    #[inline]
    pub fn refractory_ms(&self) -> u32 {
        self.refractory_ms
    }

    /// Handles one falling edge at `now_ms`.
    ///
    /// `asserted` is the home line level sampled in the handler. An edge
    /// seen while the line already reads released is release bounce and is
    /// dropped. Otherwise, if the edge is outside the refractory interval of
    /// the previous accepted edge, toggles `paused`, runs `safe_off` to
    /// de-energize the actuator and returns `true`. Any other edge is bounce
    /// and `false` is returned.
    pub fn on_edge<F: FnOnce()>(&self, now_ms: u32, asserted: bool, safe_off: F) -> bool {
        if !asserted {
            return false;
        }
        // The first edge ever seen has nothing to be compared against
        if self.armed.load(Ordering::Acquire) {
            let last = self.last_accepted_ms.load(Ordering::Acquire);
            if now_ms.wrapping_sub(last) <= self.refractory_ms {
                return false;
            }
        }
        self.last_accepted_ms.store(now_ms, Ordering::Release);
        self.armed.store(true, Ordering::Release);
        self.flags.toggle_paused();
        safe_off();
        true
    }
}

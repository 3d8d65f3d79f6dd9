//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without the actuator rig.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockActuator`] | [`Actuator`] | Tracks direction/power and their history |
//! | [`MockSensors`] | [`LimitSensors`] | Settable home/end switch levels |
//! | [`MockKeypad`] | [`KeySource`] | FIFO of queued key presses |
//! | [`MockDisplay`] | [`TextDisplay`] | 16x2 character grid with a write log |
//! | [`MockClock`] | [`Clock`], [`Delay`] | Controllable time source |
//!
//! # Example
//!
//! ```rust
//! use drive_cycle::hal::{MockActuator, MockDisplay, MockKeypad, MockSensors};
//! use drive_cycle::latch::SharedFlags;
//! use drive_cycle::{Config, CycleController, Key, Stage};
//!
//! let flags = SharedFlags::new();
//! let mut controller = CycleController::new(
//!     MockActuator::new(),
//!     MockSensors::new(),
//!     MockKeypad::new(),
//!     MockDisplay::new(),
//!     &flags,
//!     Config::default(),
//! );
//! controller.init().unwrap();
//!
//! controller.keypad_mut().press(Key::Skip);
//! controller.update(0).unwrap();
//! assert_eq!(controller.stage(), Stage::CountEntry);
//! assert_eq!(controller.display().row(0), "Give N value:");
//! ```
//!
//! [`Actuator`]: crate::traits::Actuator
//! [`LimitSensors`]: crate::traits::LimitSensors
//! [`KeySource`]: crate::traits::KeySource
//! [`TextDisplay`]: crate::traits::TextDisplay
//! [`Clock`]: crate::traits::Clock
//! [`Delay`]: crate::traits::Delay

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::traits::{
    Actuator, Clock, Delay, Direction, Key, KeySource, LimitSensors, TextDisplay, DISPLAY_COLS,
    DISPLAY_ROWS,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock actuator driver for testing.
///
/// Records every output change for verification. Use the public fields to
/// inspect state after test operations.
///
/// # Example
///
/// ```rust
/// use drive_cycle::hal::MockActuator;
/// use drive_cycle::traits::{Actuator, Direction};
///
/// let mut actuator = MockActuator::new();
/// actuator.set_direction(Direction::Retract).unwrap();
///
/// assert_eq!(actuator.direction, Direction::Retract);
/// assert_eq!(actuator.history, vec![(Direction::Retract, false)]);
/// ```
#[derive(Debug, Default)]
pub struct MockActuator {
    /// Current direction lines.
    pub direction: Direction,
    /// Current power-enable state.
    pub power: bool,
    /// Every (direction, power) state after each write.
    pub history: Vec<(Direction, bool)>,
    /// When set, every write fails.
    pub fail_writes: bool,
}

impl MockActuator {
    /// Creates a de-energized mock actuator.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the direction lines are driven or power is enabled.
    pub fn is_energized(&self) -> bool {
        self.direction != Direction::Idle || self.power
    }

    /// Simulates the interrupt stop path forcing the lines off.
    pub fn force_off(&mut self) {
        self.direction = Direction::Idle;
        self.power = false;
        self.history.push((self.direction, self.power));
    }

    /// Number of distinct stretches driven in `dir`.
    pub fn strokes(&self, dir: Direction) -> usize {
        let mut count = 0;
        let mut previous = Direction::Idle;
        for (d, _) in &self.history {
            if *d == dir && previous != dir {
                count += 1;
            }
            previous = *d;
        }
        count
    }
}

impl Actuator for MockActuator {
    type Error = ();

    fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.direction = dir;
        self.history.push((self.direction, self.power));
        Ok(())
    }

    fn set_power(&mut self, enabled: bool) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.power = enabled;
        self.history.push((self.direction, self.power));
        Ok(())
    }
}

/// Mock limit switches.
///
/// # Example
///
/// ```rust
/// use drive_cycle::hal::MockSensors;
/// use drive_cycle::traits::LimitSensors;
///
/// let mut sensors = MockSensors::new();
/// sensors.home = true;
/// assert!(sensors.is_home_asserted());
/// assert!(!sensors.is_end_asserted());
/// ```
#[derive(Debug, Default)]
pub struct MockSensors {
    /// Home switch triggered.
    pub home: bool,
    /// End switch triggered.
    pub end: bool,
    /// Number of `poll` calls.
    pub polls: usize,
}

impl MockSensors {
    /// Creates sensors with both switches released.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LimitSensors for MockSensors {
    fn is_home_asserted(&self) -> bool {
        self.home
    }

    fn is_end_asserted(&self) -> bool {
        self.end
    }

    fn poll(&mut self) {
        self.polls += 1;
    }
}

/// Mock keypad.
///
/// Keys come out in the order they were pressed, one per poll.
///
/// # Example
///
/// ```rust
/// use drive_cycle::hal::MockKeypad;
/// use drive_cycle::traits::{Key, KeySource};
///
/// let mut keypad = MockKeypad::new();
/// keypad.press_all(&[Key::Digit(1), Key::Confirm]);
///
/// assert_eq!(keypad.poll_key(), Some(Key::Digit(1)));
/// assert_eq!(keypad.poll_key(), Some(Key::Confirm));
/// assert_eq!(keypad.poll_key(), None);
/// ```
#[derive(Debug, Default)]
pub struct MockKeypad {
    pending: VecDeque<Key>,
}

impl MockKeypad {
    /// Creates a keypad with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one key press.
    pub fn press(&mut self, key: Key) {
        self.pending.push_back(key);
    }

    /// Queue several key presses.
    pub fn press_all(&mut self, keys: &[Key]) {
        self.pending.extend(keys.iter().copied());
    }

    /// Number of presses not yet polled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl KeySource for MockKeypad {
    fn poll_key(&mut self) -> Option<Key> {
        self.pending.pop_front()
    }
}

/// Mock character display.
///
/// Keeps a 16x2 grid like the real panel plus a log of every line written,
/// so tests can assert on transient messages that were later overwritten.
///
/// # Example
///
/// ```rust
/// use drive_cycle::hal::MockDisplay;
/// use drive_cycle::traits::TextDisplay;
///
/// let mut display = MockDisplay::new();
/// display.show("N is 3", Some("F1-Yes F2-No")).unwrap();
///
/// assert_eq!(display.row(0), "N is 3");
/// assert_eq!(display.row(1), "F1-Yes F2-No");
/// assert!(display.ever_showed("N is"));
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    grid: [[u8; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
    /// Every text passed to `write_at`, in order.
    pub log: Vec<String>,
    /// Number of `clear` calls.
    pub clear_count: usize,
    /// When set, every call fails.
    pub fail_writes: bool,
}

impl MockDisplay {
    /// Creates a blank display.
    pub fn new() -> Self {
        Self {
            grid: [[b' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
            log: Vec::new(),
            clear_count: 0,
            fail_writes: false,
        }
    }

    /// Returns a row with trailing blanks removed.
    pub fn row(&self, row: u8) -> &str {
        self.grid
            .get(row as usize)
            .and_then(|r| core::str::from_utf8(r).ok())
            .map(str::trim_end)
            .unwrap_or("")
    }

    /// True if any write so far contained `needle`.
    pub fn ever_showed(&self, needle: &str) -> bool {
        self.log.iter().any(|line| line.contains(needle))
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDisplay for MockDisplay {
    type Error = ();

    fn clear(&mut self) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.grid = [[b' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize];
        self.clear_count += 1;
        Ok(())
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.log.push(String::from(text));
        let Some(line) = self.grid.get_mut(row as usize) else {
            return Ok(());
        };
        for (cell, byte) in line.iter_mut().skip(col as usize).zip(text.bytes()) {
            *cell = if byte.is_ascii() { byte } else { b'?' };
        }
        Ok(())
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source. As a [`Delay`] it simply advances
/// time, so a blocking main loop runs instantly in tests.
///
/// # Example
///
/// ```rust
/// use drive_cycle::hal::MockClock;
/// use drive_cycle::traits::{Clock, Delay};
///
/// let mut clock = MockClock::new();
/// clock.set(1000);
/// clock.delay_ms(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

impl Delay for MockClock {
    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

//! Hardware abstraction traits for the actuator, limit sensors and timing.
//!
//! This module defines the hardware seams the drive-cycle controller is
//! written against, so the same state machine runs on an ESP32 and against
//! the desktop mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Actuator`] | Two direction lines plus an active-low power enable |
//! | [`LimitSensors`] | Home (origin) and end (far travel) switches |
//! | [`Clock`] | Monotonic millisecond time source |
//! | [`Delay`] | Blocking sleep between main-loop polls |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use drive_cycle::traits::{Actuator, Direction};
//! use drive_cycle::hal::MockActuator;
//!
//! let mut actuator = MockActuator::new();
//! actuator.set_power(true).unwrap();
//! actuator.set_direction(Direction::Extend).unwrap();
//! assert!(actuator.is_energized());
//!
//! actuator.de_energize().unwrap();
//! assert!(!actuator.is_energized());
//! ```

/// Drive direction of the linear actuator.
///
/// Maps onto the two direction output lines:
///
/// | Direction | Line A | Line B |
/// |-----------|--------|--------|
/// | `Idle`    | low    | low    |
/// | `Extend`  | high   | low    |
/// | `Retract` | low    | high   |
///
/// # Default
///
/// Defaults to [`Idle`](Self::Idle) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Drive outward, towards the end sensor.
    Extend,
    /// Drive inward, towards the home sensor.
    Retract,
    /// Both direction lines low.
    #[default]
    Idle,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use drive_cycle::Direction;
    ///
    /// assert_eq!(Direction::Extend.as_str(), "extend");
    /// assert_eq!(Direction::Retract.as_str(), "retract");
    /// assert_eq!(Direction::Idle.as_str(), "idle");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Extend => "extend",
            Direction::Retract => "retract",
            Direction::Idle => "idle",
        }
    }

    /// Returns the opposite travel direction.
    ///
    /// `Idle` has no opposite and maps to itself.
    ///
    /// ```
    /// use drive_cycle::Direction;
    ///
    /// assert_eq!(Direction::Extend.opposite(), Direction::Retract);
    /// assert_eq!(Direction::Retract.opposite(), Direction::Extend);
    /// assert_eq!(Direction::Idle.opposite(), Direction::Idle);
    /// ```
    #[inline]
    pub const fn opposite(&self) -> Self {
        match self {
            Direction::Extend => Direction::Retract,
            Direction::Retract => Direction::Extend,
            Direction::Idle => Direction::Idle,
        }
    }

    /// Logic levels for the (A, B) direction lines.
    #[inline]
    pub const fn line_levels(&self) -> (bool, bool) {
        match self {
            Direction::Extend => (true, false),
            Direction::Retract => (false, true),
            Direction::Idle => (false, false),
        }
    }
}

/// Linear actuator driver: two direction lines and a power-enable line.
///
/// Implement this trait for your output stage. The power-enable line is
/// active-low on the reference hardware; implementations hide that and
/// take a plain `enabled` flag.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use drive_cycle::traits::{Actuator, Direction};
///
/// struct MyActuator { /* pin handles */ }
///
/// impl Actuator for MyActuator {
///     type Error = ();
///
///     fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
///         let (a, b) = dir.line_levels();
///         // write a, b to the H-bridge inputs...
///         Ok(())
///     }
///
///     fn set_power(&mut self, enabled: bool) -> Result<(), ()> {
///         // drive the relay line low when enabled...
///         Ok(())
///     }
/// }
/// ```
pub trait Actuator {
    /// Error type for output operations.
    type Error;

    /// Set the direction lines.
    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error>;

    /// Enable or disable the power line.
    fn set_power(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Drive both direction lines low and disable power.
    fn de_energize(&mut self) -> Result<(), Self::Error> {
        self.set_direction(Direction::Idle)?;
        self.set_power(false)
    }
}

/// Home and end limit switches.
///
/// Both switches are asserted low on the wire; implementations report
/// `true` when the switch is triggered. Readings may be raw: the
/// controller applies its own two-sample check to the start trigger.
pub trait LimitSensors {
    /// Returns true while the home (origin) switch is triggered.
    fn is_home_asserted(&self) -> bool;

    /// Returns true while the end (far travel) switch is triggered.
    fn is_end_asserted(&self) -> bool;

    /// Housekeeping hook called once per control-loop tick.
    ///
    /// Hardware implementations use it to re-arm edge interrupts.
    fn poll(&mut self) {}
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for phase timing.
///
/// # Example
///
/// ```rust
/// use drive_cycle::traits::Clock;
/// use drive_cycle::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Blocking delay used between main-loop polls.
pub trait Delay {
    /// Sleep for the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_default_is_idle() {
        assert_eq!(Direction::default(), Direction::Idle);
    }

    #[test]
    fn direction_line_levels() {
        assert_eq!(Direction::Idle.line_levels(), (false, false));
        assert_eq!(Direction::Extend.line_levels(), (true, false));
        assert_eq!(Direction::Retract.line_levels(), (false, true));
    }

    #[test]
    fn direction_opposite_round_trips() {
        for dir in [Direction::Extend, Direction::Retract, Direction::Idle] {
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    struct TestActuator {
        direction: Direction,
        power: bool,
        calls: usize,
    }

    impl Actuator for TestActuator {
        type Error = ();

        fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
            self.direction = dir;
            self.calls += 1;
            Ok(())
        }

        fn set_power(&mut self, enabled: bool) -> Result<(), ()> {
            self.power = enabled;
            self.calls += 1;
            Ok(())
        }
    }

    #[test]
    fn actuator_de_energize_default_impl() {
        let mut actuator = TestActuator {
            direction: Direction::Retract,
            power: true,
            calls: 0,
        };

        actuator.de_energize().unwrap();

        assert_eq!(actuator.direction, Direction::Idle);
        assert!(!actuator.power);
        assert_eq!(actuator.calls, 2);
    }

    struct FixedSensors;

    impl LimitSensors for FixedSensors {
        fn is_home_asserted(&self) -> bool {
            true
        }

        fn is_end_asserted(&self) -> bool {
            false
        }
    }

    #[test]
    fn limit_sensors_poll_default_is_noop() {
        let mut sensors = FixedSensors;
        sensors.poll();
        assert!(sensors.is_home_asserted());
        assert!(!sensors.is_end_asserted());
    }
}

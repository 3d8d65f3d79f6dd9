//! H-bridge and power relay driver using ESP32 GPIO outputs.
//!
//! The actuator is controlled by two direction lines and a relay:
//! - IN1 (GPIO16): high to extend
//! - IN2 (GPIO17): high to retract
//! - RELAY (GPIO4): supply relay, active low on the common relay boards
//!
//! Control logic:
//! - Extend: IN1 = 1, IN2 = 0
//! - Retract: IN1 = 0, IN2 = 1
//! - Idle: both 0 (the bridge coasts)

use crate::traits::{Actuator, Direction};
use esp_idf_hal::gpio::{AnyOutputPin, Level, Output, PinDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::{gpio_set_level, EspError};

/// Actuator driver for ESP32.
///
/// # Hardware Setup
///
/// - GPIO16 → IN1
/// - GPIO17 → IN2
/// - GPIO4 → relay module IN (active low)
///
/// # Example
///
/// ```ignore
/// use drive_cycle::hal::esp32::Esp32Actuator;
/// use drive_cycle::traits::{Actuator, Direction};
///
/// let peripherals = Peripherals::take()?;
/// let mut actuator = Esp32Actuator::new(
///     peripherals.pins.gpio16.downgrade_output(),
///     peripherals.pins.gpio17.downgrade_output(),
///     peripherals.pins.gpio4.downgrade_output(),
///     true,
/// )?;
///
/// actuator.set_power(true)?;
/// actuator.set_direction(Direction::Extend)?;
/// ```
pub struct Esp32Actuator<'d> {
    in1: PinDriver<'d, AnyOutputPin, Output>,
    in2: PinDriver<'d, AnyOutputPin, Output>,
    relay: PinDriver<'d, AnyOutputPin, Output>,
    relay_active_low: bool,
    direction: Direction,
    powered: bool,
}

impl<'d> Esp32Actuator<'d> {
    /// Creates the driver with everything off.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(
        in1: impl Peripheral<P = AnyOutputPin> + 'd,
        in2: impl Peripheral<P = AnyOutputPin> + 'd,
        relay: impl Peripheral<P = AnyOutputPin> + 'd,
        relay_active_low: bool,
    ) -> Result<Self, EspError> {
        let mut actuator = Self {
            in1: PinDriver::output(in1)?,
            in2: PinDriver::output(in2)?,
            relay: PinDriver::output(relay)?,
            relay_active_low,
            direction: Direction::Idle,
            powered: false,
        };

        actuator.de_energize()?;
        Ok(actuator)
    }

    /// Interrupt-safe handle that forces the outputs off.
    pub fn safe_off(&self) -> SafeOff {
        SafeOff {
            in1: self.in1.pin(),
            in2: self.in2.pin(),
            relay: self.relay.pin(),
            relay_off_level: u32::from(self.relay_active_low),
        }
    }

    /// Last commanded direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last commanded relay state.
    #[inline]
    pub fn is_powered(&self) -> bool {
        self.powered
    }
}

impl Actuator for Esp32Actuator<'_> {
    type Error = EspError;

    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error> {
        let (in1, in2) = dir.line_levels();
        // Break before make so IN1 and IN2 are never high together
        self.in1.set_low()?;
        self.in2.set_low()?;
        self.in1.set_level(Level::from(in1))?;
        self.in2.set_level(Level::from(in2))?;
        self.direction = dir;
        Ok(())
    }

    fn set_power(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.relay
            .set_level(Level::from(enabled != self.relay_active_low))?;
        self.powered = enabled;
        Ok(())
    }
}

/// Raw GPIO numbers of the actuator outputs.
///
/// Used from the pause interrupt, where the pin drivers are owned by the
/// control loop. Only calls `gpio_set_level`, which is safe from ISR
/// context.
#[derive(Clone, Copy, Debug)]
pub struct SafeOff {
    in1: i32,
    in2: i32,
    relay: i32,
    relay_off_level: u32,
}

impl SafeOff {
    /// Drive both direction lines low and open the relay.
    pub fn apply(&self) {
        // Safe: plain register writes on pins configured as outputs at init
        unsafe {
            gpio_set_level(self.in1, 0);
            gpio_set_level(self.in2, 0);
            gpio_set_level(self.relay, self.relay_off_level);
        }
    }
}

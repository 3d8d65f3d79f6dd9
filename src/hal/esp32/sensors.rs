//! Limit switch inputs and the home-sensor pause interrupt.
//!
//! Both switches close to ground; the internal pull-ups hold the lines high
//! when open, so a triggered switch reads low.
//!
//! # Wiring
//!
//! - HOME → GPIO18
//! - END → GPIO19
//! - Common → GND

use crate::latch::PauseLatch;
use crate::traits::LimitSensors;
use esp_idf_hal::gpio::{AnyInputPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;

use super::actuator::SafeOff;
use super::clock::boot_ms_u32;

/// Limit switches for ESP32.
///
/// The home line doubles as the pause button: after
/// [`subscribe_pause`](Self::subscribe_pause) every falling edge is fed to a
/// [`PauseLatch`]. ESP-IDF disables a GPIO interrupt after it fires, so
/// [`poll`](LimitSensors::poll) re-enables it each control-loop tick.
///
/// # Example
///
/// ```ignore
/// use drive_cycle::hal::esp32::Esp32Sensors;
/// use drive_cycle::traits::LimitSensors;
///
/// let peripherals = Peripherals::take()?;
/// let mut sensors = Esp32Sensors::new(
///     peripherals.pins.gpio18.downgrade_input(),
///     peripherals.pins.gpio19.downgrade_input(),
/// )?;
/// sensors.subscribe_pause(&LATCH, actuator.safe_off())?;
///
/// loop {
///     sensors.poll();
///     if sensors.is_end_asserted() {
///         println!("end reached");
///     }
/// }
/// ```
pub struct Esp32Sensors<'d> {
    home: PinDriver<'d, AnyInputPin, Input>,
    end: PinDriver<'d, AnyInputPin, Input>,
    pause_armed: bool,
}

impl<'d> Esp32Sensors<'d> {
    /// Configures both inputs with pull-ups.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(
        home: impl Peripheral<P = AnyInputPin> + 'd,
        end: impl Peripheral<P = AnyInputPin> + 'd,
    ) -> Result<Self, EspError> {
        let mut home = PinDriver::input(home)?;
        let mut end = PinDriver::input(end)?;
        home.set_pull(Pull::Up)?;
        end.set_pull(Pull::Up)?;

        Ok(Self {
            home,
            end,
            pause_armed: false,
        })
    }

    /// Routes falling edges on the home line to `latch`.
    ///
    /// The handler runs in interrupt context. It reads the boot timer and the
    /// home line level, touches atomics and calls `off` on an accepted edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the interrupt cannot be configured.
    pub fn subscribe_pause(
        &mut self,
        latch: &'static PauseLatch<'static>,
        off: SafeOff,
    ) -> Result<(), EspError> {
        self.home.set_interrupt_type(InterruptType::NegEdge)?;
        let home_pin = self.home.pin();

        // Safe: the closure is 'static and only touches atomics and raw GPIO
        // levels, none of which allocate or block
        unsafe {
            self.home.subscribe(move || {
                let now_ms = boot_ms_u32();
                let asserted = esp_idf_hal::sys::gpio_get_level(home_pin) == 0;
                latch.on_edge(now_ms, asserted, || off.apply());
            })?;
        }

        self.home.enable_interrupt()?;
        self.pause_armed = true;
        Ok(())
    }
}

impl LimitSensors for Esp32Sensors<'_> {
    fn is_home_asserted(&self) -> bool {
        self.home.is_low()
    }

    fn is_end_asserted(&self) -> bool {
        self.end.is_low()
    }

    fn poll(&mut self) {
        if self.pause_armed {
            if let Err(e) = self.home.enable_interrupt() {
                log::warn!("failed to re-arm pause interrupt: {:?}", e);
            }
        }
    }
}

//! Time sources for the control loop and the pause interrupt.
//!
//! The control loop reads 64-bit milliseconds through [`Esp32Clock`]. The
//! home-sensor interrupt reads the same boot timer truncated to `u32` via
//! [`boot_ms_u32`], which is what [`PauseLatch`](crate::latch::PauseLatch)
//! compares with wrapping arithmetic.

use crate::traits::{Clock, Delay};
use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::FreeRtos;

/// Milliseconds since boot, wrapping every ~49.7 days.
///
/// ISR-safe: a single read of the esp_timer counter.
#[inline]
pub(crate) fn boot_ms_u32() -> u32 {
    // Safe: reads the hardware timer, no side effects
    let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
    (micros / 1000) as u32
}

/// Control-loop clock over the esp_timer boot counter.
///
/// Phase timers and the start-trigger sample interval are measured against
/// this; it never goes backwards, so dwell and stroke timing survive a
/// pause without drift.
///
/// # Example
///
/// ```ignore
/// use drive_cycle::hal::esp32::Esp32Clock;
/// use drive_cycle::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let tick_start = clock.now_ms();
/// controller.update(tick_start)?;
/// log::debug!("tick took {}ms", clock.now_ms() - tick_start);
/// ```
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates the clock. The timer itself is started by ESP-IDF at boot.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // esp_timer_get_time returns microseconds since boot
        // Safe: this is a simple read of the hardware timer, no side effects
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}

/// Blocking delay that yields to FreeRTOS.
///
/// Sleeping through the scheduler keeps the idle task (and its watchdog)
/// fed between control-loop ticks.
pub struct Esp32Delay {
    inner: FreeRtos,
}

impl Esp32Delay {
    /// Creates a new delay provider.
    pub fn new() -> Self {
        Self { inner: FreeRtos }
    }
}

impl Default for Esp32Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl Delay for Esp32Delay {
    fn delay_ms(&mut self, ms: u32) {
        DelayNs::delay_ms(&mut self.inner, ms);
    }
}

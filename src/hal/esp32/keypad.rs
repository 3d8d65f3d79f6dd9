//! 5x4 membrane keypad scanned through ESP32 GPIO.
//!
//! Rows are driven low one at a time while the pulled-up columns are read;
//! a closed key pulls its column low.
//!
//! # Wiring
//!
//! - Rows → GPIO13, 12, 14, 27, 26
//! - Columns → GPIO25, 33, 32, 15

use crate::traits::{Key, KeySource, KEYPAD_LEGENDS};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_hal::sys::EspError;

/// Number of matrix rows.
pub const ROWS: usize = 5;

/// Number of matrix columns.
pub const COLS: usize = 4;

/// Matrix keypad for ESP32.
///
/// A key is reported once, after it reads closed on [`STABLE_SCANS`]
/// consecutive scans. It is not reported again until every key is released.
/// Keys whose legend has no meaning (UP) are scanned but never reported.
///
/// [`STABLE_SCANS`]: Self::STABLE_SCANS
///
/// # Example
///
/// ```ignore
/// use drive_cycle::hal::esp32::Esp32Keypad;
/// use drive_cycle::traits::KeySource;
///
/// let mut keypad = Esp32Keypad::new(rows, cols)?;
/// loop {
///     if let Some(key) = keypad.poll_key() {
///         println!("{:?}", key);
///     }
/// }
/// ```
pub struct Esp32Keypad<'d> {
    rows: [PinDriver<'d, AnyOutputPin, Output>; ROWS],
    cols: [PinDriver<'d, AnyInputPin, Input>; COLS],
    candidate: Option<(usize, usize)>,
    stable: u8,
    reported: bool,
}

impl<'d> Esp32Keypad<'d> {
    /// Consecutive identical scans before a key is accepted.
    pub const STABLE_SCANS: u8 = 2;

    /// Settling time after driving a row, in microseconds.
    const SETTLE_US: u32 = 5;

    /// Creates the keypad scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(rows: [AnyOutputPin; ROWS], cols: [AnyInputPin; COLS]) -> Result<Self, EspError> {
        let [r0, r1, r2, r3, r4] = rows;
        let mut rows = [
            PinDriver::output(r0)?,
            PinDriver::output(r1)?,
            PinDriver::output(r2)?,
            PinDriver::output(r3)?,
            PinDriver::output(r4)?,
        ];
        for row in rows.iter_mut() {
            row.set_high()?;
        }

        let [c0, c1, c2, c3] = cols;
        let mut cols = [
            PinDriver::input(c0)?,
            PinDriver::input(c1)?,
            PinDriver::input(c2)?,
            PinDriver::input(c3)?,
        ];
        for col in cols.iter_mut() {
            col.set_pull(Pull::Up)?;
        }

        Ok(Self {
            rows,
            cols,
            candidate: None,
            stable: 0,
            reported: false,
        })
    }

    /// Scans the whole matrix and returns the first closed key.
    fn scan(&mut self) -> Result<Option<(usize, usize)>, EspError> {
        let mut found = None;
        for r in 0..ROWS {
            self.rows[r].set_low()?;
            Ets::delay_us(Self::SETTLE_US);
            if found.is_none() {
                found = self
                    .cols
                    .iter()
                    .position(|col| col.is_low())
                    .map(|c| (r, c));
            }
            self.rows[r].set_high()?;
        }
        Ok(found)
    }
}

impl KeySource for Esp32Keypad<'_> {
    fn poll_key(&mut self) -> Option<Key> {
        let pressed = match self.scan() {
            Ok(pressed) => pressed,
            Err(e) => {
                log::warn!("keypad scan failed: {:?}", e);
                return None;
            }
        };

        let Some(position) = pressed else {
            self.candidate = None;
            self.stable = 0;
            self.reported = false;
            return None;
        };

        if self.candidate != Some(position) {
            self.candidate = Some(position);
            self.stable = 1;
            return None;
        }

        self.stable = self.stable.saturating_add(1);
        if self.reported || self.stable < Self::STABLE_SCANS {
            return None;
        }

        self.reported = true;
        let (r, c) = position;
        let key = Key::from_legend(KEYPAD_LEGENDS[r][c]);
        log::trace!("key {} -> {:?}", KEYPAD_LEGENDS[r][c], key);
        key
    }
}

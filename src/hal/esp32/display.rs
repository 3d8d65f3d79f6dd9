//! SSD1306 OLED used as a 16x2 character display.
//!
//! The controller only ever writes two lines of text, so the panel keeps a
//! character grid and redraws it in full after every change.
//!
//! # Wiring
//!
//! - SDA → GPIO21
//! - SCL → GPIO22
//! - VCC → 3.3V
//! - GND → GND

use crate::traits::{TextDisplay, DISPLAY_COLS, DISPLAY_ROWS};
use embedded_graphics::{
    mono_font::{ascii::FONT_8X13, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

/// SSD1306 display type alias for cleaner code.
type DisplayDriver<'d> = Ssd1306<
    I2CInterface<I2cDriver<'d>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// Pixel rows of the two text lines.
const ROW_Y: [i32; DISPLAY_ROWS as usize] = [16, 36];

/// SSD1306 OLED display for ESP32.
///
/// # Display Layout
///
/// ```text
/// ┌────────────────────────────┐
/// │                            │
/// │ Give N value:              │  Row 0
/// │ 12                         │  Row 1
/// │                            │
/// └────────────────────────────┘
/// ```
///
/// `FONT_8X13` puts exactly 16 characters across the 128 pixel width.
pub struct Esp32Display<'d> {
    display: DisplayDriver<'d>,
    grid: [[u8; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
}

impl<'d> Esp32Display<'d> {
    /// Creates and initializes the panel.
    ///
    /// # Arguments
    ///
    /// * `i2c` - I2C driver configured for GPIO21/22
    ///
    /// # Errors
    ///
    /// Returns an error if display initialization fails.
    pub fn new(i2c: I2cDriver<'d>) -> Result<Self, DisplayError> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init()?;

        let mut panel = Self {
            display,
            grid: [[b' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
        };
        panel.redraw()?;
        Ok(panel)
    }

    fn redraw(&mut self) -> Result<(), DisplayError> {
        self.display.clear(BinaryColor::Off)?;
        let style = MonoTextStyle::new(&FONT_8X13, BinaryColor::On);

        for (row, y) in self.grid.iter().zip(ROW_Y) {
            // Grid only ever holds ASCII
            let text = core::str::from_utf8(row).unwrap_or("");
            Text::with_baseline(text, Point::new(0, y), style, Baseline::Top)
                .draw(&mut self.display)?;
        }

        self.display.flush()?;
        Ok(())
    }
}

impl TextDisplay for Esp32Display<'_> {
    type Error = DisplayError;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.grid = [[b' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize];
        self.redraw()
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), Self::Error> {
        let Some(line) = self.grid.get_mut(row as usize) else {
            return Ok(());
        };
        for (cell, byte) in line.iter_mut().skip(col as usize).zip(text.bytes()) {
            *cell = if byte.is_ascii_graphic() || byte == b' ' {
                byte
            } else {
                b'?'
            };
        }
        self.redraw()
    }

    fn show(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error> {
        // One redraw instead of three
        self.grid = [[b' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize];
        for (row, text) in [Some(line1), line2].into_iter().enumerate() {
            if let Some(text) = text {
                for (cell, byte) in self.grid[row].iter_mut().zip(text.bytes()) {
                    *cell = if byte.is_ascii_graphic() || byte == b' ' {
                        byte
                    } else {
                        b'?'
                    };
                }
            }
        }
        self.redraw()
    }
}

/// Display error type.
#[derive(Debug)]
pub struct DisplayError;

impl From<display_interface::DisplayError> for DisplayError {
    fn from(_: display_interface::DisplayError) -> Self {
        DisplayError
    }
}

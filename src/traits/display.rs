//! Character display abstraction.
//!
//! This module defines the [`TextDisplay`] trait: a stateless text sink with
//! a fixed grid of [`DISPLAY_ROWS`] by [`DISPLAY_COLS`] characters, the shape
//! of the 16x2 panel the controller was designed around.

/// Number of text rows on the panel.
pub const DISPLAY_ROWS: u8 = 2;

/// Number of characters per row.
pub const DISPLAY_COLS: u8 = 16;

/// One row of display text.
pub type Line = heapless::String<{ DISPLAY_COLS as usize }>;

/// Display trait for the operator panel.
///
/// The controller only ever clears the panel and writes text at a
/// row/column. There is no read-back.
///
/// # Example
///
/// ```ignore
/// use drive_cycle::traits::TextDisplay;
///
/// struct MyLcd { /* ... */ }
///
/// impl TextDisplay for MyLcd {
///     type Error = ();
///
///     fn clear(&mut self) -> Result<(), ()> { Ok(()) }
///     fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), ()> {
///         // set cursor, print text...
///         Ok(())
///     }
/// }
/// ```
pub trait TextDisplay {
    /// Error type for display operations.
    type Error;

    /// Clears the whole panel.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Writes `text` starting at `row`, `col`.
    ///
    /// Text running past the last column is cut off.
    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), Self::Error>;

    /// Clears the panel and shows one or two lines.
    fn show(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error> {
        self.clear()?;
        self.write_at(0, 0, line1)?;
        if let Some(l2) = line2 {
            self.write_at(1, 0, l2)?;
        }
        Ok(())
    }
}

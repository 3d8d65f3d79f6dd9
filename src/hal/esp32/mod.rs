//! ESP32 DevKitC hardware abstraction layer for the drive-cycle rig.
//!
//! This module provides hardware implementations for an ESP32 DevKitC
//! driving a linear actuator through an H-bridge and a power relay.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 DevKitC (Xtensa dual-core 240MHz)
//! - **Actuator**: H-bridge direction inputs IN1/IN2 plus a relay on the supply
//! - **Sensors**: Two mechanical limit switches to ground (home and end)
//! - **Keypad**: 5x4 membrane matrix
//! - **Display**: SSD1306 128x64 OLED (I2C) used as a 16x2 character grid
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod actuator;
mod clock;
mod keypad;
mod sensors;

pub use actuator::{Esp32Actuator, SafeOff};
pub use clock::{Esp32Clock, Esp32Delay};
pub use keypad::Esp32Keypad;
pub use sensors::Esp32Sensors;

#[cfg(feature = "display")]
mod display;
#[cfg(feature = "display")]
pub use display::{DisplayError, Esp32Display};

/// Pin assignments for the DevKitC.
///
/// The keypad needs nine lines, which is why the rig uses the full DevKitC
/// rather than a C3 module.
pub mod pins {
    // =========================================================================
    // Keypad (5 rows x 4 columns)
    // =========================================================================

    /// Row drive lines, top to bottom
    pub const KEYPAD_ROWS: [i32; 5] = [13, 12, 14, 27, 26];

    /// Column sense lines, left to right (pulled up, read low when pressed)
    pub const KEYPAD_COLS: [i32; 4] = [25, 33, 32, 15];

    // =========================================================================
    // Actuator (H-bridge + relay)
    // =========================================================================

    /// H-bridge IN1, high to extend
    pub const ACTUATOR_IN1: i32 = 16;

    /// H-bridge IN2, high to retract
    pub const ACTUATOR_IN2: i32 = 17;

    /// Power relay coil driver (active low)
    pub const POWER_RELAY: i32 = 4;

    // =========================================================================
    // Limit switches (to ground, internal pull-ups)
    // =========================================================================

    /// Home switch: start trigger and pause button
    pub const HOME_SWITCH: i32 = 18;

    /// End switch: reversal complete
    pub const END_SWITCH: i32 = 19;

    // =========================================================================
    // I2C Display (SSD1306)
    // =========================================================================

    /// I2C data line
    pub const I2C_SDA: i32 = 21;

    /// I2C clock line
    pub const I2C_SCL: i32 = 22;

    /// Default I2C address for SSD1306 OLED
    pub const OLED_I2C_ADDR: u8 = 0x3C;
}

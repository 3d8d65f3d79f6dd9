//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that let the drive-cycle controller:
//! - Run on an ESP32 with real GPIO, keypad and display
//! - Run on the desktop against mocks for tests and simulation
//!
//! # Submodules
//!
//! - `hardware`: Actuator outputs, limit sensors, clock, delay
//! - `input`: Keypad alphabet and key source
//! - `display`: Character display sink
//!
//! # Hardware Abstraction
//!
//! - [`Actuator`]: Direction lines plus power enable
//! - [`LimitSensors`]: Home and end switches
//! - [`KeySource`]: One key event per poll
//! - [`TextDisplay`]: Clear and write-at-position
//! - [`Clock`]: Time source for `no_std` environments

pub mod display;
pub mod hardware;
pub mod input;

pub use display::*;
pub use hardware::*;
pub use input::*;

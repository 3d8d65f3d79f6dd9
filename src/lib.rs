//! # drive-cycle
//!
//! Firmware for an operator-driven linear actuator test rig: a 5x4 keypad,
//! a 16x2 text display, two limit switches and an H-bridge with a power
//! relay.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for actuator outputs, limit sensors, keypad and display
//! - **Guided setup**: Direction calibration, two-digit cycle count, confirmation
//! - **Timed cycles**: N dwell/stroke cycles started by the home sensor, then a reversal to the end sensor
//! - **Pause latch**: Interrupt-driven toggle with a refractory interval and suspendable timers
//! - **Safety**: STOP de-energizes within one poll from any state, RESET always returns to calibration
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `latch` - Flags shared with the pause interrupt
//! - `wait` - Checkpointed waits and phase timing
//! - `entry` - Cycle-count entry and run configuration
//! - `controller` - Main state machine that ties everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use drive_cycle::{
//!     hal::{MockActuator, MockDisplay, MockKeypad, MockSensors},
//!     latch::SharedFlags,
//!     Config, CycleController, Key, Phase,
//! };
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
//! // Operator skips calibration, enters N = 1 and accepts it
//! controller
//!     .keypad_mut()
//!     .press_all(&[Key::Skip, Key::Digit(1), Key::Confirm, Key::Confirm]);
//!
//! // Update in your main loop
//! let mut now = 0;
//! for _ in 0..4 {
//!     controller.update(now).unwrap();
//!     now += 10;
//! }
//! assert_eq!(controller.phase(), Phase::AwaitTrigger);
//!
//! // STOP is honoured from anywhere
//! controller.keypad_mut().press(Key::Stop);
//! controller.update(now).unwrap();
//! assert_eq!(controller.phase(), Phase::Stopped);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Timing constants, protocol policies and device identity.
pub mod config;
/// Main drive-cycle controller that coordinates input, timing and hardware.
pub mod controller;
/// Cycle-count entry and the run configuration it produces.
pub mod entry;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Pause latch and the flags shared with interrupt context.
pub mod latch;
/// Core traits for hardware abstraction.
pub mod traits;
/// Checkpointed waits, suspendable phase timers and trigger debounce.
pub mod wait;

// Re-exports for convenience
pub use controller::{CycleController, CycleState, Phase, RunState, Stage};
pub use entry::{CountEntry, CycleConfig};
pub use latch::{PauseLatch, SharedFlags};
pub use traits::{
    // Hardware
    Actuator,
    Clock,
    Delay,
    Direction,
    // Input
    Key,
    KeySource,
    LimitSensors,
    // Display
    TextDisplay,
};
pub use wait::{Checkpoint, DoubleSample, PhaseTimer, WaitStatus};

// Config re-exports
pub use config::{CompletionPolicy, Config, DeviceConfig, PolicyConfig, StopPolicy, TimingConfig};

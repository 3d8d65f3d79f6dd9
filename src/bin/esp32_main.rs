//! ESP32 DevKitC drive-cycle rig controller.
//!
//! This is the main entry point for the physical hardware controller.
//! It runs a 100Hz control loop that:
//! - Scans the 5x4 keypad
//! - Polls the limit switches and re-arms the pause interrupt
//! - Steps the drive-cycle state machine
//! - Drives the H-bridge and power relay
//! - Shows prompts on the OLED panel (if enabled)
//!
//! The home switch is also wired to a falling-edge interrupt that toggles
//! pause and forces the outputs off without waiting for the loop.
//!
//! # Build
//!
//! ```bash
//! # Basic (prompts go to the serial log)
//! cargo build --release --features esp32
//!
//! # With display
//! cargo build --release --features esp32,display
//!
//! # Flash and monitor
//! espflash flash --monitor target/xtensa-esp32-espidf/release/esp32_main
//! ```

use drive_cycle::hal::esp32::{Esp32Actuator, Esp32Clock, Esp32Delay, Esp32Keypad, Esp32Sensors};
use drive_cycle::latch::{PauseLatch, SharedFlags};
use drive_cycle::traits::{Clock, Delay, TextDisplay};
use drive_cycle::{Config, CycleController, DeviceConfig, Phase, TimingConfig};
use esp_idf_hal::gpio::{InputPin, OutputPin};
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info};

/// Minimum time between accepted pause presses
const REFRACTORY_MS: u32 = 150;

/// Banner hold time before the first prompt
const BANNER_MS: u32 = 500;

/// The relay board energizes its coil when the input is pulled low
const RELAY_ACTIVE_LOW: bool = true;

static FLAGS: SharedFlags = SharedFlags::new();
static LATCH: PauseLatch<'static> = PauseLatch::new(&FLAGS, REFRACTORY_MS);

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("================================");
    info!("  drive-cycle DevKitC controller");
    info!("================================");

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_timing(TimingConfig::default().with_refractory_ms(REFRACTORY_MS))
        .with_device(
            DeviceConfig::default().with_name(option_env!("RIG_NAME").unwrap_or("Drive Cycle")),
        );
    let poll_interval_ms = config.timing.poll_interval_ms;

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // =========================================================================
    // Initialize Actuator (H-bridge on GPIO16/17, relay on GPIO4)
    // =========================================================================
    let actuator = Esp32Actuator::new(
        pins.gpio16.downgrade_output(),
        pins.gpio17.downgrade_output(),
        pins.gpio4.downgrade_output(),
        RELAY_ACTIVE_LOW,
    )?;
    info!("[OK] Actuator initialized (GPIO16/17, relay GPIO4)");

    // =========================================================================
    // Initialize Limit Switches (GPIO18/19) and the pause interrupt
    // =========================================================================
    let mut sensors = Esp32Sensors::new(
        pins.gpio18.downgrade_input(),
        pins.gpio19.downgrade_input(),
    )?;
    sensors.subscribe_pause(&LATCH, actuator.safe_off())?;
    info!(
        "[OK] Limit switches initialized (GPIO18/19), pause refractory {}ms",
        LATCH.refractory_ms()
    );

    // =========================================================================
    // Initialize Keypad (rows GPIO13/12/14/27/26, cols GPIO25/33/32/15)
    // =========================================================================
    let keypad = Esp32Keypad::new(
        [
            pins.gpio13.downgrade_output(),
            pins.gpio12.downgrade_output(),
            pins.gpio14.downgrade_output(),
            pins.gpio27.downgrade_output(),
            pins.gpio26.downgrade_output(),
        ],
        [
            pins.gpio25.downgrade_input(),
            pins.gpio33.downgrade_input(),
            pins.gpio32.downgrade_input(),
            pins.gpio15.downgrade_input(),
        ],
    )?;
    info!("[OK] Keypad initialized");

    // =========================================================================
    // Initialize Display (SSD1306 on GPIO21/22) - Optional
    // =========================================================================
    #[cfg(feature = "display")]
    let mut display = {
        use drive_cycle::hal::esp32::Esp32Display;
        use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
        use esp_idf_hal::prelude::*;

        let i2c = I2cDriver::new(
            peripherals.i2c0,
            pins.gpio21, // SDA
            pins.gpio22, // SCL
            &I2cConfig::new().baudrate(400.kHz().into()),
        )?;

        let disp =
            Esp32Display::new(i2c).map_err(|e| anyhow::anyhow!("Display init failed: {:?}", e))?;
        info!("[OK] Display initialized (GPIO21/22 I2C)");
        disp
    };

    #[cfg(not(feature = "display"))]
    let mut display = LogDisplay;

    let clock = Esp32Clock::new();
    let mut delay = Esp32Delay::new();

    if let Err(e) = display.show("Welcome", Some(config.device.name.as_str())) {
        error!("banner failed: {:?}", e);
    }
    delay.delay_ms(BANNER_MS);

    // =========================================================================
    // Initialize Controller
    // =========================================================================
    let mut controller = CycleController::new(actuator, sensors, keypad, display, &FLAGS, config);
    controller
        .init()
        .map_err(|e| anyhow::anyhow!("actuator init failed: {:?}", e))?;

    info!("Starting control loop ({}ms)...", poll_interval_ms);

    // =========================================================================
    // Main Control Loop
    // =========================================================================
    let mut last_phase = Phase::Idle;
    loop {
        let now = clock.now_ms();

        match controller.update(now) {
            Ok(phase) if phase != last_phase => {
                info!("phase: {} -> {}", last_phase.as_str(), phase.as_str());
                last_phase = phase;
            }
            Ok(_) => {}
            Err(e) => {
                error!("actuator write failed: {:?}", e);
                if let Err(e) = controller.stop() {
                    error!("stop failed: {:?}", e);
                }
            }
        }

        // Sleep until next tick
        delay.delay_ms(poll_interval_ms);
    }
}

/// Serial-log stand-in for builds without the OLED panel.
#[cfg(not(feature = "display"))]
struct LogDisplay;

#[cfg(not(feature = "display"))]
impl TextDisplay for LogDisplay {
    type Error = core::convert::Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn write_at(&mut self, row: u8, _col: u8, text: &str) -> Result<(), Self::Error> {
        info!("[lcd{}] {}", row, text);
        Ok(())
    }
}

//! Desktop simulation of one complete drive-cycle session.
//!
//! Runs the controller against mock hardware and a simulated clock, playing
//! an operator script: calibrate, enter N = 03, confirm, press home, pause
//! mid-run, resume, and let the reversal reach the end switch.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example simulate
//! ```

use drive_cycle::hal::{MockActuator, MockClock, MockDisplay, MockKeypad, MockSensors};
use drive_cycle::latch::{PauseLatch, SharedFlags};
use drive_cycle::traits::{Clock, Delay};
use drive_cycle::{Config, CycleController, Key, Phase, TimingConfig};

static FLAGS: SharedFlags = SharedFlags::new();
static LATCH: PauseLatch<'static> = PauseLatch::new(&FLAGS, 150);

type Controller = CycleController<'static, MockActuator, MockSensors, MockKeypad, MockDisplay>;

fn main() {
    println!("=================================");
    println!("  drive-cycle Desktop Simulation");
    println!("=================================");
    println!();

    // Shorter dwell so the session fits in a few simulated seconds
    let config = Config::default().with_timing(TimingConfig::default().with_dwell_ms_per_unit(200));
    let poll_ms = config.timing.poll_interval_ms;

    let mut controller = CycleController::new(
        MockActuator::new(),
        MockSensors::new(),
        MockKeypad::new(),
        MockDisplay::new(),
        &FLAGS,
        config,
    );
    if controller.init().is_err() {
        println!("actuator init failed");
        return;
    }

    let mut clock = MockClock::new();
    let mut screen = Screen::default();
    screen.print_if_changed(&controller, clock.now_ms());

    // Operator: calibrate forward, then N = 03 and accept
    controller.keypad_mut().press_all(&[
        Key::DirRight,
        Key::Digit(0),
        Key::Digit(3),
        Key::Confirm,
        Key::Confirm,
    ]);

    let mut pressed_home = false;
    let mut paused_once = false;
    let mut resumed = false;

    while clock.now_ms() < 60_000 {
        let now = clock.now_ms();

        let phase = match controller.update(now) {
            Ok(phase) => phase,
            Err(()) => {
                println!("[{:>6}ms] actuator write failed", now);
                break;
            }
        };
        screen.print_if_changed(&controller, now);

        match phase {
            // Press and hold home long enough for the two-sample check
            Phase::AwaitTrigger if !pressed_home => {
                controller.sensors_mut().home = true;
                LATCH.on_edge(now as u32, true, || controller.actuator_mut().force_off());
                pressed_home = true;
            }
            Phase::Dwelling if pressed_home && controller.sensors().home => {
                controller.sensors_mut().home = false;
            }

            // Pause in the middle of the second stroke, resume a second later
            Phase::Extending if controller.run_state().current_cycle == 1 && !paused_once => {
                if controller.phase_remaining_ms(now) < 1_500 {
                    println!("[{:>6}ms] -- operator presses home (pause)", now);
                    LATCH.on_edge(now as u32, true, || controller.actuator_mut().force_off());
                    paused_once = true;
                }
            }
            Phase::Paused if !resumed && now % 1_000 == 0 => {
                println!("[{:>6}ms] -- operator presses home (resume)", now);
                LATCH.on_edge(now as u32, true, || {});
                resumed = true;
            }

            // The actuator reaches the far end some time into the reversal
            Phase::ReversingHome if !controller.sensors().end => {
                if controller.phase_remaining_ms(now) == 0 && now % 500 == 0 {
                    controller.sensors_mut().end = true;
                }
            }
            Phase::AwaitTrigger if controller.limit_switch_count() > 0 => break,
            _ => {}
        }

        clock.delay_ms(poll_ms);
    }

    let state = controller.state();
    println!();
    println!(
        "Finished: {} limit switch arrival(s), phase {}",
        state.limit_switch_count,
        state.phase.as_str()
    );
    println!(
        "Extend strokes driven: {}",
        controller.actuator().strokes(drive_cycle::Direction::Extend)
    );
}

/// Prints the 16x2 panel whenever its contents change.
#[derive(Default)]
struct Screen {
    rows: [String; 2],
}

impl Screen {
    fn print_if_changed(&mut self, controller: &Controller, now: u64) {
        let display = controller.display();
        let rows = [display.row(0).to_string(), display.row(1).to_string()];
        if rows != self.rows {
            println!("[{:>6}ms] +----------------+", now);
            for row in &rows {
                println!("           |{:<16}|", row);
            }
            println!("           +----------------+");
            self.rows = rows;
        }
    }
}

//! Edge case and boundary condition tests for the drive-cycle controller

use drive_cycle::hal::{MockActuator, MockDisplay, MockKeypad, MockSensors};
use drive_cycle::latch::{PauseLatch, SharedFlags};
use drive_cycle::{
    Config, CycleController, Direction, Key, Phase, PolicyConfig, Stage, StopPolicy, TimingConfig,
};

type Controller<'f> = CycleController<'f, MockActuator, MockSensors, MockKeypad, MockDisplay>;

fn controller(flags: &SharedFlags, config: Config) -> Controller<'_> {
    let mut c = CycleController::new(
        MockActuator::new(),
        MockSensors::new(),
        MockKeypad::new(),
        MockDisplay::new(),
        flags,
        config,
    );
    c.init().unwrap();
    c
}

/// Feeds `keys` one per tick starting at `*now`.
fn press(c: &mut Controller<'_>, now: &mut u64, keys: &[Key]) {
    for &key in keys {
        c.keypad_mut().press(key);
        c.update(*now).unwrap();
        *now += 10;
    }
}

fn hold_home_until_start(c: &mut Controller<'_>, now: &mut u64) {
    c.sensors_mut().home = true;
    while c.phase() == Phase::AwaitTrigger {
        c.update(*now).unwrap();
        *now += 10;
    }
    c.sensors_mut().home = false;
}

// ============================================================================
// Boundary Values
// ============================================================================

#[test]
fn zero_cycles_goes_straight_to_reversal() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::Skip, Key::Confirm, Key::Confirm]);
    assert_eq!(c.cycle_config().target_cycles, 0);

    hold_home_until_start(&mut c, &mut now);
    assert_eq!(c.phase(), Phase::ReversingHome);

    c.sensors_mut().end = true;
    c.update(now).unwrap();
    assert_eq!(c.display().row(1), "Cycles 0  LS 1");
}

#[test]
fn ninety_nine_cycles_dwell_ninety_nine_seconds() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(
        &mut c,
        &mut now,
        &[Key::Skip, Key::Digit(9), Key::Digit(9), Key::Confirm, Key::Confirm],
    );
    hold_home_until_start(&mut c, &mut now);

    assert_eq!(c.cycle_config().target_cycles, 99);
    assert_eq!(c.phase_remaining_ms(now - 10), 99_000);
}

#[test]
fn dwell_scale_follows_config() {
    let flags = SharedFlags::new();
    let config = Config::default().with_timing(TimingConfig::default().with_dwell_ms_per_unit(250));
    let mut c = controller(&flags, config);
    let mut now = 0;

    press(
        &mut c,
        &mut now,
        &[Key::Skip, Key::Digit(4), Key::Confirm, Key::Confirm],
    );
    hold_home_until_start(&mut c, &mut now);

    assert_eq!(c.phase_remaining_ms(now - 10), 1_000);
}

#[test]
fn entry_with_no_digits_is_zero() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::Back, Key::Confirm]);

    assert_eq!(c.stage(), Stage::Confirmation);
    assert_eq!(c.display().row(0), "N is 0");
}

// ============================================================================
// Setup Navigation
// ============================================================================

#[test]
fn back_in_calibration_enters_count_entry() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::Back]);
    assert_eq!(c.stage(), Stage::CountEntry);
}

#[test]
fn repeated_calibration_strokes_keep_last_direction() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::DirRight]);
    // A second key during the stroke is dropped
    press(&mut c, &mut now, &[Key::DirLeft]);
    assert_eq!(c.phase(), Phase::Extending);

    while c.phase() != Phase::Idle {
        c.update(now).unwrap();
        now += 10;
    }
    assert_eq!(c.stage(), Stage::CountEntry);
    assert_eq!(c.cycle_config().direction, Direction::Extend);
    assert!(!c.actuator().power);
}

#[test]
fn pause_latched_during_setup_does_not_block_entry() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    flags.set_paused(true);
    press(
        &mut c,
        &mut now,
        &[Key::Skip, Key::Digit(1), Key::Confirm, Key::Confirm],
    );
    assert_eq!(c.phase(), Phase::AwaitTrigger);

    hold_home_until_start(&mut c, &mut now);
    assert_eq!(c.phase(), Phase::Dwelling);
    assert!(!flags.is_paused());
}

#[test]
fn pause_during_calibration_stroke() {
    let flags = SharedFlags::new();
    let latch = PauseLatch::new(&flags, 150);
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::DirRight]);
    latch.on_edge(now as u32, true, || c.actuator_mut().force_off());
    c.update(now).unwrap();
    assert_eq!(c.phase(), Phase::Paused);
    assert_eq!(c.stage(), Stage::Calibration);

    now += 1_000;
    latch.on_edge(now as u32, true, || {});
    c.update(now).unwrap();

    assert_eq!(c.phase(), Phase::Extending);
    assert_eq!(c.actuator().direction, Direction::Extend);
    // Calibration never closes the relay
    assert!(!c.actuator().power);
}

// ============================================================================
// Stop and Reset Corners
// ============================================================================

#[test]
fn stop_during_setup() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::Skip, Key::Digit(3), Key::Stop]);

    assert_eq!(c.phase(), Phase::Stopped);
    // Digits are not accepted while stopped
    press(&mut c, &mut now, &[Key::Digit(5)]);
    assert_eq!(c.phase(), Phase::Stopped);
    assert_eq!(c.cycle_config().target_cycles, 0);
}

#[test]
fn second_stop_while_stopped_is_harmless() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::Stop, Key::Stop]);
    assert_eq!(c.phase(), Phase::Stopped);

    press(&mut c, &mut now, &[Key::Confirm]);
    assert_eq!(c.stage(), Stage::Calibration);
}

#[test]
fn reset_during_calibration_stroke_de_energizes() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::DirLeft]);
    assert!(c.actuator().is_energized());

    press(&mut c, &mut now, &[Key::Reset]);
    assert!(!c.actuator().is_energized());
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn reset_clears_limit_switch_count() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(&mut c, &mut now, &[Key::Skip, Key::Confirm, Key::Confirm]);
    hold_home_until_start(&mut c, &mut now);
    c.sensors_mut().end = true;
    c.update(now).unwrap();
    assert_eq!(c.limit_switch_count(), 1);

    c.reset().unwrap();
    assert_eq!(c.limit_switch_count(), 0);
}

// ============================================================================
// Hardware Failures
// ============================================================================

#[test]
fn broken_display_does_not_stop_the_run() {
    let flags = SharedFlags::new();
    let mut display = MockDisplay::new();
    display.fail_writes = true;
    let mut c = CycleController::new(
        MockActuator::new(),
        MockSensors::new(),
        MockKeypad::new(),
        display,
        &flags,
        Config::default(),
    );
    c.init().unwrap();
    let mut now = 0;

    press(
        &mut c,
        &mut now,
        &[Key::Skip, Key::Digit(1), Key::Confirm, Key::Confirm],
    );
    hold_home_until_start(&mut c, &mut now);
    assert_eq!(c.phase(), Phase::Dwelling);
    assert!(c.display().log.is_empty());
}

#[test]
fn actuator_failure_surfaces_and_stop_recovers() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());
    let mut now = 0;

    press(
        &mut c,
        &mut now,
        &[Key::Skip, Key::Digit(1), Key::Confirm, Key::Confirm],
    );
    c.actuator_mut().fail_writes = true;
    c.sensors_mut().home = true;

    let mut failed = false;
    for _ in 0..10 {
        if c.update(now).is_err() {
            failed = true;
            break;
        }
        now += 10;
    }
    assert!(failed);

    c.actuator_mut().fail_writes = false;
    c.stop().unwrap();
    assert_eq!(c.phase(), Phase::Stopped);
    assert!(!c.actuator().is_energized());
}

#[test]
fn stop_with_failed_write_still_shows_stop_screen() {
    let flags = SharedFlags::new();
    let mut c = controller(&flags, Config::default());

    c.actuator_mut().fail_writes = true;
    assert!(c.stop().is_err());

    assert_eq!(c.phase(), Phase::Stopped);
    assert!(flags.is_emergency_stop());
    assert_eq!(c.display().row(0), "All stopped!");
    assert_eq!(c.display().row(1), "ENTER to reset");
}

#[test]
fn stop_with_failed_write_still_resets_immediately() {
    let flags = SharedFlags::new();
    let config = Config::default()
        .with_policy(PolicyConfig::default().with_on_stop(StopPolicy::ResetImmediately));
    let mut c = controller(&flags, config);
    let mut now = 0;
    press(&mut c, &mut now, &[Key::Skip, Key::Digit(2)]);

    c.actuator_mut().fail_writes = true;
    assert!(c.stop().is_err());

    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.stage(), Stage::Calibration);
    assert!(!flags.is_emergency_stop());
    assert_eq!(c.display().row(0), "System reset");
}

//! Drive-cycle controller: the state machine that ties everything together.
//!
//! This module provides [`CycleController`], which owns the actuator,
//! sensors, keypad and display and walks the operator through:
//!
//! 1. Direction calibration
//! 2. Cycle-count entry and confirmation
//! 3. Waiting for the home-sensor start trigger
//! 4. N timed dwell/stroke cycles
//! 5. Reversal until the end sensor, then the tally report
//!
//! STOP and RESET are honoured from every state. Pause is driven by the
//! home-sensor interrupt through [`SharedFlags`].
//!
//! # Example
//!
//! ```rust
//! use drive_cycle::hal::{MockActuator, MockDisplay, MockKeypad, MockSensors};
//! use drive_cycle::latch::SharedFlags;
//! use drive_cycle::{Config, CycleController, Key, Phase};
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
//! // Skip calibration, enter N = 2, confirm twice
//! controller
//!     .keypad_mut()
//!     .press_all(&[Key::Skip, Key::Digit(2), Key::Confirm, Key::Confirm]);
//! for tick in 0..4 {
//!     controller.update(tick * 10).unwrap();
//! }
//! assert_eq!(controller.phase(), Phase::AwaitTrigger);
//! assert_eq!(controller.cycle_config().target_cycles, 2);
//!
//! // Main loop - call update() every poll interval
//! controller.sensors_mut().home = true;
//! controller.update(100).unwrap();
//! controller.update(150).unwrap();
//! assert_eq!(controller.phase(), Phase::Dwelling);
//! ```
//!
//! # Timing
//!
//! `update` never blocks. Each call is one poll of whatever the current
//! phase waits on, with the stop and pause checkpoints evaluated first.
//! Phase durations are measured against the `now_ms` passed in, so a pause
//! freezes the remaining time instead of restarting the phase.

use core::fmt::{self, Write as _};

use log::{debug, info, warn};

use crate::config::{CompletionPolicy, Config, DeviceConfig, PolicyConfig, StopPolicy, TimingConfig};
use crate::entry::{CountEntry, CycleConfig};
use crate::latch::SharedFlags;
use crate::traits::{Actuator, Direction, Key, KeySource, LimitSensors, Line, TextDisplay};
use crate::wait::{poll_until, DoubleSample, PhaseTimer, WaitStatus, RUN_CHECKPOINTS};

/// What the actuator is doing right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    /// No motion; configuration screens are active.
    #[default]
    Idle,
    /// Configured and waiting for the home-sensor start trigger.
    AwaitTrigger,
    /// Power enabled, direction lines idle, dwell timer running.
    Dwelling,
    /// Driving outward (calibration stroke or work stroke).
    Extending,
    /// Driving inward (calibration stroke or work stroke).
    Retracting,
    /// Returning after the last cycle, waiting for the end sensor.
    ReversingHome,
    /// Motion suspended by the pause latch.
    Paused,
    /// Emergency stop latched.
    Stopped,
}

impl Phase {
    /// Returns the phase as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitTrigger => "await_trigger",
            Phase::Dwelling => "dwelling",
            Phase::Extending => "extending",
            Phase::Retracting => "retracting",
            Phase::ReversingHome => "reversing_home",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
        }
    }

    fn stroke(dir: Direction) -> Self {
        match dir {
            Direction::Retract => Phase::Retracting,
            _ => Phase::Extending,
        }
    }
}

/// Which operator screen owns the keypad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Stage {
    /// Choosing the direction, optionally with a calibration stroke.
    #[default]
    Calibration,
    /// Typing the cycle count.
    CountEntry,
    /// Yes/no on the typed count.
    Confirmation,
    /// Configuration done; the run loop owns the actuator.
    Operation,
}

/// Run-loop progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunState {
    /// Cycles completed in the current run.
    pub current_cycle: u16,
    /// Current phase.
    pub phase: Phase,
    /// Cycle to continue from after a pause.
    pub resume_cycle: u16,
}

/// Drive-cycle controller.
///
/// # Type Parameters
///
/// - `A`: actuator outputs ([`Actuator`])
/// - `S`: limit switches ([`LimitSensors`])
/// - `K`: keypad ([`KeySource`])
/// - `D`: operator display ([`TextDisplay`])
///
/// # Shared State
///
/// The controller borrows the [`SharedFlags`] that the pause interrupt also
/// holds. Flags are read at the top of each tick, never between the writes
/// of one output change.
pub struct CycleController<'f, A, S, K, D> {
    actuator: A,
    sensors: S,
    keypad: K,
    display: D,
    flags: &'f SharedFlags,
    timing: TimingConfig,
    policy: PolicyConfig,
    device: DeviceConfig,
    config: CycleConfig,
    run: RunState,
    stage: Stage,
    entry: CountEntry,
    timer: PhaseTimer,
    trigger: DoubleSample,
    interrupted: Option<Phase>,
    limit_switch_count: u32,
}

impl<'f, A, S, K, D> CycleController<'f, A, S, K, D>
where
    A: Actuator,
    S: LimitSensors,
    K: KeySource,
    D: TextDisplay,
    D::Error: fmt::Debug,
{
    /// Create a new controller. Call [`init`](Self::init) before the first
    /// [`update`](Self::update).
    pub fn new(
        actuator: A,
        sensors: S,
        keypad: K,
        display: D,
        flags: &'f SharedFlags,
        config: Config,
    ) -> Self {
        Self {
            actuator,
            sensors,
            keypad,
            display,
            flags,
            trigger: DoubleSample::new(config.timing.trigger_debounce_ms),
            timing: config.timing,
            policy: config.policy,
            device: config.device,
            config: CycleConfig::default(),
            run: RunState::default(),
            stage: Stage::Calibration,
            entry: CountEntry::new(),
            timer: PhaseTimer::new(),
            interrupted: None,
            limit_switch_count: 0,
        }
    }

    /// De-energize the outputs, clear the flags and show the calibration
    /// prompt.
    pub fn init(&mut self) -> Result<(), A::Error> {
        self.flags.clear();
        self.actuator.de_energize()?;
        info!("{} ready", self.device.name);
        self.enter_calibration();
        Ok(())
    }

    /// Advance the state machine by one poll.
    ///
    /// Call every [`TimingConfig::poll_interval_ms`] from the main loop.
    /// Returns the phase after the tick.
    pub fn update(&mut self, now_ms: u64) -> Result<Phase, A::Error> {
        self.sensors.poll();
        let key = self.keypad.poll_key();

        match key {
            Some(Key::Reset) => {
                self.reset()?;
                return Ok(self.run.phase);
            }
            Some(Key::Stop) if self.run.phase != Phase::Stopped => self.flags.request_stop(),
            _ => {}
        }

        if self.run.phase == Phase::Stopped {
            if key == Some(Key::Confirm) {
                info!("stop acknowledged");
                self.reset()?;
            }
            return Ok(self.run.phase);
        }

        if self.flags.is_emergency_stop() {
            self.stop()?;
            return Ok(self.run.phase);
        }

        match self.run.phase {
            Phase::Idle => self.handle_setup_key(key, now_ms)?,
            Phase::AwaitTrigger => self.poll_trigger(now_ms)?,
            Phase::Paused => self.poll_paused(now_ms)?,
            Phase::Dwelling | Phase::Extending | Phase::Retracting | Phase::ReversingHome => {
                self.poll_motion(now_ms)?
            }
            Phase::Stopped => {}
        }

        Ok(self.run.phase)
    }

    /// De-energize immediately and latch the emergency stop.
    ///
    /// Depending on [`StopPolicy`] the controller then either waits for a
    /// CONFIRM acknowledgement or resets straight away.
    pub fn stop(&mut self) -> Result<(), A::Error> {
        self.flags.request_stop();
        let was = self.run.phase;
        self.run.phase = Phase::Stopped;
        self.interrupted = None;
        self.timer.reset();
        self.config = CycleConfig::default();
        // The stop screen and policy still apply when the write fails
        let off = self.actuator.de_energize();
        warn!(
            "emergency stop in {} at cycle {}",
            was.as_str(),
            self.run.current_cycle
        );

        let settled = match self.policy.on_stop {
            StopPolicy::AcknowledgeThenReset => {
                self.show("All stopped!", Some("ENTER to reset"));
                Ok(())
            }
            StopPolicy::ResetImmediately => {
                self.show("All stopped!", None);
                self.reset()
            }
        };
        off.and(settled)
    }

    /// Full reset: clears all run state, counters and flags, de-energizes
    /// and returns to direction calibration. Idempotent.
    pub fn reset(&mut self) -> Result<(), A::Error> {
        self.flags.clear();
        self.run = RunState::default();
        self.config = CycleConfig::default();
        self.stage = Stage::Calibration;
        self.entry.clear();
        self.timer.reset();
        self.trigger.reset();
        self.interrupted = None;
        self.limit_switch_count = 0;
        let off = self.actuator.de_energize();
        info!("system reset");
        self.show("System reset", Some("Select direction"));
        off
    }

    // ------------------------------------------------------------------
    // Input acquisition
    // ------------------------------------------------------------------

    fn handle_setup_key(&mut self, key: Option<Key>, now_ms: u64) -> Result<(), A::Error> {
        let Some(key) = key else {
            return Ok(());
        };

        match (self.stage, key) {
            (Stage::Calibration, Key::DirLeft) => {
                self.begin_calibration_stroke(Direction::Retract, now_ms)?
            }
            (Stage::Calibration, Key::DirRight) => {
                self.begin_calibration_stroke(Direction::Extend, now_ms)?
            }
            (Stage::Calibration, Key::Skip | Key::Back) => {
                debug!("calibration skipped");
                self.enter_count_entry();
            }

            (Stage::CountEntry, Key::Digit(_)) => {
                let accepted = key.digit().is_some_and(|d| self.entry.push(d));
                if accepted {
                    let value = line(format_args!("{}", self.entry.value()));
                    self.write_row(1, &value);
                }
            }
            (Stage::CountEntry, Key::Confirm) => self.enter_confirmation(),
            (Stage::CountEntry, Key::Back) => {
                self.entry.clear();
                self.enter_calibration();
            }
            (Stage::CountEntry, Key::Skip) => {
                self.config.apply_count(self.entry.value());
                self.accept_config();
            }

            (Stage::Confirmation, Key::Confirm) => self.accept_config(),
            (Stage::Confirmation, Key::Reject) => self.enter_count_entry(),

            _ => debug!("ignored {:?} in {:?}", key, self.stage),
        }
        Ok(())
    }

    fn enter_calibration(&mut self) {
        self.stage = Stage::Calibration;
        self.run.phase = Phase::Idle;
        self.show("Select direction", None);
    }

    fn begin_calibration_stroke(&mut self, dir: Direction, now_ms: u64) -> Result<(), A::Error> {
        self.config.direction = dir;
        self.run.phase = Phase::stroke(dir);
        self.timer
            .start(u64::from(self.timing.calibration_stroke_ms), now_ms);
        self.actuator.set_direction(dir)?;
        info!("calibration stroke {}", dir.as_str());
        match dir {
            Direction::Retract => self.show("Motor reversing", None),
            _ => self.show("Motor forward", None),
        }
        Ok(())
    }

    fn enter_count_entry(&mut self) {
        self.stage = Stage::CountEntry;
        self.run.phase = Phase::Idle;
        self.entry.clear();
        self.config.apply_count(0);
        self.show("Give N value:", None);
    }

    fn enter_confirmation(&mut self) {
        self.config.apply_count(self.entry.value());
        self.stage = Stage::Confirmation;
        let prompt = line(format_args!("N is {}", self.config.target_cycles));
        self.show(&prompt, Some("F1-Yes F2-No"));
    }

    fn accept_config(&mut self) {
        self.config.confirmed = true;
        self.stage = Stage::Operation;
        self.run.phase = Phase::AwaitTrigger;
        self.trigger.reset();
        info!(
            "configured: {} cycles, work stroke {}",
            self.config.target_cycles,
            self.config.direction.as_str()
        );
        let detail = line(format_args!("N = {}", self.config.target_cycles));
        self.show("Press home", Some(&detail));
    }

    // ------------------------------------------------------------------
    // Run loop
    // ------------------------------------------------------------------

    fn poll_trigger(&mut self, now_ms: u64) -> Result<(), A::Error> {
        let asserted = self.sensors.is_home_asserted();
        if self.trigger.sample(asserted, now_ms) {
            self.start_run(now_ms)?;
        }
        Ok(())
    }

    fn start_run(&mut self, now_ms: u64) -> Result<(), A::Error> {
        // The start press also reaches the pause latch as a falling edge
        self.flags.set_paused(false);
        self.run.current_cycle = self.run.resume_cycle;
        info!(
            "run started at cycle {} of {}",
            self.run.current_cycle, self.config.target_cycles
        );
        self.next_cycle(now_ms)
    }

    fn next_cycle(&mut self, now_ms: u64) -> Result<(), A::Error> {
        if self.run.current_cycle < self.config.target_cycles {
            self.begin_dwell(now_ms)
        } else {
            self.begin_reversal()
        }
    }

    fn begin_dwell(&mut self, now_ms: u64) -> Result<(), A::Error> {
        self.run.phase = Phase::Dwelling;
        self.timer
            .start(self.config.dwell_ms(self.timing.dwell_ms_per_unit), now_ms);
        self.apply_outputs(Phase::Dwelling)?;
        debug!("cycle {} dwell", self.run.current_cycle + 1);
        let msg = line(format_args!("Motor is ON {}", self.run.current_cycle + 1));
        self.show(&msg, None);
        Ok(())
    }

    fn begin_stroke(&mut self, now_ms: u64) -> Result<(), A::Error> {
        let phase = Phase::stroke(self.config.direction);
        self.run.phase = phase;
        self.timer.start(u64::from(self.timing.extend_ms), now_ms);
        self.apply_outputs(phase)?;
        debug!("cycle {} stroke", self.run.current_cycle + 1);
        Ok(())
    }

    fn begin_reversal(&mut self) -> Result<(), A::Error> {
        self.run.phase = Phase::ReversingHome;
        self.timer.reset();
        self.apply_outputs(Phase::ReversingHome)?;
        info!(
            "reversing {} after {} cycles",
            self.config.direction.opposite().as_str(),
            self.run.current_cycle
        );
        self.show("Reversing", Some("Waiting end..."));
        Ok(())
    }

    fn poll_motion(&mut self, now_ms: u64) -> Result<(), A::Error> {
        let phase = self.run.phase;
        let status = if phase == Phase::ReversingHome {
            let sensors = &self.sensors;
            poll_until(self.flags, RUN_CHECKPOINTS, || sensors.is_end_asserted())
        } else {
            let timer = &self.timer;
            poll_until(self.flags, RUN_CHECKPOINTS, || timer.is_expired(now_ms))
        };

        match status {
            WaitStatus::Pending => Ok(()),
            WaitStatus::Stopped => self.stop(),
            WaitStatus::Paused => self.pause(now_ms),
            WaitStatus::Ready => self.finish_phase(phase, now_ms),
        }
    }

    fn finish_phase(&mut self, phase: Phase, now_ms: u64) -> Result<(), A::Error> {
        if self.stage == Stage::Calibration {
            self.actuator.set_direction(Direction::Idle)?;
            self.show("Motor stopped", None);
            self.enter_count_entry();
            return Ok(());
        }

        match phase {
            Phase::Dwelling => self.begin_stroke(now_ms),
            Phase::Extending | Phase::Retracting => {
                self.actuator.set_direction(Direction::Idle)?;
                self.run.current_cycle += 1;
                self.run.resume_cycle = self.run.current_cycle;
                let msg = line(format_args!("Loop {} done", self.run.current_cycle));
                self.show(&msg, None);
                self.next_cycle(now_ms)
            }
            Phase::ReversingHome => self.complete_run(),
            _ => Ok(()),
        }
    }

    fn complete_run(&mut self) -> Result<(), A::Error> {
        self.actuator.de_energize()?;
        self.limit_switch_count += 1;
        let completed = self.run.current_cycle;
        info!(
            "run complete: {} cycles, limit switch count {}",
            completed, self.limit_switch_count
        );
        let tally = line(format_args!(
            "Cycles {}  LS {}",
            completed, self.limit_switch_count
        ));
        self.show("Reverse complete", Some(&tally));

        self.run.current_cycle = 0;
        self.run.resume_cycle = 0;

        match self.policy.on_complete {
            CompletionPolicy::AwaitNextTrigger => {
                self.run.phase = Phase::AwaitTrigger;
                self.trigger.reset();
                Ok(())
            }
            CompletionPolicy::FullReset => self.reset(),
        }
    }

    // ------------------------------------------------------------------
    // Pause
    // ------------------------------------------------------------------

    fn pause(&mut self, now_ms: u64) -> Result<(), A::Error> {
        let phase = self.run.phase;
        self.timer.suspend(now_ms);
        self.interrupted = Some(phase);
        self.run.resume_cycle = self.run.current_cycle;
        self.run.phase = Phase::Paused;
        self.actuator.de_energize()?;
        info!(
            "paused in {} at cycle {}",
            phase.as_str(),
            self.run.current_cycle
        );
        let detail = line(format_args!(
            "Cycle {}/{}",
            self.run.current_cycle, self.config.target_cycles
        ));
        self.show("Paused", Some(&detail));
        Ok(())
    }

    fn poll_paused(&mut self, now_ms: u64) -> Result<(), A::Error> {
        if self.flags.is_paused() {
            return Ok(());
        }

        let phase = self.interrupted.take().unwrap_or(Phase::AwaitTrigger);
        self.run.current_cycle = self.run.resume_cycle;
        self.run.phase = phase;
        self.timer.resume(now_ms);
        self.apply_outputs(phase)?;
        info!(
            "resumed {} at cycle {}",
            phase.as_str(),
            self.run.current_cycle
        );

        match phase {
            Phase::ReversingHome => self.show("Reversing", Some("Waiting end...")),
            _ if self.stage == Stage::Calibration => self.show("Calibrating", None),
            _ => {
                let msg = line(format_args!("Motor is ON {}", self.run.current_cycle + 1));
                self.show(&msg, None);
            }
        }
        Ok(())
    }

    /// Drive the outputs for `phase`. The relay is switched before the
    /// direction lines.
    fn apply_outputs(&mut self, phase: Phase) -> Result<(), A::Error> {
        let (power, direction) = match phase {
            Phase::Dwelling => (true, Direction::Idle),
            Phase::Extending | Phase::Retracting => {
                let dir = if phase == Phase::Extending {
                    Direction::Extend
                } else {
                    Direction::Retract
                };
                // Calibration strokes drive the lines without the power relay
                (self.stage == Stage::Operation, dir)
            }
            Phase::ReversingHome => (false, self.config.direction.opposite()),
            _ => (false, Direction::Idle),
        };

        self.actuator.set_power(power)?;
        self.actuator.set_direction(direction)
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    fn show(&mut self, line1: &str, line2: Option<&str>) {
        if let Err(e) = self.display.show(line1, line2) {
            warn!("display update failed: {:?}", e);
        }
    }

    fn write_row(&mut self, row: u8, text: &str) {
        if let Err(e) = self.display.write_at(row, 0, text) {
            warn!("display write failed: {:?}", e);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.run.phase
    }

    /// Current operator screen.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run-loop progress.
    pub fn run_state(&self) -> RunState {
        self.run
    }

    /// Configuration entered so far.
    pub fn cycle_config(&self) -> CycleConfig {
        self.config
    }

    /// End-sensor arrivals since the last reset.
    pub fn limit_switch_count(&self) -> u32 {
        self.limit_switch_count
    }

    /// Time left in the current timed phase.
    pub fn phase_remaining_ms(&self, now_ms: u64) -> u64 {
        self.timer.remaining_ms(now_ms)
    }

    /// Full state snapshot.
    pub fn state(&self) -> CycleState {
        CycleState {
            stage: self.stage,
            phase: self.run.phase,
            current_cycle: self.run.current_cycle,
            resume_cycle: self.run.resume_cycle,
            target_cycles: self.config.target_cycles,
            direction: self.config.direction,
            confirmed: self.config.confirmed,
            limit_switch_count: self.limit_switch_count,
            paused: self.flags.is_paused(),
            emergency_stop: self.flags.is_emergency_stop(),
        }
    }

    /// The actuator driver.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Mutable access to the actuator driver.
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// The limit sensors.
    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    /// Mutable access to the limit sensors.
    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    /// Mutable access to the keypad.
    pub fn keypad_mut(&mut self) -> &mut K {
        &mut self.keypad
    }

    /// The display.
    pub fn display(&self) -> &D {
        &self.display
    }
}

/// Full state snapshot for diagnostics and tests.
///
/// # Example
///
/// ```rust
/// use drive_cycle::hal::{MockActuator, MockDisplay, MockKeypad, MockSensors};
/// use drive_cycle::latch::SharedFlags;
/// use drive_cycle::{Config, CycleController, Phase, Stage};
///
/// let flags = SharedFlags::new();
/// let controller = CycleController::new(
///     MockActuator::new(),
///     MockSensors::new(),
///     MockKeypad::new(),
///     MockDisplay::new(),
///     &flags,
///     Config::default(),
/// );
///
/// let state = controller.state();
/// assert_eq!(state.stage, Stage::Calibration);
/// assert_eq!(state.phase, Phase::Idle);
/// assert!(!state.confirmed);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleState {
    /// Operator screen.
    pub stage: Stage,
    /// Actuator phase.
    pub phase: Phase,
    /// Cycles completed in the current run.
    pub current_cycle: u16,
    /// Cycle a resume continues from.
    pub resume_cycle: u16,
    /// Cycles requested.
    pub target_cycles: u16,
    /// Work-stroke direction.
    pub direction: Direction,
    /// Whether the count was accepted.
    pub confirmed: bool,
    /// End-sensor arrivals since reset.
    pub limit_switch_count: u32,
    /// Pause flag.
    pub paused: bool,
    /// Emergency-stop flag.
    pub emergency_stop: bool,
}

/// Formats one display row, cutting overlong text at the panel width.
fn line(args: fmt::Arguments<'_>) -> Line {
    struct Truncating(Line);

    impl fmt::Write for Truncating {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut out = Truncating(Line::new());
    let _ = out.write_fmt(args);
    out.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockActuator, MockDisplay, MockKeypad, MockSensors};

    type Controller<'f> = CycleController<'f, MockActuator, MockSensors, MockKeypad, MockDisplay>;

    fn controller(flags: &SharedFlags) -> Controller<'_> {
        let mut c = CycleController::new(
            MockActuator::new(),
            MockSensors::new(),
            MockKeypad::new(),
            MockDisplay::new(),
            flags,
            Config::default(),
        );
        c.init().unwrap();
        c
    }

    #[test]
    fn starts_in_calibration() {
        let flags = SharedFlags::new();
        let c = controller(&flags);
        assert_eq!(c.stage(), Stage::Calibration);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.display().row(0), "Select direction");
        assert!(!c.actuator().is_energized());
    }

    #[test]
    fn calibration_ignores_unrelated_keys() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut()
            .press_all(&[Key::Digit(4), Key::Confirm, Key::Reject]);
        for t in 0..3 {
            c.update(t).unwrap();
        }
        assert_eq!(c.stage(), Stage::Calibration);
    }

    #[test]
    fn calibration_stroke_runs_for_fixed_time() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut().press(Key::DirRight);

        c.update(0).unwrap();
        assert_eq!(c.phase(), Phase::Extending);
        assert_eq!(c.actuator().direction, Direction::Extend);
        assert!(!c.actuator().power);

        c.update(150).unwrap();
        assert_eq!(c.phase(), Phase::Extending);

        c.update(200).unwrap();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.stage(), Stage::CountEntry);
        assert_eq!(c.actuator().direction, Direction::Idle);
        assert_eq!(c.cycle_config().direction, Direction::Extend);
    }

    #[test]
    fn dir_left_selects_retract() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut().press(Key::DirLeft);
        c.update(0).unwrap();
        assert_eq!(c.phase(), Phase::Retracting);
        assert_eq!(c.actuator().direction, Direction::Retract);
        assert_eq!(c.cycle_config().direction, Direction::Retract);
        assert!(c.display().ever_showed("Motor reversing"));
    }

    #[test]
    fn digits_echo_on_second_row() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut().press_all(&[Key::Back, Key::Digit(4), Key::Digit(2)]);
        for t in 0..3 {
            c.update(t).unwrap();
        }
        assert_eq!(c.display().row(0), "Give N value:");
        assert_eq!(c.display().row(1), "42");
    }

    #[test]
    fn back_from_entry_discards_value() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut()
            .press_all(&[Key::Skip, Key::Digit(7), Key::Back]);
        for t in 0..3 {
            c.update(t).unwrap();
        }
        assert_eq!(c.stage(), Stage::Calibration);
        assert_eq!(c.cycle_config().target_cycles, 0);
    }

    #[test]
    fn reject_returns_to_entry_from_zero() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut().press_all(&[
            Key::Skip,
            Key::Digit(5),
            Key::Confirm,
            Key::Reject,
            Key::Digit(8),
            Key::Confirm,
        ]);
        for t in 0..6 {
            c.update(t).unwrap();
        }
        assert_eq!(c.stage(), Stage::Confirmation);
        assert_eq!(c.cycle_config().target_cycles, 8);
        assert_eq!(c.display().row(0), "N is 8");
    }

    #[test]
    fn skip_during_entry_accepts_value() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut().press_all(&[Key::Skip, Key::Digit(6), Key::Skip]);
        for t in 0..3 {
            c.update(t).unwrap();
        }
        assert_eq!(c.phase(), Phase::AwaitTrigger);
        assert!(c.cycle_config().confirmed);
        assert_eq!(c.cycle_config().target_cycles, 6);
    }

    #[test]
    fn dwell_uses_dwell_units_not_cycle_count() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.keypad_mut()
            .press_all(&[Key::Skip, Key::Digit(2), Key::Confirm, Key::Confirm]);
        for t in 0..4 {
            c.update(t).unwrap();
        }
        c.sensors_mut().home = true;
        c.update(100).unwrap();
        c.update(150).unwrap();
        assert_eq!(c.phase(), Phase::Dwelling);
        assert_eq!(c.phase_remaining_ms(150), 2_000);
        assert!(c.actuator().power);
        assert_eq!(c.actuator().direction, Direction::Idle);
    }

    #[test]
    fn display_failure_is_not_fatal() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.display.fail_writes = true;
        c.keypad_mut().press(Key::Skip);
        assert!(c.update(0).is_ok());
        assert_eq!(c.stage(), Stage::CountEntry);
    }

    #[test]
    fn actuator_failure_propagates() {
        let flags = SharedFlags::new();
        let mut c = controller(&flags);
        c.actuator_mut().fail_writes = true;
        c.keypad_mut().press(Key::DirRight);
        assert_eq!(c.update(0), Err(()));
    }

    #[test]
    fn line_truncates_to_panel_width() {
        let l = line(format_args!("{}", "0123456789abcdefXYZ"));
        assert_eq!(l.as_str(), "0123456789abcdef");
        assert_eq!(line(format_args!("N is {}", 42)).as_str(), "N is 42");
    }
}

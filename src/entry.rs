//! Operator-entered cycle configuration.
//!
//! [`CountEntry`] accumulates keypad digits into the cycle count, accepting
//! at most two digits. [`CycleConfig`] is what the entry phase produces and
//! the run loop consumes.

use crate::traits::Direction;

/// Maximum number of digits accepted for N.
pub const MAX_DIGITS: u8 = 2;

/// Run configuration produced by calibration and N-entry.
///
/// `target_cycles` bounds the run loop; `dwell_units` scales the per-cycle
/// dwell. Both come from the same operator entry but are kept apart so
/// neither is used in the other's role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleConfig {
    /// Work-stroke direction chosen during calibration.
    pub direction: Direction,
    /// Number of dwell/stroke cycles to run (0-99).
    pub target_cycles: u16,
    /// Dwell length in units of `dwell_ms_per_unit`.
    pub dwell_units: u16,
    /// Set once the operator accepts the count.
    pub confirmed: bool,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Extend,
            target_cycles: 0,
            dwell_units: 0,
            confirmed: false,
        }
    }
}

impl CycleConfig {
    /// Copies an entered count into both the cycle bound and the dwell scale.
    pub fn apply_count(&mut self, count: u16) {
        self.target_cycles = count;
        self.dwell_units = count;
    }

    /// Dwell duration for one cycle.
    pub fn dwell_ms(&self, dwell_ms_per_unit: u32) -> u64 {
        u64::from(self.dwell_units) * u64::from(dwell_ms_per_unit)
    }
}

/// Digit accumulator for the N-entry screen.
///
/// # Example
///
/// ```rust
/// use drive_cycle::entry::CountEntry;
///
/// let mut entry = CountEntry::new();
/// assert!(entry.push(1));
/// assert!(entry.push(2));
/// assert!(!entry.push(5)); // third digit ignored
/// assert_eq!(entry.value(), 12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountEntry {
    value: u16,
    digits: u8,
}

impl CountEntry {
    /// Creates an empty entry (value 0).
    pub const fn new() -> Self {
        Self {
            value: 0,
            digits: 0,
        }
    }

    /// Appends a digit. Returns false if the digit was not accepted.
    pub fn push(&mut self, digit: u8) -> bool {
        if digit > 9 || self.digits >= MAX_DIGITS {
            return false;
        }
        self.value = self.value * 10 + u16::from(digit);
        self.digits += 1;
        true
    }

    /// Current accumulated value.
    #[inline]
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Number of digits accepted so far.
    #[inline]
    pub fn digits(&self) -> u8 {
        self.digits
    }

    /// True once no more digits are accepted.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.digits >= MAX_DIGITS
    }

    /// Discards everything entered.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_entry_is_zero() {
        let entry = CountEntry::new();
        assert_eq!(entry.value(), 0);
        assert_eq!(entry.digits(), 0);
        assert!(!entry.is_full());
    }

    #[test]
    fn leading_zero_counts_as_digit() {
        let mut entry = CountEntry::new();
        entry.push(0);
        entry.push(3);
        assert_eq!(entry.value(), 3);
        assert!(entry.is_full());
        assert!(!entry.push(7));
        assert_eq!(entry.value(), 3);
    }

    #[test]
    fn max_value_is_99() {
        let mut entry = CountEntry::new();
        for _ in 0..5 {
            entry.push(9);
        }
        assert_eq!(entry.value(), 99);
    }

    #[test]
    fn invalid_digit_rejected() {
        let mut entry = CountEntry::new();
        assert!(!entry.push(10));
        assert_eq!(entry.digits(), 0);
    }

    #[test]
    fn clear_starts_over() {
        let mut entry = CountEntry::new();
        entry.push(4);
        entry.push(2);
        entry.clear();
        assert!(entry.push(7));
        assert_eq!(entry.value(), 7);
    }

    #[test]
    fn config_defaults() {
        let config = CycleConfig::default();
        assert_eq!(config.direction, Direction::Extend);
        assert_eq!(config.target_cycles, 0);
        assert!(!config.confirmed);
    }

    #[test]
    fn apply_count_sets_both_fields() {
        let mut config = CycleConfig::default();
        config.apply_count(12);
        assert_eq!(config.target_cycles, 12);
        assert_eq!(config.dwell_units, 12);
        assert_eq!(config.dwell_ms(1_000), 12_000);
    }
}

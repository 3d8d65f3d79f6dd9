//! Keypad input: the symbolic key alphabet and the polling source trait.

/// A discrete key event delivered by the keypad.
///
/// The controller only understands this alphabet. Raw keypad legends are
/// translated with [`Key::from_legend`]; anything that does not translate
/// is dropped before it reaches the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Key {
    /// Decimal digit 0-9.
    Digit(u8),
    /// Accept / yes / enter.
    Confirm,
    /// Decline / no.
    Reject,
    /// Go back one step.
    Back,
    /// Skip the current step.
    Skip,
    /// Emergency stop.
    Stop,
    /// Full system reset.
    Reset,
    /// Calibrate towards the left (retract).
    DirLeft,
    /// Calibrate towards the right (extend).
    DirRight,
}

impl Key {
    /// Translate a keypad legend into a key.
    ///
    /// The reference keypad is a 5x4 matrix labelled:
    ///
    /// ```text
    /// F1    F2  #      *
    /// 1     2   3      UP
    /// 4     5   6      DOWN
    /// 7     8   9      ESC
    /// LEFT  0   RIGHT  ENTER
    /// ```
    ///
    /// `UP` has no meaning for the drive cycle and yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use drive_cycle::Key;
    ///
    /// assert_eq!(Key::from_legend("7"), Some(Key::Digit(7)));
    /// assert_eq!(Key::from_legend("ENTER"), Some(Key::Confirm));
    /// assert_eq!(Key::from_legend("F1"), Some(Key::Confirm));
    /// assert_eq!(Key::from_legend("#"), Some(Key::Stop));
    /// assert_eq!(Key::from_legend("UP"), None);
    /// ```
    pub fn from_legend(legend: &str) -> Option<Self> {
        match legend {
            "F1" | "ENTER" => Some(Key::Confirm),
            "F2" => Some(Key::Reject),
            "ESC" => Some(Key::Back),
            "DOWN" => Some(Key::Skip),
            "#" => Some(Key::Stop),
            "*" => Some(Key::Reset),
            "LEFT" => Some(Key::DirLeft),
            "RIGHT" => Some(Key::DirRight),
            s if s.len() == 1 => s
                .chars()
                .next()
                .and_then(|c| c.to_digit(10))
                .map(|d| Key::Digit(d as u8)),
            _ => None,
        }
    }

    /// Returns the digit value for digit keys.
    #[inline]
    pub const fn digit(&self) -> Option<u8> {
        match self {
            Key::Digit(d) if *d <= 9 => Some(*d),
            _ => None,
        }
    }
}

/// Keypad legends in row-major order for the 5x4 matrix.
pub const KEYPAD_LEGENDS: [[&str; 4]; 5] = [
    ["F1", "F2", "#", "*"],
    ["1", "2", "3", "UP"],
    ["4", "5", "6", "DOWN"],
    ["7", "8", "9", "ESC"],
    ["LEFT", "0", "RIGHT", "ENTER"],
];

/// Polling key source.
///
/// Returns at most one key per call. `None` means nothing was pressed
/// since the previous poll; it is never a repeat of an earlier key.
pub trait KeySource {
    /// Take the next pending key, if any.
    fn poll_key(&mut self) -> Option<Key>;
}

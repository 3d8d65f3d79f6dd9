//! Controller configuration: timing constants and protocol policies.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. Nothing here is persisted; the
//! firmware builds its config at start-up.
//!
//! # Example
//!
//! ```rust
//! use drive_cycle::config::{CompletionPolicy, Config, PolicyConfig, StopPolicy, TimingConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.timing.extend_ms, 3_000);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_timing(TimingConfig::default().with_dwell_ms_per_unit(500))
//!     .with_policy(
//!         PolicyConfig::default()
//!             .with_on_complete(CompletionPolicy::FullReset)
//!             .with_on_stop(StopPolicy::ResetImmediately),
//!     );
//! ```

use heapless::String as HString;

use crate::latch::{MAX_REFRACTORY_MS, MIN_REFRACTORY_MS};

/// Maximum length for short config strings
pub const MAX_SHORT_STRING: usize = 16;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete controller configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Phase durations and sampling intervals
    pub timing: TimingConfig,
    /// Completion and stop behaviour
    pub policy: PolicyConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set policy configuration
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Phase durations and sampling intervals, all in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Sleep between main-loop polls
    pub poll_interval_ms: u32,
    /// Length of a calibration stroke
    pub calibration_stroke_ms: u32,
    /// Dwell time per unit of the entered count
    pub dwell_ms_per_unit: u32,
    /// Length of the work stroke in each cycle
    pub extend_ms: u32,
    /// Separation of the two start-trigger samples
    pub trigger_debounce_ms: u32,
    /// Minimum time between accepted pause edges
    pub refractory_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            calibration_stroke_ms: 200,
            dwell_ms_per_unit: 1_000,
            extend_ms: 3_000,
            trigger_debounce_ms: 50,
            refractory_ms: 150,
        }
    }
}

impl TimingConfig {
    /// Set the main-loop poll interval (minimum 1ms)
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms.max(1);
        self
    }

    /// Set the calibration stroke length
    pub fn with_calibration_stroke_ms(mut self, ms: u32) -> Self {
        self.calibration_stroke_ms = ms;
        self
    }

    /// Set the dwell time per count unit
    pub fn with_dwell_ms_per_unit(mut self, ms: u32) -> Self {
        self.dwell_ms_per_unit = ms;
        self
    }

    /// Set the work stroke length
    pub fn with_extend_ms(mut self, ms: u32) -> Self {
        self.extend_ms = ms;
        self
    }

    /// Set the start-trigger sample separation
    pub fn with_trigger_debounce_ms(mut self, ms: u32) -> Self {
        self.trigger_debounce_ms = ms;
        self
    }

    /// Set the pause-latch refractory interval (clamped to 100-200ms)
    pub fn with_refractory_ms(mut self, ms: u32) -> Self {
        self.refractory_ms = ms.clamp(MIN_REFRACTORY_MS, MAX_REFRACTORY_MS);
        self
    }
}

// ============================================================================
// Policy Config
// ============================================================================

/// What happens after the reversal to home completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CompletionPolicy {
    /// Keep the confirmed configuration and wait for the next home trigger.
    #[default]
    AwaitNextTrigger,
    /// Run the full reset protocol and return to calibration.
    FullReset,
}

/// What happens after the STOP key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopPolicy {
    /// Hold in Stopped until CONFIRM (or RESET) acknowledges, then reset.
    #[default]
    AcknowledgeThenReset,
    /// Reset straight away.
    ResetImmediately,
}

/// Protocol policies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyConfig {
    /// Behaviour after a completed run
    pub on_complete: CompletionPolicy,
    /// Behaviour after STOP
    pub on_stop: StopPolicy,
}

impl PolicyConfig {
    /// Set the completion policy
    pub fn with_on_complete(mut self, policy: CompletionPolicy) -> Self {
        self.on_complete = policy;
        self
    }

    /// Set the stop policy
    pub fn with_on_stop(mut self, policy: StopPolicy) -> Self {
        self.on_stop = policy;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Name shown under the start-up banner
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("Drive Cycle"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.timing.poll_interval_ms, 10);
        assert_eq!(config.timing.dwell_ms_per_unit, 1_000);
        assert_eq!(config.policy.on_complete, CompletionPolicy::AwaitNextTrigger);
        assert_eq!(config.policy.on_stop, StopPolicy::AcknowledgeThenReset);
        assert_eq!(config.device.name.as_str(), "Drive Cycle");
    }

    #[test]
    fn short_string_truncation() {
        let long = "a".repeat(40);
        let s = short_string(&long);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn short_string_respects_char_boundaries() {
        // 15 ASCII bytes then a 2-byte char that would straddle the limit
        let s = short_string("abcdefghijklmnoé");
        assert_eq!(s.as_str(), "abcdefghijklmno");
    }

    #[test]
    fn refractory_clamped() {
        assert_eq!(TimingConfig::default().with_refractory_ms(5).refractory_ms, 100);
        assert_eq!(
            TimingConfig::default().with_refractory_ms(1_000).refractory_ms,
            200
        );
        assert_eq!(TimingConfig::default().with_refractory_ms(180).refractory_ms, 180);
    }

    #[test]
    fn poll_interval_never_zero() {
        assert_eq!(TimingConfig::default().with_poll_interval_ms(0).poll_interval_ms, 1);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_timing(
                TimingConfig::default()
                    .with_extend_ms(1_500)
                    .with_calibration_stroke_ms(250)
                    .with_trigger_debounce_ms(30),
            )
            .with_policy(PolicyConfig::default().with_on_complete(CompletionPolicy::FullReset))
            .with_device(DeviceConfig::default().with_name("Bench rig"));

        assert_eq!(config.timing.extend_ms, 1_500);
        assert_eq!(config.timing.calibration_stroke_ms, 250);
        assert_eq!(config.timing.trigger_debounce_ms, 30);
        assert_eq!(config.policy.on_complete, CompletionPolicy::FullReset);
        assert_eq!(config.policy.on_stop, StopPolicy::AcknowledgeThenReset);
        assert_eq!(config.device.name.as_str(), "Bench rig");
    }
}

//! Instance configuration read at start.
//!
//! # Responsibility
//! - Define the persisted `settings` record and its documented ranges.
//! - Normalize persisted values so a bad record never blocks startup.
//!
//! # Invariants
//! - `poll_interval_ms` stays within `[500, 5000]`.
//! - `default_slot_count` stays within `[1, 10]`.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

pub const POLL_INTERVAL_RANGE_MS: RangeInclusive<u64> = 500..=5000;
pub const DEFAULT_SLOT_COUNT_RANGE: RangeInclusive<usize> = 1..=10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_SLOT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_slot_count")]
    pub default_slot_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            default_slot_count: DEFAULT_SLOT_COUNT,
        }
    }
}

impl Settings {
    /// Validates user-supplied settings before they are persisted.
    ///
    /// # Errors
    /// - Returns `CoreError::InvalidSettings` when either value is out of range.
    pub fn validate(&self) -> CoreResult<()> {
        if !POLL_INTERVAL_RANGE_MS.contains(&self.poll_interval_ms) {
            return Err(CoreError::InvalidSettings(format!(
                "pollIntervalMs {} outside {}..={}",
                self.poll_interval_ms,
                POLL_INTERVAL_RANGE_MS.start(),
                POLL_INTERVAL_RANGE_MS.end()
            )));
        }
        if !DEFAULT_SLOT_COUNT_RANGE.contains(&self.default_slot_count) {
            return Err(CoreError::InvalidSettings(format!(
                "defaultSlotCount {} outside {}..={}",
                self.default_slot_count,
                DEFAULT_SLOT_COUNT_RANGE.start(),
                DEFAULT_SLOT_COUNT_RANGE.end()
            )));
        }
        Ok(())
    }

    /// Returns a copy with both values clamped into range.
    pub fn clamped(self) -> Self {
        Self {
            poll_interval_ms: self
                .poll_interval_ms
                .clamp(*POLL_INTERVAL_RANGE_MS.start(), *POLL_INTERVAL_RANGE_MS.end()),
            default_slot_count: self.default_slot_count.clamp(
                *DEFAULT_SLOT_COUNT_RANGE.start(),
                *DEFAULT_SLOT_COUNT_RANGE.end(),
            ),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_slot_count() -> usize {
    DEFAULT_SLOT_COUNT
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::error::CoreError;

    #[test]
    fn defaults_are_in_range() {
        Settings::default()
            .validate()
            .expect("default settings should validate");
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let err = Settings {
            poll_interval_ms: 100,
            default_slot_count: 3,
        }
        .validate()
        .expect_err("interval below range must fail");
        assert!(matches!(err, CoreError::InvalidSettings(_)));

        let err = Settings {
            poll_interval_ms: 1000,
            default_slot_count: 0,
        }
        .validate()
        .expect_err("zero slots must fail");
        assert!(matches!(err, CoreError::InvalidSettings(_)));
    }

    #[test]
    fn clamped_pulls_values_into_range() {
        let clamped = Settings {
            poll_interval_ms: 60_000,
            default_slot_count: 42,
        }
        .clamped();
        assert_eq!(clamped.poll_interval_ms, 5000);
        assert_eq!(clamped.default_slot_count, 10);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Settings =
            serde_json::from_str(r#"{"pollIntervalMs":750}"#).expect("settings should parse");
        assert_eq!(parsed.poll_interval_ms, 750);
        assert_eq!(parsed.default_slot_count, 3);
    }
}

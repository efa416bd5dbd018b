// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunable constants for the frame timeline.

use crate::error::ConfigError;
use crate::jank::JankThresholds;
use crate::time::Duration;
use crate::token::DEFAULT_RETENTION;

/// Default bound on retained history entries.
pub const DEFAULT_MAX_HISTORY: usize = 64;

/// Expected number of surface frames per display frame; used only to size
/// the initial `Vec` allocation.
pub const DEFAULT_SURFACE_FRAME_CAPACITY_HINT: usize = 10;

/// Top-level configuration for a [`FrameTimeline`](crate::facade::FrameTimeline).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTimelineConfig {
    /// Thresholds passed to the jank classifier.
    pub thresholds: JankThresholds,
    /// How long a token's predictions stay resolvable after issuance.
    pub prediction_retention: Duration,
    /// Maximum number of resolved display frames retained for dump.
    pub max_history: usize,
    /// Capacity hint for a display frame's surface-frame vector.
    pub surface_frame_capacity_hint: usize,
}

impl FrameTimelineConfig {
    /// Validates that the configuration describes a usable timeline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroHistory`] if `max_history` is zero: a
    /// timeline that can never retain a single resolved frame cannot be
    /// dumped or inspected, which is almost certainly a misconfiguration
    /// rather than intent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        Ok(())
    }
}

impl Default for FrameTimelineConfig {
    fn default() -> Self {
        Self {
            thresholds: JankThresholds::DEFAULT,
            prediction_retention: DEFAULT_RETENTION,
            max_history: DEFAULT_MAX_HISTORY,
            surface_frame_capacity_hint: DEFAULT_SURFACE_FRAME_CAPACITY_HINT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(FrameTimelineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_history_is_rejected() {
        let mut cfg = FrameTimelineConfig::default();
        cfg.max_history = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroHistory));
    }
}

// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic classification of timing deviations.
//!
//! Every function here is a pure function of its arguments: no clock reads,
//! no locks, no I/O. [`DisplayFrame`](crate::display_frame::DisplayFrame) and
//! [`SurfaceFrame`](crate::surface_frame::SurfaceFrame) call into this module
//! at resolution time and store the result; they never call back into it
//! afterwards.

use bitflags::bitflags;

use crate::time::{Duration, Timestamp};

bitflags! {
    /// Bitmask of jank causes. Multiple bits may be set for one frame.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct JankType: u32 {
        /// The app missed its own deadline.
        const APP_DEADLINE_MISSED = 1 << 0;
        /// The compositor missed its deadline.
        const SURFACE_FLINGER_DEADLINE_MISSED = 1 << 1;
        /// The display HAL presented late despite an on-time composite.
        const DISPLAY_HAL = 1 << 2;
        /// A stale buffer was re-presented while a newer one waited.
        const APP_BUFFER_STUFFING = 1 << 3;
        /// The predicted present time missed by a full vsync period.
        const PREDICTION_ERROR = 1 << 4;
        /// The compositor's own scheduling misaligned with vsync.
        const SURFACE_FLINGER_SCHEDULING = 1 << 5;
        /// Jank occurred but does not fit a more specific category.
        const UNKNOWN = 1 << 6;
    }
}

/// Thresholds the classifier compares actual-vs-predicted deltas against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JankThresholds {
    /// Tolerance for [`classify_start`].
    pub start: Duration,
    /// Tolerance for [`classify_ready`].
    pub deadline: Duration,
    /// Tolerance for [`classify_present`].
    pub present: Duration,
}

impl JankThresholds {
    /// 2ms for every stage, the default used throughout this crate.
    pub const DEFAULT: Self = Self {
        start: Duration::from_millis(2),
        deadline: Duration::from_millis(2),
        present: Duration::from_millis(2),
    };
}

impl Default for JankThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Classification of when work began, relative to its prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStartMetadata {
    /// A required timestamp was never recorded.
    Unknown,
    /// Started within [`JankThresholds::start`] of the prediction.
    OnTimeStart,
    /// Started later than predicted, beyond the threshold.
    LateStart,
    /// Started earlier than predicted, beyond the threshold.
    EarlyStart,
}

/// Classification of when work finished against its deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameReadyMetadata {
    /// A required timestamp was never recorded.
    Unknown,
    /// Finished at or before `predEnd + deadlineThreshold`.
    OnTimeFinish,
    /// Finished after the deadline.
    LateFinish,
}

/// Classification of when a frame actually reached the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePresentMetadata {
    /// A required timestamp was never recorded.
    Unknown,
    /// Presented within [`JankThresholds::present`] of the prediction.
    OnTimePresent,
    /// Presented later than predicted, beyond the threshold.
    LatePresent,
    /// Presented earlier than predicted, beyond the threshold.
    EarlyPresent,
}

/// Classifies `actual` against `predicted` using a start-style threshold
/// (distinguishes early from late; see [`FrameStartMetadata`]).
#[must_use]
pub fn classify_start(predicted: Timestamp, actual: Timestamp, threshold: Duration) -> FrameStartMetadata {
    if !predicted.is_set() || !actual.is_set() {
        return FrameStartMetadata::Unknown;
    }
    let delta = actual.signed_diff(predicted);
    let tol = threshold.nanos() as i64;
    if delta > tol {
        FrameStartMetadata::LateStart
    } else if delta < -tol {
        FrameStartMetadata::EarlyStart
    } else {
        FrameStartMetadata::OnTimeStart
    }
}

/// Classifies `actual` against a deadline of `predicted + threshold`.
///
/// Finishing early never counts against a frame: the goal is meeting the
/// deadline, not matching the prediction exactly.
#[must_use]
pub fn classify_ready(predicted: Timestamp, actual: Timestamp, threshold: Duration) -> FrameReadyMetadata {
    if !predicted.is_set() || !actual.is_set() {
        return FrameReadyMetadata::Unknown;
    }
    match predicted.checked_add(threshold) {
        Some(deadline) if actual <= deadline => FrameReadyMetadata::OnTimeFinish,
        _ => FrameReadyMetadata::LateFinish,
    }
}

/// Classifies `actual` against `predicted` using a present-style threshold
/// (distinguishes early from late; see [`FramePresentMetadata`]).
#[must_use]
pub fn classify_present(predicted: Timestamp, actual: Timestamp, threshold: Duration) -> FramePresentMetadata {
    if !predicted.is_set() || !actual.is_set() {
        return FramePresentMetadata::Unknown;
    }
    let delta = actual.signed_diff(predicted);
    let tol = threshold.nanos() as i64;
    if delta > tol {
        FramePresentMetadata::LatePresent
    } else if delta < -tol {
        FramePresentMetadata::EarlyPresent
    } else {
        FramePresentMetadata::OnTimePresent
    }
}

/// Composes a display frame's jank bitmask from its Ready/Present
/// classification, per the rules in the per-stage docs above.
#[must_use]
pub fn classify_display_jank(
    ready: FrameReadyMetadata,
    present: FramePresentMetadata,
    predicted_present: Timestamp,
    actual_present: Timestamp,
    vsync_period: Duration,
) -> JankType {
    use FramePresentMetadata as P;
    use FrameReadyMetadata as R;

    let slipped_a_full_period = predicted_present.is_set()
        && actual_present.is_set()
        && actual_present.abs_diff(predicted_present) >= vsync_period;

    match (ready, present) {
        (R::OnTimeFinish, P::OnTimePresent) => JankType::empty(),
        (R::LateFinish, P::LatePresent) => JankType::SURFACE_FLINGER_DEADLINE_MISSED,
        (R::OnTimeFinish, P::LatePresent) => JankType::DISPLAY_HAL,
        (R::OnTimeFinish, P::EarlyPresent) | (R::LateFinish, P::EarlyPresent) => {
            let mut jank = JankType::SURFACE_FLINGER_SCHEDULING;
            if slipped_a_full_period {
                jank |= JankType::PREDICTION_ERROR;
            }
            jank
        }
        (R::LateFinish, P::OnTimePresent) => {
            if slipped_a_full_period {
                JankType::PREDICTION_ERROR
            } else {
                JankType::empty()
            }
        }
        (R::Unknown, _) | (_, P::Unknown) => JankType::UNKNOWN,
    }
}

/// Composes a single surface frame's jank bitmask.
///
/// `display_jank` is the ambient cause already computed for the owning
/// display frame; surface-level jank either inherits it or refines it with
/// app-local causes.
#[must_use]
pub fn classify_surface_jank(
    display_jank: JankType,
    surface_ready: FrameReadyMetadata,
    presented: bool,
    last_latch_time: Timestamp,
    predicted_present: Timestamp,
    vsync_period: Duration,
) -> JankType {
    if display_jank.contains(JankType::SURFACE_FLINGER_DEADLINE_MISSED) {
        return JankType::SURFACE_FLINGER_DEADLINE_MISSED;
    }
    if matches!(surface_ready, FrameReadyMetadata::LateFinish) {
        return JankType::APP_DEADLINE_MISSED;
    }
    if presented && last_latch_time.is_set() && predicted_present.is_set() {
        let window_start = predicted_present - vsync_period;
        if last_latch_time >= window_start && last_latch_time <= predicted_present {
            return JankType::APP_BUFFER_STUFFING;
        }
    }
    if display_jank.contains(JankType::DISPLAY_HAL) {
        return JankType::DISPLAY_HAL;
    }
    JankType::empty()
}

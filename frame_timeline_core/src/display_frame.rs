// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-vsync aggregate of one compositor timeline plus its composited
//! surface frames.
//!
//! A [`DisplayFrame`] moves through three states —
//! [`Lifecycle::Open`], [`Lifecycle::AwaitingFence`], [`Lifecycle::Resolved`]
//! — driven entirely by [`FrameTimeline`](crate::facade::FrameTimeline). It
//! never reads a clock or a fence itself; the facade supplies every
//! timestamp and drives [`resolve`](Self::resolve) once a fence has
//! signaled.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::config::FrameTimelineConfig;
use crate::jank::{self, FramePresentMetadata, FrameReadyMetadata, FrameStartMetadata, JankType};
use crate::sinks::{DisplayStatsRecord, TimeStatsSink};
use crate::surface_frame::{PredictionState, SurfaceFrame};
use crate::time::{Duration, TimelineItem, Timestamp};
use crate::token::Token;

/// Lifecycle state of a [`DisplayFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Open for `addSurfaceFrame` calls.
    Open,
    /// Finalized by `setSfPresent`, waiting in the pending queue for its
    /// fence to signal.
    AwaitingFence,
    /// Fence signaled; surface frames classified; now immutable history.
    Resolved,
}

struct Mutable {
    lifecycle: Lifecycle,
    actuals: TimelineItem,
    jank_type: JankType,
    frame_start_metadata: Option<FrameStartMetadata>,
    frame_ready_metadata: Option<FrameReadyMetadata>,
    frame_present_metadata: Option<FramePresentMetadata>,
    surface_frames: Vec<Arc<SurfaceFrame>>,
}

/// One vsync's worth of compositor work: a timeline plus the surface
/// frames composited into it.
pub struct DisplayFrame {
    token: Token,
    vsync_period: Duration,
    prediction_state: PredictionState,
    predictions: TimelineItem,
    state: Mutex<Mutable>,
}

impl fmt::Debug for DisplayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("DisplayFrame")
            .field("token", &self.token)
            .field("lifecycle", &state.lifecycle)
            .field("surface_frames", &state.surface_frames.len())
            .finish()
    }
}

impl DisplayFrame {
    /// Opens a new display frame at `wake_time`, the start of its actual
    /// timeline.
    #[must_use]
    pub fn new(
        token: Token,
        vsync_period: Duration,
        prediction_state: PredictionState,
        predictions: TimelineItem,
        wake_time: Timestamp,
        surface_frame_capacity_hint: usize,
    ) -> Self {
        Self {
            token,
            vsync_period,
            prediction_state,
            predictions,
            state: Mutex::new(Mutable {
                lifecycle: Lifecycle::Open,
                actuals: TimelineItem { start: wake_time, ..TimelineItem::UNSET },
                jank_type: JankType::empty(),
                frame_start_metadata: None,
                frame_ready_metadata: None,
                frame_present_metadata: None,
                surface_frames: Vec::with_capacity(surface_frame_capacity_hint),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Mutable> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Token identifying this display frame.
    #[must_use]
    pub const fn token(&self) -> Token {
        self.token
    }

    /// The vsync period in effect when this frame was opened.
    #[must_use]
    pub const fn vsync_period(&self) -> Duration {
        self.vsync_period
    }

    /// Whether this frame's token resolved to a live prediction.
    #[must_use]
    pub const fn prediction_state(&self) -> PredictionState {
        self.prediction_state
    }

    /// The predicted timeline.
    #[must_use]
    pub const fn predictions(&self) -> TimelineItem {
        self.predictions
    }

    /// The actual timeline recorded so far.
    #[must_use]
    pub fn actuals(&self) -> TimelineItem {
        self.lock().actuals
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lock().lifecycle
    }

    /// The jank bitmask, empty before resolution.
    #[must_use]
    pub fn jank_type(&self) -> JankType {
        self.lock().jank_type
    }

    /// Whether this display frame, or any surface frame it contains, is
    /// janky.
    #[must_use]
    pub fn is_janky(&self) -> bool {
        let state = self.lock();
        !state.jank_type.is_empty() || state.surface_frames.iter().any(|sf| !sf.jank_type().is_empty())
    }

    /// Number of surface frames composited into this display frame.
    #[must_use]
    pub fn surface_frame_count(&self) -> usize {
        self.lock().surface_frames.len()
    }

    /// Runs `f` over each contained surface frame, in addition order.
    pub fn for_each_surface_frame(&self, mut f: impl FnMut(&Arc<SurfaceFrame>)) {
        for sf in &self.lock().surface_frames {
            f(sf);
        }
    }

    /// Appends a surface frame in arrival order.
    ///
    /// Adding after `setSfPresent` (i.e. once this frame has left
    /// [`Lifecycle::Open`]) is a protocol violation: logged and dropped.
    pub fn add_surface_frame(&self, surface_frame: Arc<SurfaceFrame>) {
        let mut state = self.lock();
        if state.lifecycle != Lifecycle::Open {
            warn!(
                "display frame (token {token:?}): addSurfaceFrame after setSfPresent, dropping",
                token = self.token,
            );
            return;
        }
        state.surface_frames.push(surface_frame);
    }

    /// `Open → AwaitingFence`. Records `actuals.end` and evaluates start and
    /// ready metadata against the configured thresholds.
    ///
    /// Calling this more than once is a protocol violation (double
    /// `setSfPresent`): logged and dropped.
    pub fn finalize_present(&self, end_time: Timestamp, config: &FrameTimelineConfig) {
        let mut state = self.lock();
        if state.lifecycle != Lifecycle::Open {
            warn!(
                "display frame (token {token:?}): setSfPresent called twice, dropping",
                token = self.token,
            );
            return;
        }
        state.actuals.end = end_time;
        state.frame_start_metadata = Some(jank::classify_start(
            self.predictions.start,
            state.actuals.start,
            config.thresholds.start,
        ));
        state.frame_ready_metadata = Some(jank::classify_ready(
            self.predictions.end,
            state.actuals.end,
            config.thresholds.deadline,
        ));
        state.lifecycle = Lifecycle::AwaitingFence;
    }

    /// `AwaitingFence → Resolved`. Sets `actuals.present`, computes this
    /// display frame's present metadata and jank bitmask, then cascades
    /// `onPresent` to every contained surface frame using this frame's jank
    /// as the ambient cause.
    ///
    /// Returns the computed jank bitmask for the caller's trace emission.
    pub fn resolve(
        &self,
        present_time: Timestamp,
        config: &FrameTimelineConfig,
        time_stats: &mut dyn TimeStatsSink,
    ) -> JankType {
        let mut state = self.lock();
        if state.lifecycle == Lifecycle::Resolved {
            warn!(
                "display frame (token {token:?}): resolve called twice, ignoring",
                token = self.token,
            );
            return state.jank_type;
        }

        state.actuals.present = present_time;
        let ready = state.frame_ready_metadata.unwrap_or(FrameReadyMetadata::Unknown);
        let present_metadata =
            jank::classify_present(self.predictions.present, state.actuals.present, config.thresholds.present);
        let jank_type = jank::classify_display_jank(
            ready,
            present_metadata,
            self.predictions.present,
            state.actuals.present,
            self.vsync_period,
        );

        state.frame_present_metadata = Some(present_metadata);
        state.jank_type = jank_type;
        state.lifecycle = Lifecycle::Resolved;

        time_stats.record_display_stats(&DisplayStatsRecord {
            token: self.token,
            predicted_present: self.predictions.present,
            actual_present: state.actuals.present,
            jank_type,
        });

        let vsync_period = self.vsync_period;
        let predicted_present = self.predictions.present;
        let surface_frames = state.surface_frames.clone();
        drop(state);

        for sf in &surface_frames {
            sf.on_present(present_time, jank_type, predicted_present, vsync_period, time_stats);
        }

        jank_type
    }

    /// The minimum timestamp across this display frame and all its surface
    /// frames, used to render dumps relative to a shared origin.
    #[must_use]
    pub fn base_time(&self) -> Timestamp {
        let state = self.lock();
        let mut base = [state.actuals.start, state.actuals.end, state.actuals.present]
            .into_iter()
            .filter(|t| t.is_set())
            .min()
            .unwrap_or(Timestamp::UNSET);

        for sf in &state.surface_frames {
            let actuals = sf.actuals();
            for t in [actuals.start, actuals.end, actuals.present] {
                if t.is_set() && (!base.is_set() || t < base) {
                    base = t;
                }
            }
        }
        base
    }
}

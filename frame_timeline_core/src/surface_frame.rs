// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer, per-buffer timing record.
//!
//! A [`SurfaceFrame`] is minted by
//! [`FrameTimeline::create_surface_frame_for_token`](crate::facade::FrameTimeline::create_surface_frame_for_token)
//! and lives until the display frame it was added to resolves. Identity
//! fields (token, owner, layer name) are set once at construction and never
//! change; everything else lives behind [`SurfaceFrame`]'s own mutex so that
//! trace and dump readers can observe it safely while the compositor thread
//! is still filling it in.

use std::sync::Mutex;

use log::warn;

use crate::jank::{self, FramePresentMetadata, FrameReadyMetadata, JankThresholds, JankType};
use crate::sinks::{SurfaceStatsRecord, TimeStatsSink};
use crate::time::{Duration, TimelineItem, Timestamp};
use crate::token::Token;

/// Whether a token resolved to a live prediction, a stale one, or none at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictionState {
    /// The token resolved to a prediction still inside its retention window.
    Valid,
    /// The token was once valid but its retention window has elapsed.
    Expired,
    /// No token was supplied, or the token was never recognized.
    None,
}

/// Disposition of a surface frame's buffer once the display resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PresentState {
    /// No disposition has been recorded yet.
    #[default]
    Unknown,
    /// The buffer was latched and composited into the display frame.
    Presented,
    /// The buffer was latched but superseded before it could be shown.
    Dropped,
}

#[derive(Debug, Default)]
struct Mutable {
    actuals: TimelineItem,
    actual_queue_time: Timestamp,
    present_state: PresentState,
    last_latch_time: Timestamp,
    jank_type: JankType,
    frame_ready_metadata: Option<FrameReadyMetadata>,
    frame_present_metadata: Option<FramePresentMetadata>,
    gpu_composition: bool,
    resolved: bool,
}

/// A per-layer, per-buffer timing record within one display frame.
#[derive(Debug)]
pub struct SurfaceFrame {
    token: Token,
    owner_pid: i32,
    owner_uid: i32,
    layer_name: String,
    debug_name: String,
    prediction_state: PredictionState,
    predictions: TimelineItem,
    thresholds: JankThresholds,
    state: Mutex<Mutable>,
}

impl SurfaceFrame {
    /// Constructs a new surface frame. Only
    /// [`FrameTimeline`](crate::facade::FrameTimeline) should call this —
    /// it is the only holder of a resolved [`PredictionState`] and
    /// [`Token`] pair.
    #[must_use]
    pub fn new(
        token: Token,
        owner_pid: i32,
        owner_uid: i32,
        layer_name: impl Into<String>,
        debug_name: impl Into<String>,
        prediction_state: PredictionState,
        predictions: TimelineItem,
        thresholds: JankThresholds,
    ) -> Self {
        Self {
            token,
            owner_pid,
            owner_uid,
            layer_name: layer_name.into(),
            debug_name: debug_name.into(),
            prediction_state,
            predictions,
            thresholds,
            state: Mutex::new(Mutable::default()),
        }
    }

    /// Token of the display frame this surface frame belongs to.
    #[must_use]
    pub const fn token(&self) -> Token {
        self.token
    }

    /// Pid of the process that owns the layer.
    #[must_use]
    pub const fn owner_pid(&self) -> i32 {
        self.owner_pid
    }

    /// Uid of the process that owns the layer.
    #[must_use]
    pub const fn owner_uid(&self) -> i32 {
        self.owner_uid
    }

    /// Layer name, used for stats grouping.
    #[must_use]
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// Debug name, used in dump output.
    #[must_use]
    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Whether this surface frame's token resolved to a live prediction.
    #[must_use]
    pub const fn prediction_state(&self) -> PredictionState {
        self.prediction_state
    }

    /// The predicted timeline, or [`TimelineItem::UNSET`] if there was none.
    #[must_use]
    pub const fn predictions(&self) -> TimelineItem {
        self.predictions
    }

    /// The actual timeline recorded so far.
    #[must_use]
    pub fn actuals(&self) -> TimelineItem {
        self.lock().actuals
    }

    /// The current present disposition.
    #[must_use]
    pub fn present_state(&self) -> PresentState {
        self.lock().present_state
    }

    /// The jank bitmask computed at resolution, or empty before resolution.
    #[must_use]
    pub fn jank_type(&self) -> JankType {
        self.lock().jank_type
    }

    /// Ready-stage classification, if resolved.
    #[must_use]
    pub fn frame_ready_metadata(&self) -> Option<FrameReadyMetadata> {
        self.lock().frame_ready_metadata
    }

    /// Present-stage classification, if resolved.
    #[must_use]
    pub fn frame_present_metadata(&self) -> Option<FramePresentMetadata> {
        self.lock().frame_present_metadata
    }

    /// Whether [`onPresent`](Self::on_present) has already run.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.lock().resolved
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Mutable> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reject_if_resolved(&self, state: &Mutable, site: &str) -> bool {
        if state.resolved {
            warn!(
                "surface frame {debug} (token {token:?}): {site} after present resolution, dropping",
                debug = self.debug_name,
                token = self.token,
            );
            true
        } else {
            false
        }
    }

    /// Records when the app started producing this frame.
    pub fn set_actual_start_time(&self, t: Timestamp) {
        let mut state = self.lock();
        if self.reject_if_resolved(&state, "setActualStartTime") {
            return;
        }
        state.actuals.start = t;
    }

    /// Records when the compositor received the buffer.
    pub fn set_actual_queue_time(&self, t: Timestamp) {
        let mut state = self.lock();
        if self.reject_if_resolved(&state, "setActualQueueTime") {
            return;
        }
        state.actual_queue_time = t;
    }

    /// Records when the acquire fence signaled, i.e. when the buffer became
    /// visually usable. This is the "end" of the surface's predicted triple.
    pub fn set_acquire_fence_time(&self, t: Timestamp) {
        let mut state = self.lock();
        if self.reject_if_resolved(&state, "setAcquireFenceTime") {
            return;
        }
        state.actuals.end = t;
    }

    /// Records whether this layer was composited by the GPU (client
    /// composition) rather than an overlay plane, for the timestats record.
    pub fn set_gpu_composition(&self, gpu_composition: bool) {
        let mut state = self.lock();
        if self.reject_if_resolved(&state, "setGpuComposition") {
            return;
        }
        state.gpu_composition = gpu_composition;
    }

    /// Transitions `Unknown → Presented` or `Unknown → Dropped`.
    ///
    /// `last_latch_time` is retained only when `state` is
    /// [`PresentState::Presented`] — it feeds buffer-stuffing detection.
    /// Re-entry with the same state is idempotent; a contradictory
    /// transition (switching `Presented` to `Dropped` or vice versa) is a
    /// protocol violation under the ingress contract and is logged and
    /// dropped rather than applied.
    pub fn set_present_state(&self, new_state: PresentState, last_latch_time: Timestamp) {
        let mut state = self.lock();
        if self.reject_if_resolved(&state, "setPresentState") {
            return;
        }
        if state.present_state == PresentState::Unknown || state.present_state == new_state {
            state.present_state = new_state;
            if new_state == PresentState::Presented {
                state.last_latch_time = last_latch_time;
            }
        } else {
            warn!(
                "surface frame {debug} (token {token:?}): contradictory present-state \
                 transition {from:?} -> {to:?}, dropping",
                debug = self.debug_name,
                token = self.token,
                from = state.present_state,
                to = new_state,
            );
        }
    }

    /// Finalizes this surface frame once the owning display frame's present
    /// fence has signaled.
    ///
    /// `ambient_jank` is the display frame's own jank bitmask, used as the
    /// inherited cause for [`jank::classify_surface_jank`]. `display_predicted_present`
    /// is the owning display frame's predicted present time, which anchors
    /// the buffer-stuffing window regardless of whether this surface frame
    /// has a prediction of its own. Pushes a record to `time_stats` and
    /// marks the frame read-only. A second call is a protocol violation
    /// (ordering guarantee (d) promises exactly one) and is logged and
    /// ignored.
    pub fn on_present(
        &self,
        present_time: Timestamp,
        ambient_jank: JankType,
        display_predicted_present: Timestamp,
        vsync_period: Duration,
        time_stats: &mut dyn TimeStatsSink,
    ) {
        let mut state = self.lock();
        if state.resolved {
            warn!(
                "surface frame {debug} (token {token:?}): onPresent called twice, ignoring",
                debug = self.debug_name,
                token = self.token,
            );
            return;
        }

        if state.present_state == PresentState::Presented {
            state.actuals.present = present_time;
        }

        let ready = jank::classify_ready(self.predictions.end, state.actuals.end, self.thresholds.deadline);
        let present_metadata = jank::classify_present(
            self.predictions.present,
            state.actuals.present,
            self.thresholds.present,
        );
        let jank_type = jank::classify_surface_jank(
            ambient_jank,
            ready,
            state.present_state == PresentState::Presented,
            state.last_latch_time,
            display_predicted_present,
            vsync_period,
        );

        state.frame_ready_metadata = Some(ready);
        state.frame_present_metadata = Some(present_metadata);
        state.jank_type = jank_type;
        state.resolved = true;

        time_stats.record_surface_stats(&SurfaceStatsRecord {
            owner_uid: self.owner_uid,
            layer_name: self.layer_name.clone(),
            token: self.token,
            predicted_present: self.predictions.present,
            actual_present: state.actuals.present,
            jank_type,
            gpu_composition: state.gpu_composition,
        });
    }
}

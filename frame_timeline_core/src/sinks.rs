// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! External interfaces this crate consumes: fences, a timestats sink, and a
//! trace data source.
//!
//! All three are traits with default no-op method bodies, in the style of
//! [`crate`]'s own tracing conventions: a caller only overrides the events it
//! cares about, and a [`NoopTimeStatsSink`] / [`NoopTraceDataSource`] pair is
//! available so a [`FrameTimeline`](crate::facade::FrameTimeline) can be
//! constructed without either wired up yet.

use crate::jank::JankType;
use crate::surface_frame::PresentState;
use crate::time::TimelineItem;
use crate::token::Token;

/// A display fence: a synchronization primitive that eventually reports the
/// nanosecond time its wait condition was satisfied.
///
/// Querying must never block; `signal_time` either returns the signal time
/// or reports that the fence has not fired yet.
pub trait Fence: Send {
    /// Returns the signal time in nanoseconds, or `None` if still pending.
    fn signal_time(&self) -> Option<u64>;
}

/// A fence that is considered signaled from the moment it is constructed.
///
/// Used for the "implicit finalize" case in
/// [`FrameTimeline::set_sf_wake_up`](crate::facade::FrameTimeline::set_sf_wake_up):
/// a display frame that never received its own `setSfPresent` is closed out
/// against a fence that resolves immediately.
#[derive(Debug, Clone, Copy)]
pub struct PreSignaledFence(pub u64);

impl Fence for PreSignaledFence {
    fn signal_time(&self) -> Option<u64> {
        Some(self.0)
    }
}

/// Per-surface record delivered to a [`TimeStatsSink`] at present resolution.
#[derive(Debug, Clone)]
pub struct SurfaceStatsRecord {
    /// UID of the process that owns the layer.
    pub owner_uid: i32,
    /// Layer name, for stats grouping.
    pub layer_name: String,
    /// Display-frame token this surface frame belonged to.
    pub token: Token,
    /// Predicted present time.
    pub predicted_present: crate::time::Timestamp,
    /// Actual present time.
    pub actual_present: crate::time::Timestamp,
    /// Final jank bitmask for this surface frame.
    pub jank_type: JankType,
    /// Whether this surface frame was composited by the GPU (client
    /// composition) rather than an overlay plane.
    pub gpu_composition: bool,
}

/// Per-display record delivered to a [`TimeStatsSink`] at present resolution.
#[derive(Debug, Clone, Copy)]
pub struct DisplayStatsRecord {
    /// Token identifying the display frame.
    pub token: Token,
    /// Predicted present time.
    pub predicted_present: crate::time::Timestamp,
    /// Actual present time.
    pub actual_present: crate::time::Timestamp,
    /// Final jank bitmask for the display frame.
    pub jank_type: JankType,
}

/// Receives per-frame timing statistics for offline aggregation.
///
/// All methods default to no-ops; implement only what you consume.
pub trait TimeStatsSink: Send {
    /// Called once per surface frame when its owning display frame resolves.
    fn record_surface_stats(&mut self, record: &SurfaceStatsRecord) {
        let _ = record;
    }

    /// Called once per display frame when it resolves.
    fn record_display_stats(&mut self, record: &DisplayStatsRecord) {
        let _ = record;
    }
}

/// A [`TimeStatsSink`] that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTimeStatsSink;

impl TimeStatsSink for NoopTimeStatsSink {}

/// Trace packet emitted for a resolved display frame.
#[derive(Debug, Clone, Copy)]
pub struct DisplayFramePacket {
    /// Token identifying the display frame.
    pub token: Token,
    /// Predicted timeline.
    pub predictions: TimelineItem,
    /// Actual timeline.
    pub actuals: TimelineItem,
    /// Final jank bitmask.
    pub jank_type: JankType,
}

/// Trace packet emitted for a resolved surface frame.
#[derive(Debug, Clone)]
pub struct SurfaceFramePacket {
    /// Token of the owning display frame.
    pub display_token: Token,
    /// Owning process id.
    pub owner_pid: i32,
    /// Owning user id.
    pub owner_uid: i32,
    /// Layer name, for grouping.
    pub layer_name: String,
    /// Predicted timeline.
    pub predictions: TimelineItem,
    /// Actual timeline.
    pub actuals: TimelineItem,
    /// Final jank bitmask.
    pub jank_type: JankType,
    /// Present disposition — distinguishes `Dropped` (no present time) from
    /// `Presented` (actuals.present equal to the owning display frame's)
    /// since both can otherwise show the same unset present timestamp.
    pub present_state: PresentState,
}

/// The process-wide name this crate registers its trace data source under.
pub const TRACE_DATA_SOURCE_NAME: &str = "android.surfaceflinger.frametimeline";

/// Receives trace packets as display frames resolve.
///
/// Registration ([`on_boot_finished`](Self::on_boot_finished)) is separated
/// from per-frame emission so that tests and tools that never call it can
/// still construct a [`FrameTimeline`](crate::facade::FrameTimeline) and
/// exercise the ingress API without a live trace backend.
pub trait TraceDataSource: Send {
    /// Called once, at process boot, to register the data source.
    fn on_boot_finished(&mut self) {}

    /// Called once per resolved display frame.
    fn emit_display_frame(&mut self, packet: &DisplayFramePacket) {
        let _ = packet;
    }

    /// Called once per resolved surface frame, after its owning display
    /// frame's packet.
    fn emit_surface_frame(&mut self, packet: &SurfaceFramePacket) {
        let _ = packet;
    }
}

/// A [`TraceDataSource`] that discards every packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceDataSource;

impl TraceDataSource for NoopTraceDataSource {}

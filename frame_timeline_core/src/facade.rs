// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The lifecycle owner and ingress API: [`FrameTimeline`].
//!
//! This is the one type most callers construct directly. It owns the
//! [`TokenManager`], the currently-open [`DisplayFrame`], the
//! [`PendingPresentQueue`], and the bounded history, all behind a single
//! mutex — the compositor thread originates every ingress call in a fixed
//! order, so one mutex covering all of them is sufficient (see the crate's
//! concurrency notes in [`crate`]'s top-level docs).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::clock::{Clock, SystemClock};
use crate::config::FrameTimelineConfig;
use crate::display_frame::DisplayFrame;
use crate::dump::{self, DumpSelection};
use crate::pending_queue::PendingPresentQueue;
use crate::sinks::{Fence, NoopTimeStatsSink, NoopTraceDataSource, TimeStatsSink, TraceDataSource};
use crate::surface_frame::{PredictionState, SurfaceFrame};
use crate::time::{TimelineItem, Timestamp};
use crate::token::{Token, TokenManager};

struct State {
    current: Option<Arc<DisplayFrame>>,
    pending: PendingPresentQueue,
    history: VecDeque<Arc<DisplayFrame>>,
    max_history: usize,
}

/// Correlates vsync predictions, buffer actuals, and display-fence presents
/// into a jank-classified per-vsync record.
///
/// Construct one per compositor instance. The ingress methods
/// ([`set_sf_wake_up`](Self::set_sf_wake_up), [`add_surface_frame`](Self::add_surface_frame),
/// [`set_sf_present`](Self::set_sf_present)) are meant to be called by a
/// single compositor thread in that order; [`dump`](Self::dump) and the
/// accessors may be called from anywhere at any time.
pub struct FrameTimeline {
    config: FrameTimelineConfig,
    clock: Arc<dyn Clock>,
    tokens: TokenManager,
    state: Mutex<State>,
    time_stats: Mutex<Box<dyn TimeStatsSink>>,
    trace: Mutex<Box<dyn TraceDataSource>>,
}

impl FrameTimeline {
    /// Builds a timeline with the given configuration, clock, timestats
    /// sink, and trace data source.
    ///
    /// Calls [`TraceDataSource::on_boot_finished`] once, immediately, since
    /// there is no separate boot-lifecycle hook in this API — a timeline is
    /// constructed once the compositor is ready to receive frames.
    #[must_use]
    pub fn new(
        config: FrameTimelineConfig,
        clock: Arc<dyn Clock>,
        time_stats: Box<dyn TimeStatsSink>,
        mut trace: Box<dyn TraceDataSource>,
    ) -> Self {
        trace.on_boot_finished();
        Self {
            tokens: TokenManager::with_retention(clock.clone(), config.prediction_retention),
            config,
            clock,
            state: Mutex::new(State {
                current: None,
                pending: PendingPresentQueue::new(),
                history: VecDeque::new(),
                max_history: config.max_history,
            }),
            time_stats: Mutex::new(time_stats),
            trace: Mutex::new(trace),
        }
    }

    /// Builds a timeline with default configuration, a real system clock,
    /// and no-op sinks. Convenient for tests and CLI tools that only care
    /// about dump output.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            FrameTimelineConfig::default(),
            SystemClock::shared(),
            Box::new(NoopTimeStatsSink),
            Box::new(NoopTraceDataSource),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `predictions` under a fresh token.
    ///
    /// Called by the vsync predictor, not the compositor; exposed on the
    /// facade because [`TokenManager`] is otherwise a private implementation
    /// detail.
    #[must_use]
    pub fn generate_token_for_predictions(&self, predictions: TimelineItem) -> Token {
        self.tokens.generate_token_for_predictions(predictions)
    }

    /// Creates a [`SurfaceFrame`] for `token`, resolving its prediction
    /// state through the [`TokenManager`].
    ///
    /// `token = None` yields [`PredictionState::None`] with zero
    /// predictions; a token that fails to resolve yields
    /// [`PredictionState::Expired`].
    #[must_use]
    pub fn create_surface_frame_for_token(
        &self,
        token: Option<Token>,
        owner_pid: i32,
        owner_uid: i32,
        layer_name: impl Into<String>,
        debug_name: impl Into<String>,
    ) -> Arc<SurfaceFrame> {
        let (prediction_state, predictions, resolved_token) = match token {
            None => (PredictionState::None, TimelineItem::UNSET, Token::INVALID),
            Some(token) => match self.tokens.get_predictions_for_token(token) {
                Some(predictions) => (PredictionState::Valid, predictions, token),
                None => (PredictionState::Expired, TimelineItem::UNSET, token),
            },
        };

        Arc::new(SurfaceFrame::new(
            resolved_token,
            owner_pid,
            owner_uid,
            layer_name,
            debug_name,
            prediction_state,
            predictions,
            self.config.thresholds,
        ))
    }

    /// Appends `surface_frame` to the currently open display frame.
    ///
    /// If no display frame is open (out-of-protocol), logs and drops the
    /// call.
    pub fn add_surface_frame(&self, surface_frame: Arc<SurfaceFrame>) {
        let state = self.lock();
        match &state.current {
            Some(current) => current.add_surface_frame(surface_frame),
            None => warn!("addSurfaceFrame with no open display frame, dropping"),
        }
    }

    /// Opens a new display frame at `wake_time`.
    ///
    /// If a display frame was already open (a second `setSfWakeUp` without
    /// an intervening `setSfPresent`), it is implicitly finalized with a
    /// fence pre-signaled at `wake_time`; see the open question recorded in
    /// `DESIGN.md`.
    pub fn set_sf_wake_up(&self, token: Option<Token>, wake_time: Timestamp, vsync_period: crate::time::Duration) {
        let mut state = self.lock();

        if let Some(prev) = state.current.take() {
            warn!(
                "setSfWakeUp with a display frame still open (token {token:?}); \
                 implicitly finalizing it with a pre-signaled fence",
                token = prev.token(),
            );
            prev.finalize_present(wake_time, &self.config);
            state.pending.push(Box::new(crate::sinks::PreSignaledFence(wake_time.nanos())), prev);
        }

        let (prediction_state, predictions, resolved_token) = match token {
            None => (PredictionState::None, TimelineItem::UNSET, Token::INVALID),
            Some(token) => match self.tokens.get_predictions_for_token(token) {
                Some(predictions) => (PredictionState::Valid, predictions, token),
                None => (PredictionState::Expired, TimelineItem::UNSET, token),
            },
        };

        let frame = DisplayFrame::new(
            resolved_token,
            vsync_period,
            prediction_state,
            predictions,
            wake_time,
            self.config.surface_frame_capacity_hint,
        );
        state.current = Some(Arc::new(frame));
    }

    /// Finalizes the current display frame and enqueues it against `fence`,
    /// then drains any already-signaled fences in the pending queue.
    ///
    /// If no display frame is open, logs and drops the call.
    pub fn set_sf_present(&self, end_time: Timestamp, fence: Box<dyn Fence>) {
        let mut state = self.lock();
        let Some(frame) = state.current.take() else {
            warn!("setSfPresent with no open display frame, dropping");
            return;
        };
        frame.finalize_present(end_time, &self.config);
        state.pending.push(fence, frame);
        self.drain_locked(&mut state);
    }

    /// Bounds history to the `n` most recently resolved frames, trimming
    /// immediately if the current history already exceeds `n`.
    pub fn set_max_display_frames(&self, n: usize) {
        let mut state = self.lock();
        state.max_history = n;
        while state.history.len() > n {
            state.history.pop_front();
        }
    }

    /// Restores the default history bound and clears all history.
    ///
    /// Any display frame still awaiting its fence is drained first — ready
    /// frames are resolved, emitted, and folded into history before it is
    /// cleared — so no in-flight resolution work is silently discarded.
    /// Entries whose fence still has not signaled remain in the pending
    /// queue afterward; `reset` does not invent a signal for them.
    pub fn reset(&self) {
        let mut state = self.lock();
        self.drain_locked(&mut state);
        state.history.clear();
        state.max_history = crate::config::DEFAULT_MAX_HISTORY;
        state.current = None;
    }

    fn drain_locked(&self, state: &mut State) {
        let ready = state.pending.drain_ready();
        if ready.is_empty() {
            return;
        }

        let mut time_stats = self.time_stats.lock().unwrap_or_else(|e| e.into_inner());
        let mut trace = self.trace.lock().unwrap_or_else(|e| e.into_inner());

        for (frame, signal_time) in ready {
            let jank_type = frame.resolve(Timestamp(signal_time), &self.config, &mut **time_stats);

            trace.emit_display_frame(&crate::sinks::DisplayFramePacket {
                token: frame.token(),
                predictions: frame.predictions(),
                actuals: frame.actuals(),
                jank_type,
            });
            frame.for_each_surface_frame(|sf| {
                trace.emit_surface_frame(&crate::sinks::SurfaceFramePacket {
                    display_token: frame.token(),
                    owner_pid: sf.owner_pid(),
                    owner_uid: sf.owner_uid(),
                    layer_name: sf.layer_name().to_owned(),
                    predictions: sf.predictions(),
                    actuals: sf.actuals(),
                    jank_type: sf.jank_type(),
                    present_state: sf.present_state(),
                });
            });

            state.history.push_back(frame);
            while state.history.len() > state.max_history {
                state.history.pop_front();
            }
        }
    }

    /// Renders dump output for the retained history, draining any
    /// ready-but-unresolved fences first.
    ///
    /// `selection` chooses between every retained frame and janky-only, as
    /// parsed by [`dump::parse_args`].
    #[must_use]
    pub fn dump(&self, selection: DumpSelection) -> String {
        let mut state = self.lock();
        self.drain_locked(&mut state);

        let mut out = String::new();
        for frame in &state.history {
            match selection {
                DumpSelection::All => dump::dump_all(frame, &mut out),
                DumpSelection::JankOnly => dump::dump_jank(frame, &mut out),
            }
        }
        out
    }

    /// Parses `args` and renders the requested dump, in one call — the
    /// entry point a dump CLI invokes directly.
    #[must_use]
    pub fn parse_args(&self, args: &[String]) -> String {
        let mut out = String::new();
        let selection = dump::parse_args(args, &mut out);
        out.push_str(&self.dump(selection));
        out
    }

    /// Number of resolved frames currently retained.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// A snapshot of the retained history, oldest first.
    ///
    /// Draining is not performed here; call [`dump`](Self::dump) or
    /// [`set_sf_present`](Self::set_sf_present) first if pending fences may
    /// have signaled since the last drain.
    #[must_use]
    pub fn history(&self) -> Vec<Arc<DisplayFrame>> {
        self.lock().history.iter().cloned().collect()
    }

    /// The wall clock this timeline was constructed with.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

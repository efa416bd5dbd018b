// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-timeline engine for a display compositor.
//!
//! `frame_timeline_core` correlates three overlapping streams of timing
//! data — predictions from a vsync scheduler, actual timestamps collected
//! from application buffer submissions, and compositor wake/present
//! timestamps resolved via display fences — into a unified, jank-classified
//! record per vsync.
//!
//! # Architecture
//!
//! ```text
//!   vsync predictor                  compositor
//!       │                                │
//!       ▼                                ▼
//!   generateTokenForPredictions      setSfWakeUp ──► DisplayFrame (Open)
//!       │                                │                  │
//!       │  token                         │   addSurfaceFrame │
//!       ▼                                │                  ▼
//!   createSurfaceFrameForToken ──────────┘          SurfaceFrame × N
//!                                                         │
//!                                        setSfPresent(endTime, fence)
//!                                                         │
//!                                                         ▼
//!                                          PendingPresentQueue (FIFO)
//!                                                         │
//!                                      fence.signalTime() becomes Some(t)
//!                                                         │
//!                                                         ▼
//!                                  DisplayFrame::resolve ──► jank classifier
//!                                                         │
//!                                cascades SurfaceFrame::on_present, then
//!                                emits trace + timestats, then history
//! ```
//!
//! **[`token`]** — [`TokenManager`](token::TokenManager) mints monotonic
//! tokens bound to a prediction tuple and serves lookups for 120ms.
//!
//! **[`surface_frame`]** — [`SurfaceFrame`](surface_frame::SurfaceFrame): a
//! per-layer, per-buffer timing record.
//!
//! **[`display_frame`]** — [`DisplayFrame`](display_frame::DisplayFrame): a
//! per-vsync aggregate owning its surface frames and its own lifecycle.
//!
//! **[`pending_queue`]** — the FIFO of display frames awaiting a signaled
//! present fence.
//!
//! **[`jank`]** — the deterministic, clock-free classifier that turns
//! predicted-vs-actual deltas into a [`JankType`](jank::JankType) bitmask.
//!
//! **[`facade`]** — [`FrameTimeline`](facade::FrameTimeline), the lifecycle
//! owner most callers construct: the ingress API, the bounded history, and
//! the fan-out to trace and timestats sinks.
//!
//! **[`sinks`]** — the [`Fence`](sinks::Fence), [`TimeStatsSink`](sinks::TimeStatsSink),
//! and [`TraceDataSource`](sinks::TraceDataSource) traits this crate
//! consumes, each with default no-op methods.
//!
//! **[`dump`]** — text rendering and CLI flag parsing for the dump path.
//!
//! **[`clock`]** — the [`Clock`](clock::Clock) abstraction used only to
//! time out stale predictions; every other timestamp in this crate is
//! supplied by the caller, never read from a clock internally.
//!
//! **[`config`]** — [`FrameTimelineConfig`](config::FrameTimelineConfig),
//! the tunable thresholds, retention window, and history bound.
//!
//! **[`error`]** — the small `thiserror` types for the few genuinely
//! fallible operations (config validation, dump flag parsing); the
//! compositor ingress path itself never returns a `Result` — see the error
//! handling notes on [`facade::FrameTimeline`].
//!
//! # Crate features
//!
//! - `test-util` (disabled by default): exposes [`clock::FakeClock`] outside
//!   of this crate's own unit tests, for integration tests that need
//!   deterministic control over retention-window expiry.

pub mod clock;
pub mod config;
pub mod display_frame;
pub mod dump;
pub mod error;
pub mod facade;
pub mod jank;
pub mod pending_queue;
pub mod sinks;
pub mod surface_frame;
pub mod time;
pub mod token;

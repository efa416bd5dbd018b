// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for frame-timeline
//! diagnostics.
//!
//! This crate provides [`TraceDataSource`](frame_timeline_core::sinks::TraceDataSource)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-frame output.
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from
//!   recorded bytes, for loading into `chrome://tracing` or Perfetto.

pub mod chrome;
pub mod pretty;
pub mod recorder;

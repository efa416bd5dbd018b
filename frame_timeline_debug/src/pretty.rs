// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceDataSource`] and writes one line per
//! resolved frame to a [`Write`](std::io::Write) destination (default:
//! stderr). Timestamps are printed in microseconds.

use std::io::Write;

use frame_timeline_core::sinks::{DisplayFramePacket, SurfaceFramePacket, TraceDataSource};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self { writer: Box::new(std::io::stderr()) }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    fn us(nanos: u64) -> f64 {
        nanos as f64 / 1000.0
    }
}

impl<W: Write> TraceDataSource for PrettyPrintSink<W> {
    fn emit_display_frame(&mut self, packet: &DisplayFramePacket) {
        let _ = writeln!(
            self.writer,
            "[display] token={} predPresent={:.1}µs actualPresent={:.1}µs jank={:?}",
            packet.token.raw(),
            Self::us(packet.predictions.present.nanos()),
            Self::us(packet.actuals.present.nanos()),
            packet.jank_type,
        );
    }

    fn emit_surface_frame(&mut self, packet: &SurfaceFramePacket) {
        let _ = writeln!(
            self.writer,
            "[surface] {} (pid={} uid={}) display={} predPresent={:.1}µs \
             actualPresent={:.1}µs jank={:?} present={:?}",
            packet.layer_name,
            packet.owner_pid,
            packet.owner_uid,
            packet.display_token.raw(),
            Self::us(packet.predictions.present.nanos()),
            Self::us(packet.actuals.present.nanos()),
            packet.jank_type,
            packet.present_state,
        );
    }
}

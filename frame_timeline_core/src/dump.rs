// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text rendering for the dump CLI.
//!
//! [`format_display_frame`] renders one [`DisplayFrame`] and its surface
//! frames relative to a shared base time, for legibility against
//! nanosecond-scale absolute timestamps. [`parse_args`] is the entry point a
//! dump CLI calls with its argument vector.

use std::fmt::Write as _;

use crate::display_frame::DisplayFrame;
use crate::error::UnknownFlag;
use crate::time::Timestamp;

/// Renders `frame`'s aggregate line plus one line per surface frame into
/// `out`, with timestamps shown relative to `base_time`.
pub fn format_display_frame(frame: &DisplayFrame, base_time: Timestamp, out: &mut String) {
    let actuals = frame.actuals();
    let _ = writeln!(
        out,
        "DisplayFrame token={token:?} jank={jank:?} start={start} end={end} present={present}",
        token = frame.token(),
        jank = frame.jank_type(),
        start = relative(actuals.start, base_time),
        end = relative(actuals.end, base_time),
        present = relative(actuals.present, base_time),
    );

    frame.for_each_surface_frame(|sf| {
        let actuals = sf.actuals();
        let _ = writeln!(
            out,
            "  SurfaceFrame {debug:?} layer={layer:?} state={state:?} jank={jank:?} \
             start={start} end={end} present={present}",
            debug = sf.debug_name(),
            layer = sf.layer_name(),
            state = sf.present_state(),
            jank = sf.jank_type(),
            start = relative(actuals.start, base_time),
            end = relative(actuals.end, base_time),
            present = relative(actuals.present, base_time),
        );
    });
}

/// Emits `frame` into `out` unconditionally.
pub fn dump_all(frame: &DisplayFrame, out: &mut String) {
    format_display_frame(frame, frame.base_time(), out);
}

/// Emits `frame` into `out` only if it, or any surface frame it contains,
/// is janky.
pub fn dump_jank(frame: &DisplayFrame, out: &mut String) {
    if frame.is_janky() {
        format_display_frame(frame, frame.base_time(), out);
    }
}

fn relative(t: Timestamp, base: Timestamp) -> String {
    if !t.is_set() {
        return "-".to_owned();
    }
    if !base.is_set() {
        return format!("{}ns", t.nanos());
    }
    format!("+{}ns", t.nanos().saturating_sub(base.nanos()))
}

/// Which frames to emit, as requested by a dump CLI's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpSelection {
    /// `-all`: emit every retained frame.
    All,
    /// `-jank`: emit only janky frames.
    JankOnly,
}

/// Parses a dump CLI's flag vector.
///
/// Recognizes `-jank` and `-all`. An unrecognized flag is not fatal: it is
/// appended to `out` as usage text and parsing continues with whatever
/// selection was already determined (defaulting to [`DumpSelection::All`]
/// if no valid flag was seen).
pub fn parse_args(args: &[String], out: &mut String) -> DumpSelection {
    let mut selection = DumpSelection::All;
    for arg in args {
        match arg.as_str() {
            "-jank" => selection = DumpSelection::JankOnly,
            "-all" => selection = DumpSelection::All,
            _ => {
                let err = UnknownFlag { flag: arg.clone() };
                let _ = writeln!(out, "{err}");
            }
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args_defaults_to_all() {
        let mut out = String::new();
        assert_eq!(parse_args(&[], &mut out), DumpSelection::All);
        assert!(out.is_empty());
    }

    #[test]
    fn parse_args_recognizes_jank_flag() {
        let mut out = String::new();
        let args = vec!["-jank".to_owned()];
        assert_eq!(parse_args(&args, &mut out), DumpSelection::JankOnly);
        assert!(out.is_empty());
    }

    #[test]
    fn parse_args_reports_unknown_flags_without_failing() {
        let mut out = String::new();
        let args = vec!["-wat".to_owned()];
        let selection = parse_args(&args, &mut out);
        assert_eq!(selection, DumpSelection::All);
        assert!(out.contains("-wat"), "got: {out}");
    }
}

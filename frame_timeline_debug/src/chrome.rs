// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer, one
//! complete-event (`"ph": "X"`) per display frame and per surface frame.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::Write;

use serde_json::{Value, json};

use crate::recorder::{DecodeError, RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Display frames are emitted on a synthetic `pid` of 0; each surface frame
/// gets its own `pid` derived from `owner_pid` so tracks group by process,
/// matching how a real compositor's layers are visually separated.
///
/// Decoding stops at the first malformed record and that error is returned;
/// events decoded up to that point are not written.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> Result<(), ChromeExportError> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded? {
            RecordedEvent::DisplayFrame { token, predictions, actuals, jank_type } => {
                events.push(json!({
                    "ph": "X",
                    "name": "DisplayFrame",
                    "cat": "SurfaceFlinger",
                    "ts": nanos_to_us(actuals.start.nanos()),
                    "dur": nanos_to_us(actuals.present.nanos().saturating_sub(actuals.start.nanos())),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "token": token.raw(),
                        "predicted_present_us": nanos_to_us(predictions.present.nanos()),
                        "actual_present_us": nanos_to_us(actuals.present.nanos()),
                        "jank": format!("{jank_type:?}"),
                    }
                }));
            }
            RecordedEvent::SurfaceFrame {
                display_token,
                owner_pid,
                layer_name,
                predictions,
                actuals,
                jank_type,
                present_state,
                ..
            } => {
                events.push(json!({
                    "ph": "X",
                    "name": layer_name,
                    "cat": "SurfaceFrame",
                    "ts": nanos_to_us(actuals.start.nanos()),
                    "dur": nanos_to_us(actuals.end.nanos().saturating_sub(actuals.start.nanos())),
                    "pid": owner_pid,
                    "tid": 0,
                    "args": {
                        "display_token": display_token.raw(),
                        "predicted_present_us": nanos_to_us(predictions.present.nanos()),
                        "actual_present_us": nanos_to_us(actuals.present.nanos()),
                        "jank": format!("{jank_type:?}"),
                        "present_state": format!("{present_state:?}"),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events).map_err(ChromeExportError::Json)
}

/// Error produced by [`export`].
#[derive(Debug, thiserror::Error)]
pub enum ChromeExportError {
    /// The recorded byte stream was malformed.
    #[error("malformed trace recording: {0}")]
    Decode(#[from] DecodeError),
    /// Writing the JSON output failed.
    #[error("failed to write trace JSON: {0}")]
    Json(#[source] serde_json::Error),
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use frame_timeline_core::jank::JankType;
    use frame_timeline_core::sinks::{DisplayFramePacket, SurfaceFramePacket, TraceDataSource};
    use frame_timeline_core::surface_frame::PresentState;
    use frame_timeline_core::time::{TimelineItem, Timestamp};
    use frame_timeline_core::token::Token;

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.emit_display_frame(&DisplayFramePacket {
            token: Token::from_raw(0),
            predictions: TimelineItem::new(Timestamp(0), Timestamp(10_000_000), Timestamp(16_000_000)),
            actuals: TimelineItem::new(Timestamp(0), Timestamp(10_000_000), Timestamp(16_000_000)),
            jank_type: JankType::empty(),
        });
        rec.emit_surface_frame(&SurfaceFramePacket {
            display_token: Token::from_raw(0),
            owner_pid: 100,
            owner_uid: 1000,
            layer_name: "StatusBar".to_owned(),
            predictions: TimelineItem::new(Timestamp(0), Timestamp(8_000_000), Timestamp(16_000_000)),
            actuals: TimelineItem::new(Timestamp(0), Timestamp(8_000_000), Timestamp(16_000_000)),
            jank_type: JankType::empty(),
            present_state: PresentState::Presented,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["name"], "DisplayFrame");
        assert_eq!(parsed[1]["name"], "StatusBar");
        assert_eq!(parsed[1]["pid"], 100);
        assert_eq!(parsed[1]["args"]["present_state"], "Presented");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn export_propagates_decode_errors() {
        let mut out = Vec::new();
        let err = export(&[0xFF], &mut out).unwrap_err();
        assert!(matches!(err, ChromeExportError::Decode(DecodeError::UnknownTag(0xFF))));
    }
}

// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary trace recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceDataSource`] and encodes display- and
//! surface-frame packets into a `Vec<u8>` as fixed-size little-endian
//! records. [`decode`] reads them back as an iterator of
//! `Result<RecordedEvent, DecodeError>`.

use frame_timeline_core::jank::JankType;
use frame_timeline_core::sinks::{DisplayFramePacket, SurfaceFramePacket, TraceDataSource};
use frame_timeline_core::surface_frame::PresentState;
use frame_timeline_core::time::{TimelineItem, Timestamp};
use frame_timeline_core::token::Token;
use thiserror::Error;

const TAG_DISPLAY_FRAME: u8 = 1;
const TAG_SURFACE_FRAME: u8 = 2;

/// A [`TraceDataSource`] that encodes packets into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_timestamp(&mut self, t: Timestamp) {
        self.write_u64(t.nanos());
    }

    fn write_timeline_item(&mut self, item: TimelineItem) {
        self.write_timestamp(item.start);
        self.write_timestamp(item.end);
        self.write_timestamp(item.present);
    }

    fn write_jank(&mut self, jank: JankType) {
        self.write_u32(jank.bits());
    }

    fn write_present_state(&mut self, state: PresentState) {
        self.write_u8(present_state_tag(state));
    }

    fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "layer names are capped at u32::MAX bytes for recording"
        )]
        self.write_u32(bytes.len().min(u32::MAX as usize) as u32);
        self.buf.extend_from_slice(bytes);
    }
}

const PRESENT_STATE_UNKNOWN: u8 = 0;
const PRESENT_STATE_PRESENTED: u8 = 1;
const PRESENT_STATE_DROPPED: u8 = 2;

fn present_state_tag(state: PresentState) -> u8 {
    match state {
        PresentState::Unknown => PRESENT_STATE_UNKNOWN,
        PresentState::Presented => PRESENT_STATE_PRESENTED,
        PresentState::Dropped => PRESENT_STATE_DROPPED,
    }
}

impl TraceDataSource for RecorderSink {
    fn emit_display_frame(&mut self, packet: &DisplayFramePacket) {
        self.write_u8(TAG_DISPLAY_FRAME);
        self.write_i64(packet.token.raw());
        self.write_timeline_item(packet.predictions);
        self.write_timeline_item(packet.actuals);
        self.write_jank(packet.jank_type);
    }

    fn emit_surface_frame(&mut self, packet: &SurfaceFramePacket) {
        self.write_u8(TAG_SURFACE_FRAME);
        self.write_i64(packet.display_token.raw());
        self.write_i32(packet.owner_pid);
        self.write_i32(packet.owner_uid);
        self.write_string(&packet.layer_name);
        self.write_timeline_item(packet.predictions);
        self.write_timeline_item(packet.actuals);
        self.write_jank(packet.jank_type);
        self.write_present_state(packet.present_state);
    }
}

/// A decoded trace record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A resolved display frame.
    DisplayFrame {
        /// Token identifying the display frame.
        token: Token,
        /// Predicted timeline.
        predictions: TimelineItem,
        /// Actual timeline.
        actuals: TimelineItem,
        /// Final jank bitmask.
        jank_type: JankType,
    },
    /// A resolved surface frame.
    SurfaceFrame {
        /// Token of the owning display frame.
        display_token: Token,
        /// Owning process id.
        owner_pid: i32,
        /// Owning user id.
        owner_uid: i32,
        /// Layer name.
        layer_name: String,
        /// Predicted timeline.
        predictions: TimelineItem,
        /// Actual timeline.
        actuals: TimelineItem,
        /// Final jank bitmask.
        jank_type: JankType,
        /// Present disposition — distinguishes `Dropped` from `Presented`
        /// when `actuals.present` is unset.
        present_state: PresentState,
    },
}

/// Error decoding a byte stream produced by [`RecorderSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte stream ended in the middle of a record.
    #[error("unexpected end of stream while decoding a trace record")]
    UnexpectedEof,
    /// A tag byte did not match any known record kind.
    #[error("unrecognized record tag {0}")]
    UnknownTag(u8),
    /// A jank bitmask contained bits this version of the crate does not
    /// recognize.
    #[error("jank bitmask {0:#x} contains unrecognized bits")]
    UnknownJankBits(u32),
    /// A present-state tag byte did not match any known variant.
    #[error("unrecognized present-state tag {0}")]
    UnknownPresentState(u8),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// records. The iterator yields one `Err` and then stops as soon as the
/// stream is malformed; it never panics on untrusted input.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter { data: bytes, pos: 0, done: false }
}

/// Iterator over decoded trace records.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        if self.remaining() < 1 {
            return Err(DecodeError::UnexpectedEof);
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        if self.remaining() < 4 {
            return Err(DecodeError::UnexpectedEof);
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(v)
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        if self.remaining() < 8 {
            return Err(DecodeError::UnexpectedEof);
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.read_u64().map(|v| v as i64)
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.read_u32().map(|v| v as i32)
    }

    fn read_timestamp(&mut self) -> Result<Timestamp, DecodeError> {
        Ok(Timestamp(self.read_u64()?))
    }

    fn read_timeline_item(&mut self) -> Result<TimelineItem, DecodeError> {
        Ok(TimelineItem::new(
            self.read_timestamp()?,
            self.read_timestamp()?,
            self.read_timestamp()?,
        ))
    }

    fn read_jank(&mut self) -> Result<JankType, DecodeError> {
        let bits = self.read_u32()?;
        JankType::from_bits(bits).ok_or(DecodeError::UnknownJankBits(bits))
    }

    fn read_present_state(&mut self) -> Result<PresentState, DecodeError> {
        let tag = self.read_u8()?;
        match tag {
            PRESENT_STATE_UNKNOWN => Ok(PresentState::Unknown),
            PRESENT_STATE_PRESENTED => Ok(PresentState::Presented),
            PRESENT_STATE_DROPPED => Ok(PresentState::Dropped),
            other => Err(DecodeError::UnknownPresentState(other)),
        }
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u32()? as usize;
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn decode_display_frame(&mut self) -> Result<RecordedEvent, DecodeError> {
        Ok(RecordedEvent::DisplayFrame {
            token: Token::from_raw(self.read_i64()?),
            predictions: self.read_timeline_item()?,
            actuals: self.read_timeline_item()?,
            jank_type: self.read_jank()?,
        })
    }

    fn decode_surface_frame(&mut self) -> Result<RecordedEvent, DecodeError> {
        Ok(RecordedEvent::SurfaceFrame {
            display_token: Token::from_raw(self.read_i64()?),
            owner_pid: self.read_i32()?,
            owner_uid: self.read_i32()?,
            layer_name: self.read_string()?,
            predictions: self.read_timeline_item()?,
            actuals: self.read_timeline_item()?,
            jank_type: self.read_jank()?,
            present_state: self.read_present_state()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Result<RecordedEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining() == 0 {
            return None;
        }
        let result = self.read_u8().and_then(|tag| match tag {
            TAG_DISPLAY_FRAME => self.decode_display_frame(),
            TAG_SURFACE_FRAME => self.decode_surface_frame(),
            other => Err(DecodeError::UnknownTag(other)),
        });
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_display_packet() -> DisplayFramePacket {
        DisplayFramePacket {
            token: Token::INVALID,
            predictions: TimelineItem::new(Timestamp(0), Timestamp(10_000_000), Timestamp(16_000_000)),
            actuals: TimelineItem::new(Timestamp(0), Timestamp(10_000_000), Timestamp(16_000_000)),
            jank_type: JankType::empty(),
        }
    }

    #[test]
    fn round_trip_display_frame() {
        let mut rec = RecorderSink::new();
        let orig = sample_display_packet();
        rec.emit_display_frame(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect::<Result<_, _>>().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::DisplayFrame { predictions, actuals, jank_type, .. } => {
                assert_eq!(*predictions, orig.predictions);
                assert_eq!(*actuals, orig.actuals);
                assert_eq!(*jank_type, orig.jank_type);
            }
            other => panic!("expected DisplayFrame, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_surface_frame() {
        let mut rec = RecorderSink::new();
        let orig = SurfaceFramePacket {
            display_token: Token::INVALID,
            owner_pid: 100,
            owner_uid: 1000,
            layer_name: "L".to_owned(),
            predictions: TimelineItem::new(Timestamp(0), Timestamp(8_000_000), Timestamp(16_000_000)),
            actuals: TimelineItem::new(Timestamp(0), Timestamp(8_000_000), Timestamp(16_000_000)),
            jank_type: JankType::APP_DEADLINE_MISSED,
            present_state: PresentState::Presented,
        };
        rec.emit_surface_frame(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect::<Result<_, _>>().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::SurfaceFrame { owner_pid, layer_name, jank_type, present_state, .. } => {
                assert_eq!(*owner_pid, 100);
                assert_eq!(layer_name, "L");
                assert_eq!(*jank_type, JankType::APP_DEADLINE_MISSED);
                assert_eq!(*present_state, PresentState::Presented);
            }
            other => panic!("expected SurfaceFrame, got {other:?}"),
        }
    }

    #[test]
    fn present_state_distinguishes_dropped_from_presented_at_zero() {
        let mut rec = RecorderSink::new();
        rec.emit_surface_frame(&SurfaceFramePacket {
            display_token: Token::INVALID,
            owner_pid: 100,
            owner_uid: 1000,
            layer_name: "L".to_owned(),
            predictions: TimelineItem::UNSET,
            actuals: TimelineItem::UNSET,
            jank_type: JankType::empty(),
            present_state: PresentState::Dropped,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect::<Result<_, _>>().unwrap();
        match &events[0] {
            RecordedEvent::SurfaceFrame { actuals, present_state, .. } => {
                assert_eq!(actuals.present, Timestamp::UNSET);
                assert_eq!(*present_state, PresentState::Dropped);
            }
            other => panic!("expected SurfaceFrame, got {other:?}"),
        }
    }

    #[test]
    fn unknown_present_state_tag_is_reported_not_panicked() {
        let mut rec = RecorderSink::new();
        rec.emit_surface_frame(&SurfaceFramePacket {
            display_token: Token::INVALID,
            owner_pid: 0,
            owner_uid: 0,
            layer_name: String::new(),
            predictions: TimelineItem::UNSET,
            actuals: TimelineItem::UNSET,
            jank_type: JankType::empty(),
            present_state: PresentState::Unknown,
        });
        let mut bytes = rec.into_bytes();
        *bytes.last_mut().unwrap() = 0xFF;

        let result: Result<Vec<_>, _> = decode(&bytes).collect();
        assert_eq!(result, Err(DecodeError::UnknownPresentState(0xFF)));
    }

    #[test]
    fn round_trip_multiple_events() {
        let mut rec = RecorderSink::new();
        rec.emit_display_frame(&sample_display_packet());
        rec.emit_display_frame(&sample_display_packet());

        let events: Vec<_> = decode(rec.as_bytes()).collect::<Result<_, _>>().unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect::<Result<_, _>>().unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_buffer_reports_unexpected_eof() {
        let mut rec = RecorderSink::new();
        rec.emit_display_frame(&sample_display_packet());
        let mut bytes = rec.into_bytes();
        bytes.truncate(bytes.len() - 2);

        let result: Result<Vec<_>, _> = decode(&bytes).collect();
        assert_eq!(result, Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn unknown_tag_is_reported_not_panicked() {
        let result: Result<Vec<_>, _> = decode(&[0xFF]).collect();
        assert_eq!(result, Err(DecodeError::UnknownTag(0xFF)));
    }
}

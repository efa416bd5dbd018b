// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host timestamps and durations.
//!
//! Every timestamp flowing through this crate is a single [`Timestamp`]:
//! nanoseconds since an arbitrary monotonic epoch shared by the caller's
//! vsync predictor, the compositor, and the display HAL. There is no
//! timebase conversion here — callers are expected to already be on a common
//! clock (the compositor's own monotonic clock) before calling in.
//!
//! [`Timestamp::UNSET`] (zero) is the sentinel for "this stage has not
//! happened yet". It is distinguishable from a real timestamp in practice
//! because no caller legitimately reports time zero; treating it as a
//! sentinel rather than wrapping every field in `Option` keeps
//! [`TimelineItem`] cheap to copy and compare.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time, in nanoseconds since an arbitrary shared monotonic epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The sentinel for "not yet recorded".
    pub const UNSET: Self = Self(0);

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Whether this timestamp has been recorded.
    #[inline]
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }

    /// Signed difference `self - earlier`, in nanoseconds.
    ///
    /// Unlike [`Sub`], this does not panic or saturate: a negative result
    /// means `self` is earlier than `earlier`, which the jank classifier
    /// depends on to tell early presents from late ones.
    #[inline]
    #[must_use]
    pub fn signed_diff(self, earlier: Self) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }

    /// Absolute difference between two timestamps, saturating at zero.
    #[inline]
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> Duration {
        Duration(self.0.abs_diff(other.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Checked subtraction of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_sub(self, duration: Duration) -> Option<Self> {
        match self.0.checked_sub(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A duration in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// Zero duration.
    pub const ZERO: Self = Self(0);

    /// Constructs a duration from a whole number of milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000_000)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}ns)", self.0)
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// The start/ready/present triple shared by predictions and actuals.
///
/// `start` is when work on the frame began (app input or composition
/// wake-up). `end` is when that work finished (buffer ready, or composition
/// finished building the display list). `present` is when the result
/// actually reached the screen. Any field may be [`Timestamp::UNSET`] if
/// that stage has not been reported yet.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct TimelineItem {
    /// When work began.
    pub start: Timestamp,
    /// When work finished.
    pub end: Timestamp,
    /// When the frame was presented.
    pub present: Timestamp,
}

impl TimelineItem {
    /// An item with every field unset.
    pub const UNSET: Self = Self {
        start: Timestamp::UNSET,
        end: Timestamp::UNSET,
        present: Timestamp::UNSET,
    };

    /// Creates an item with all three timestamps.
    #[must_use]
    pub const fn new(start: Timestamp, end: Timestamp, present: Timestamp) -> Self {
        Self { start, end, present }
    }

    /// Whether any field has been recorded.
    #[must_use]
    pub const fn any_set(self) -> bool {
        self.start.is_set() || self.end.is_set() || self.present.is_set()
    }
}

impl fmt::Debug for TimelineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineItem")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("present", &self.present)
            .finish()
    }
}

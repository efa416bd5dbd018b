// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wall-clock abstraction for prediction-retention sweeps.
//!
//! [`TokenManager`](crate::token::TokenManager) needs to know "how long ago"
//! a prediction was registered, independent of any timestamp the caller
//! supplies. [`Clock`] exists so that retention-window tests can advance time
//! deterministically instead of calling [`std::thread::sleep`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::time::Timestamp;

/// A source of monotonic wall-clock readings.
///
/// Implementations must be cheap to call and safe to share across threads;
/// [`FrameTimeline`](crate::facade::FrameTimeline) holds one behind an
/// [`Arc`].
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time as a [`Timestamp`].
    fn now(&self) -> Timestamp;
}

/// A [`Clock`] backed by [`std::time::Instant`], anchored at construction.
///
/// Readings are nanoseconds elapsed since the clock was created, offset by
/// one so that [`Timestamp::UNSET`] is never returned for a real reading.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Creates a new clock anchored to the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }

    /// Wraps this clock in an `Arc<dyn Clock>` for use by
    /// [`FrameTimeline`](crate::facade::FrameTimeline).
    #[must_use]
    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = self.epoch.elapsed().as_nanos() as u64;
        Timestamp(elapsed.saturating_add(1))
    }
}

#[cfg(any(test, feature = "test-util"))]
mod fake {
    use super::{Clock, Timestamp};
    use std::fmt;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// A [`Clock`] whose reading is set explicitly by test code.
    ///
    /// Starts at `Timestamp(1)` so a freshly-constructed clock still counts
    /// as "set" under [`Timestamp::is_set`].
    pub struct FakeClock {
        now: AtomicU64,
    }

    impl fmt::Debug for FakeClock {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FakeClock")
                .field("now", &self.now.load(Ordering::Relaxed))
                .finish()
        }
    }

    impl FakeClock {
        /// Creates a clock starting at the given nanosecond reading.
        #[must_use]
        pub fn new(start_nanos: u64) -> Self {
            Self { now: AtomicU64::new(start_nanos.max(1)) }
        }

        /// Advances the clock by `nanos` and returns the new reading.
        pub fn advance(&self, nanos: u64) -> Timestamp {
            let new = self.now.fetch_add(nanos, Ordering::Relaxed) + nanos;
            Timestamp(new)
        }

        /// Sets the clock to an explicit reading.
        pub fn set(&self, nanos: u64) {
            self.now.store(nanos.max(1), Ordering::Relaxed);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Timestamp {
            Timestamp(self.now.load(Ordering::Relaxed))
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use fake::FakeClock;

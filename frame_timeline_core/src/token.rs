// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Token-keyed prediction registry.
//!
//! The vsync predictor calls [`TokenManager::generate_token_for_predictions`]
//! once per predicted vsync to get a [`Token`] it can hand to the app and to
//! the compositor. Either side later redeems that token for the original
//! [`TimelineItem`] via [`TokenManager::get_predictions_for_token`].
//!
//! Predictions are retained for a bounded window
//! ([`TokenManager::retention`]) rather than forever, since a token whose
//! frame never shows up (the app dropped it, or the predictor over-produced)
//! would otherwise leak. Expiry is a lazy sweep performed on the next
//! `generate_token_for_predictions` call rather than a background timer —
//! this crate does no thread spawning of its own.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::time::{Duration, TimelineItem, Timestamp};

/// Default retention window for registered predictions (120ms).
pub const DEFAULT_RETENTION: Duration = Duration::from_millis(120);

/// An opaque handle identifying one set of vsync predictions.
///
/// Tokens are monotonically increasing starting at zero.
/// [`Token::INVALID`] is handed out by callers that have no prediction to
/// offer (e.g. a `SurfaceFrame` created without ever calling the predictor).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(i64);

impl Token {
    /// Sentinel meaning "no prediction available".
    pub const INVALID: Self = Self(-1);

    /// Whether this token is [`Token::INVALID`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Returns the raw integer value, for trace emission and dump output.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Reconstructs a token from a raw integer value, e.g. one recovered
    /// from a recorded trace. Never minted by [`TokenManager`]; only use
    /// this to round-trip a value that was already a valid token.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

struct Entry {
    registered_at: Timestamp,
    predictions: TimelineItem,
}

struct Registry {
    next: i64,
    entries: BTreeMap<Token, Entry>,
}

/// Generates tokens and retains their predictions for a bounded window.
///
/// All state lives behind a single internal mutex; callers never need to
/// coordinate access themselves.
pub struct TokenManager {
    clock: Arc<dyn Clock>,
    retention: Duration,
    registry: Mutex<Registry>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.registry.lock().unwrap_or_else(|e| e.into_inner()).entries.len();
        f.debug_struct("TokenManager")
            .field("retention", &self.retention)
            .field("registered", &len)
            .finish()
    }
}

impl TokenManager {
    /// Creates a manager using the default 120ms retention window.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_retention(clock, DEFAULT_RETENTION)
    }

    /// Creates a manager with an explicit retention window.
    #[must_use]
    pub fn with_retention(clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self {
            clock,
            retention,
            registry: Mutex::new(Registry { next: 0, entries: BTreeMap::new() }),
        }
    }

    /// The configured retention window.
    #[must_use]
    pub const fn retention(&self) -> Duration {
        self.retention
    }

    /// Registers `predictions` under a freshly minted token.
    ///
    /// Before inserting, sweeps any entries whose retention window has
    /// elapsed. The sweep never removes the entry being inserted, since it
    /// is always fresher than the cutoff.
    pub fn generate_token_for_predictions(&self, predictions: TimelineItem) -> Token {
        let now = self.clock.now();
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        sweep(&mut registry.entries, now, self.retention);

        let token = Token(registry.next);
        registry.next += 1;
        registry.entries.insert(token, Entry { registered_at: now, predictions });
        token
    }

    /// Looks up the predictions registered for `token`, if the token is
    /// still within its retention window.
    ///
    /// Does not sweep: a read never mutates the registry, so concurrent
    /// readers never contend on anything but the lookup itself.
    #[must_use]
    pub fn get_predictions_for_token(&self, token: Token) -> Option<TimelineItem> {
        if !token.is_valid() {
            return None;
        }
        let now = self.clock.now();
        let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let entry = registry.entries.get(&token)?;
        if now - entry.registered_at <= self.retention {
            Some(entry.predictions)
        } else {
            None
        }
    }

    /// Number of predictions currently retained, for diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    /// Whether the registry currently holds no predictions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sweep(entries: &mut BTreeMap<Token, Entry>, now: Timestamp, retention: Duration) {
    entries.retain(|_, entry| now - entry.registered_at <= retention);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use std::sync::Arc;

    fn item(n: u64) -> TimelineItem {
        TimelineItem::new(Timestamp(n), Timestamp(n + 1), Timestamp(n + 2))
    }

    #[test]
    fn tokens_are_monotonic_starting_at_zero() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(1));
        let mgr = TokenManager::new(clock);
        let a = mgr.generate_token_for_predictions(item(1));
        let b = mgr.generate_token_for_predictions(item(2));
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
    }

    #[test]
    fn redeeming_within_window_returns_the_registered_predictions() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(1));
        let mgr = TokenManager::new(clock);
        let t = mgr.generate_token_for_predictions(item(10));
        assert_eq!(mgr.get_predictions_for_token(t), Some(item(10)));
    }

    #[test]
    fn entries_expire_after_the_retention_window() {
        let fake = Arc::new(FakeClock::new(1));
        let clock: Arc<dyn Clock> = fake.clone();
        let mgr = TokenManager::new(clock);
        let t = mgr.generate_token_for_predictions(item(10));

        fake.advance(Duration::from_millis(200).nanos());
        assert_eq!(mgr.get_predictions_for_token(t), None);
    }

    #[test]
    fn generating_a_token_sweeps_expired_entries() {
        let fake = Arc::new(FakeClock::new(1));
        let clock: Arc<dyn Clock> = fake.clone();
        let mgr = TokenManager::new(clock);
        let _old = mgr.generate_token_for_predictions(item(1));
        assert_eq!(mgr.len(), 1);

        fake.advance(Duration::from_millis(200).nanos());
        let _new = mgr.generate_token_for_predictions(item(2));
        assert_eq!(mgr.len(), 1, "the expired entry should have been swept");
    }

    #[test]
    fn invalid_token_never_resolves() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(1));
        let mgr = TokenManager::new(clock);
        assert_eq!(mgr.get_predictions_for_token(Token::INVALID), None);
    }
}

// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the genuinely fallible corners of this crate.
//!
//! Nothing on the compositor ingress path returns a `Result`: protocol
//! violations are logged and dropped, and a missing or expired prediction is
//! a plain enum state, not an error (see [`crate::token::TokenManager`] and
//! [`crate::facade`]). The types here cover the two places that are
//! fallible in the ordinary sense — building a [`FrameTimelineConfig`] and
//! parsing dump CLI flags.
//!
//! [`FrameTimelineConfig`]: crate::config::FrameTimelineConfig

use thiserror::Error;

/// A [`FrameTimelineConfig`](crate::config::FrameTimelineConfig) failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_history` was zero, so no resolved frame could ever be retained.
    #[error("max_history must be at least 1")]
    ZeroHistory,
}

/// [`crate::dump::parse_args`] was given a flag it does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized flag {flag:?}; supported flags are -jank, -all")]
pub struct UnknownFlag {
    /// The flag text as supplied by the caller.
    pub flag: String,
}

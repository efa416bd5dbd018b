// Copyright 2026 the Frame Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! FIFO of display frames awaiting their present fence.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::display_frame::DisplayFrame;
use crate::sinks::Fence;

/// A `(fence, display frame)` pair waiting for its fence to signal.
struct Pending {
    fence: Box<dyn Fence>,
    frame: Arc<DisplayFrame>,
}

/// FIFO queue of display frames whose present fence has not yet signaled.
///
/// Draining never reorders: if the frame at the front of the queue has not
/// signaled yet, later frames wait too, even if their own fences already
/// have. This keeps resolved frames appended to history in present order.
#[derive(Default)]
pub(crate) struct PendingPresentQueue {
    entries: VecDeque<Pending>,
}

impl PendingPresentQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, fence: Box<dyn Fence>, frame: Arc<DisplayFrame>) {
        self.entries.push_back(Pending { fence, frame });
    }

    /// Pops and returns `(frame, signal_time)` for every entry at the front
    /// of the queue whose fence has signaled, stopping at the first one
    /// that has not.
    pub(crate) fn drain_ready(&mut self) -> Vec<(Arc<DisplayFrame>, u64)> {
        let mut ready = Vec::new();
        while let Some(front) = self.entries.front() {
            match front.fence.signal_time() {
                Some(t) => {
                    let entry = self.entries.pop_front().expect("front just matched");
                    ready.push((entry.frame, t));
                }
                None => break,
            }
        }
        ready
    }
}

//! Frame callback scheduling: the engine's `requestAnimationFrame`.
//!
//! Each component owns at most one pending handle. Requesting again before
//! the frame runs returns the same handle, which is what coalesces many raw
//! events into a single cycle per frame.

use crate::engine::ComponentId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next: u64,
    pending: Vec<(FrameHandle, ComponentId)>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `owner` for the next frame.
    pub fn request(&mut self, owner: ComponentId) -> FrameHandle {
        if let Some((handle, _)) = self.pending.iter().find(|(_, o)| *o == owner) {
            return *handle;
        }
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending.push((handle, owner));
        handle
    }

    /// Returns `false` when the handle already ran or was cancelled.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(h, _)| *h != handle);
        self.pending.len() != before
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.iter().any(|(h, _)| *h == handle)
    }

    /// Takes every callback due this frame, in request order. Requests made
    /// while the batch runs land in the next frame.
    pub fn drain(&mut self) -> Vec<(FrameHandle, ComponentId)> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

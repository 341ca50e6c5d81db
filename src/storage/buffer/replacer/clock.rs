use crate::common::types::FrameId;
use crate::storage::buffer::frame::FrameTable;

/// Clock (second chance) page replacement policy.
///
/// The hand is owned by the replacer and survives between calls, so
/// successive searches sweep the pool round-robin.
pub struct ClockReplacer {
    hand: usize,
    num_frames: usize,
}

impl ClockReplacer {
    /// The hand starts on the last frame so the first advance lands on frame 0
    pub fn new(num_frames: usize) -> Self {
        Self {
            hand: num_frames.saturating_sub(1),
            num_frames,
        }
    }

    pub fn hand(&self) -> FrameId {
        self.hand as FrameId
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.num_frames;
    }

    /// Find a frame to reuse: a free one, or an unpinned one whose reference
    /// bit has already been cleared. Clears reference bits as it passes.
    ///
    /// Returns `None` once every frame has been seen pinned, which takes at
    /// most two sweeps of the pool.
    pub fn victim(&mut self, frames: &mut FrameTable) -> Option<FrameId> {
        let mut seen_pinned = vec![false; self.num_frames];
        let mut pinned = 0;

        while pinned < self.num_frames {
            self.advance();
            let frame = frames.get_mut(self.hand as FrameId);

            if !frame.valid {
                return Some(frame.frame_id);
            }
            if frame.ref_bit {
                frame.ref_bit = false;
                continue;
            }
            if frame.is_pinned() {
                if !seen_pinned[self.hand] {
                    seen_pinned[self.hand] = true;
                    pinned += 1;
                }
                continue;
            }
            return Some(frame.frame_id);
        }

        None
    }
}

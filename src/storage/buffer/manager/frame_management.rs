use log::debug;

use crate::common::types::FrameId;
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::frame::FrameDescriptor;
use crate::storage::disk::PageFile;
use super::{BufferPoolManager, PoolState};

pub(super) fn bad_buffer(frame: &FrameDescriptor, reason: impl Into<String>) -> BufferPoolError {
    BufferPoolError::BadBuffer {
        frame_id: frame.frame_id,
        valid: frame.valid,
        dirty: frame.dirty,
        ref_bit: frame.ref_bit,
        reason: reason.into(),
    }
}

impl BufferPoolManager {
    /// Get a free frame from the clock, evicting its current page if needed.
    ///
    /// A dirty victim is written back before it loses its index entry; if the
    /// write fails the victim stays cached and the error is returned.
    pub(super) fn allocate_frame(&self, state: &mut PoolState) -> Result<FrameId, BufferPoolError> {
        let frame_id = state
            .replacer
            .victim(&mut state.frames)
            .ok_or(BufferPoolError::BufferExceeded(self.pool_size))?;

        let frame = state.frames.get(frame_id);
        if frame.valid {
            if let (Some(file), Some(key)) = (frame.file.clone(), frame.key()) {
                if frame.dirty {
                    self.write_back(frame_id, &file)?;
                }
                state.index.remove(&key);
                debug!("Evicted page {} of file {} from frame {}", key.page_id, key.file_id, frame_id);
            }
        }

        self.release_frame(state, frame_id);
        Ok(frame_id)
    }

    /// Return a frame to the free state and invalidate outstanding handles.
    /// The caller is responsible for the index entry.
    pub(super) fn release_frame(&self, state: &mut PoolState, frame_id: FrameId) {
        state.frames.get_mut(frame_id).clear();
        let data = &self.data[frame_id as usize];
        data.set_pins(0);
        data.bump_generation();
    }

    /// Write a frame's bytes to its page on disk
    pub(super) fn write_back(&self, frame_id: FrameId, file: &PageFile) -> Result<(), BufferPoolError> {
        let page = self.data[frame_id as usize].read();
        file.write_page(&page)?;
        debug!("Wrote back page {} of file {} from frame {}", page.page_id, file.id(), frame_id);
        Ok(())
    }
}

use std::sync::Arc;

use crate::common::types::{FileId, FrameId, PageId, PageKey, INVALID_PAGE_ID};
use crate::storage::buffer::snapshot::FrameInfo;
use crate::storage::disk::PageFile;

/// Bookkeeping for one buffer slot.
///
/// The page bytes live in the pool's data arena at the same index; this
/// struct only tracks what is resident there and how it is being used.
pub struct FrameDescriptor {
    pub frame_id: FrameId,
    pub valid: bool,
    pub ref_bit: bool,
    pub dirty: bool,
    pub pin_count: u32,
    /// Reserved for a page whose bytes are still being read from disk
    pub loading: bool,
    pub file: Option<Arc<PageFile>>,
    pub page_id: PageId,
}

impl FrameDescriptor {
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            valid: false,
            ref_bit: false,
            dirty: false,
            pin_count: 0,
            loading: false,
            file: None,
            page_id: INVALID_PAGE_ID,
        }
    }

    /// Claim the frame for `page_id` of `file`, pinned once by the caller
    pub fn set(&mut self, file: &Arc<PageFile>, page_id: PageId) {
        self.valid = true;
        self.ref_bit = true;
        self.dirty = false;
        self.pin_count = 1;
        self.loading = false;
        self.file = Some(Arc::clone(file));
        self.page_id = page_id;
    }

    /// Return the frame to the free state
    pub fn clear(&mut self) {
        self.valid = false;
        self.ref_bit = false;
        self.dirty = false;
        self.pin_count = 0;
        self.loading = false;
        self.file = None;
        self.page_id = INVALID_PAGE_ID;
    }

    pub fn file_id(&self) -> Option<FileId> {
        self.file.as_ref().map(|f| f.id())
    }

    /// Index key of the resident page, if any
    pub fn key(&self) -> Option<PageKey> {
        self.file_id().map(|file_id| PageKey::new(file_id, self.page_id))
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            frame_id: self.frame_id,
            file_id: self.file_id(),
            page_id: self.page_id,
            valid: self.valid,
            ref_bit: self.ref_bit,
            dirty: self.dirty,
            pin_count: self.pin_count,
        }
    }
}

/// Frame descriptors for the whole pool, indexed by frame id
pub struct FrameTable {
    frames: Vec<FrameDescriptor>,
}

impl FrameTable {
    pub fn new(pool_size: usize) -> Self {
        let frames = (0..pool_size)
            .map(|i| FrameDescriptor::new(i as FrameId))
            .collect();
        Self { frames }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn get(&self, frame_id: FrameId) -> &FrameDescriptor {
        &self.frames[frame_id as usize]
    }

    pub fn get_mut(&mut self, frame_id: FrameId) -> &mut FrameDescriptor {
        &mut self.frames[frame_id as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameDescriptor> {
        self.frames.iter()
    }

    pub fn valid_count(&self) -> usize {
        self.frames.iter().filter(|f| f.valid).count()
    }
}

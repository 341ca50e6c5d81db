use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::types::{FileId, FrameId, Page, PageId, PageKey, INVALID_PAGE_ID};

/// Backing storage for one frame: the page bytes, a generation counter
/// that moves every time the frame changes hands, and a copy of the
/// descriptor's pin count kept in step under the pool lock.
pub struct FrameData {
    page: RwLock<Page>,
    generation: AtomicU64,
    pins: AtomicU32,
}

/// Smart pointer to a frame's data
pub type FramePtr = Arc<FrameData>;

impl FrameData {
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new(INVALID_PAGE_ID)),
            generation: AtomicU64::new(0),
            pins: AtomicU32::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn pins(&self) -> u32 {
        self.pins.load(Ordering::Acquire)
    }

    pub(crate) fn set_pins(&self, pins: u32) {
        self.pins.store(pins, Ordering::Release);
    }

    /// Invalidate every handle issued for the current occupant
    pub(crate) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }
}

impl Default for FrameData {
    fn default() -> Self {
        Self::new()
    }
}

/// A pinned page in the buffer pool.
///
/// The handle is only good while the caller's pin is outstanding. Access
/// once the page has no pins left, or once the frame is evicted, flushed
/// out, or disposed, trips a debug assertion.
pub struct PageHandle {
    key: PageKey,
    frame_id: FrameId,
    generation: u64,
    frame: FramePtr,
}

impl PageHandle {
    pub(crate) fn new(key: PageKey, frame_id: FrameId, frame: FramePtr) -> Self {
        let generation = frame.generation();
        Self {
            key,
            frame_id,
            generation,
            frame,
        }
    }

    pub fn key(&self) -> PageKey {
        self.key
    }

    pub fn file_id(&self) -> FileId {
        self.key.file_id
    }

    pub fn page_id(&self) -> PageId {
        self.key.page_id
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// True once the frame has been handed to another page or cleared
    pub fn is_stale(&self) -> bool {
        self.frame.generation() != self.generation
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        debug_assert!(!self.is_stale(), "stale handle for page {:?}", self.key);
        debug_assert!(self.frame.pins() > 0, "access to unpinned page {:?}", self.key);
        self.frame.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        debug_assert!(!self.is_stale(), "stale handle for page {:?}", self.key);
        debug_assert!(self.frame.pins() > 0, "access to unpinned page {:?}", self.key);
        self.frame.write()
    }
}

impl std::fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageHandle")
            .field("key", &self.key)
            .field("frame_id", &self.frame_id)
            .field("generation", &self.generation)
            .finish()
    }
}

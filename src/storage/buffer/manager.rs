mod basic_operations;
mod frame_management;

use std::sync::Arc;

use log::{debug, error, warn};
use parking_lot::{Condvar, Mutex};

use crate::common::config::BufferPoolConfig;
use crate::common::types::{FrameId, PageId, PageKey};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::frame::FrameTable;
use crate::storage::buffer::handle::{FrameData, FramePtr, PageHandle};
use crate::storage::buffer::page_index::PageIndex;
use crate::storage::buffer::replacer::ClockReplacer;
use crate::storage::buffer::snapshot::PoolSnapshot;
use crate::storage::disk::PageFile;

/// Everything that must change together: frame bookkeeping, the page
/// index and the clock hand. Only touched with the pool mutex held.
struct PoolState {
    frames: FrameTable,
    index: PageIndex,
    replacer: ClockReplacer,
}

/// Buffer pool manager.
///
/// Caches up to `pool_size` pages from any number of [`PageFile`]s and
/// hands them out as pinned [`PageHandle`]s. Victims are chosen with the
/// clock algorithm; dirty victims are written back before their frame is
/// reused.
pub struct BufferPoolManager {
    pool_size: usize,
    state: Mutex<PoolState>,
    /// Signalled whenever a page finishes (or fails) loading
    loaded: Condvar,
    data: Vec<FramePtr>,
}

impl BufferPoolManager {
    pub fn new(config: BufferPoolConfig) -> Result<Self, BufferPoolError> {
        let pool_size = config.pool_size;
        if pool_size == 0 || pool_size > FrameId::MAX as usize {
            return Err(BufferPoolError::InvalidConfig(format!(
                "pool size must be between 1 and {}, got {}",
                FrameId::MAX,
                pool_size
            )));
        }

        let data = (0..pool_size).map(|_| Arc::new(FrameData::new())).collect();
        debug!("Created buffer pool with {} frames", pool_size);

        Ok(Self {
            pool_size,
            state: Mutex::new(PoolState {
                frames: FrameTable::new(pool_size),
                index: PageIndex::new(pool_size),
                replacer: ClockReplacer::new(pool_size),
            }),
            loaded: Condvar::new(),
            data,
        })
    }

    pub fn with_pool_size(pool_size: usize) -> Result<Self, BufferPoolError> {
        Self::new(BufferPoolConfig::with_pool_size(pool_size))
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn handle(&self, key: PageKey, frame_id: FrameId) -> PageHandle {
        PageHandle::new(key, frame_id, Arc::clone(&self.data[frame_id as usize]))
    }

    /// Pin count of a cached page, `None` if it is not in the pool
    pub fn pin_count(&self, file: &PageFile, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        state
            .index
            .lookup(&PageKey::new(file.id(), page_id))
            .map(|frame_id| state.frames.get(frame_id).pin_count)
    }

    pub fn is_cached(&self, file: &PageFile, page_id: PageId) -> bool {
        self.state
            .lock()
            .index
            .lookup(&PageKey::new(file.id(), page_id))
            .is_some()
    }

    /// Dump of frame table occupancy
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.lock();
        PoolSnapshot {
            frames: state.frames.iter().map(|f| f.info()).collect(),
            valid_frames: state.frames.valid_count(),
        }
    }

    /// Verify that the frame table and the page index agree.
    ///
    /// A frame is valid exactly when the index maps its page to it.
    pub fn check_invariants(&self) -> Result<(), BufferPoolError> {
        let state = self.state.lock();

        for frame in state.frames.iter() {
            match frame.key() {
                Some(key) if frame.valid => {
                    if state.index.lookup(&key) != Some(frame.frame_id) {
                        return Err(frame_management::bad_buffer(
                            frame,
                            format!("page {:?} is not indexed to this frame", key),
                        ));
                    }
                }
                Some(_) => {
                    return Err(frame_management::bad_buffer(
                        frame,
                        "frame is owned by a file but not valid",
                    ));
                }
                None if frame.valid => {
                    return Err(frame_management::bad_buffer(frame, "valid frame has no owning file"));
                }
                None => {
                    if frame.dirty || frame.is_pinned() {
                        return Err(frame_management::bad_buffer(frame, "free frame is dirty or pinned"));
                    }
                }
            }
        }

        for (key, &frame_id) in state.index.iter() {
            let frame = state.frames.get(frame_id);
            if !frame.valid || frame.key() != Some(*key) {
                return Err(frame_management::bad_buffer(
                    frame,
                    format!("index maps {:?} to a frame holding something else", key),
                ));
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.pool_size)
            .finish_non_exhaustive()
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for frame in state.frames.iter().filter(|f| f.valid && f.dirty) {
            let Some(file) = &frame.file else {
                continue;
            };
            if frame.is_pinned() {
                warn!(
                    "Page {} of file {} is still pinned ({}) at shutdown",
                    frame.page_id,
                    file.id(),
                    frame.pin_count
                );
            }

            let page = self.data[frame.frame_id as usize].read();
            match file.write_page(&page) {
                Ok(()) => debug!("Flushed page {} of file {} at shutdown", frame.page_id, file.id()),
                Err(e) => error!(
                    "Lost dirty page {} of file {} at shutdown: {}",
                    frame.page_id,
                    file.id(),
                    e
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::*;

    fn setup(pool_size: usize) -> (Arc<BufferPoolManager>, Arc<PageFile>, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let file = Arc::new(PageFile::create(temp.path()).unwrap());
        let pool = Arc::new(BufferPoolManager::with_pool_size(pool_size).unwrap());
        (pool, file, temp)
    }

    #[test]
    fn test_invalid_owned_frame_is_bad_buffer() {
        let (pool, file, _temp) = setup(2);
        let (page_id, _page) = pool.allocate_page(&file).unwrap();
        pool.unpin_page(&file, page_id, false).unwrap();
        pool.check_invariants().unwrap();

        pool.state.lock().frames.get_mut(0).valid = false;

        assert!(matches!(
            pool.check_invariants(),
            Err(BufferPoolError::BadBuffer { frame_id: 0, valid: false, .. })
        ));
        assert!(matches!(
            pool.flush_file(&file),
            Err(BufferPoolError::BadBuffer { frame_id: 0, valid: false, .. })
        ));
    }

    #[test]
    fn test_unpin_waits_for_load() {
        let (pool, file, _temp) = setup(2);
        let (page_id, _page) = pool.allocate_page(&file).unwrap();
        let _again = pool.fetch_page(&file, page_id).unwrap();
        pool.state.lock().frames.get_mut(0).loading = true;

        let unpinner = {
            let pool = Arc::clone(&pool);
            let file = Arc::clone(&file);
            thread::spawn(move || pool.unpin_page(&file, page_id, false))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.pin_count(&file, page_id), Some(2));

        pool.state.lock().frames.get_mut(0).loading = false;
        pool.loaded.notify_all();
        unpinner.join().unwrap().unwrap();

        assert_eq!(pool.pin_count(&file, page_id), Some(1));
        assert_eq!(pool.data[0].pins(), 1);
    }
}

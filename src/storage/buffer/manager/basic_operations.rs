use std::sync::Arc;

use log::{debug, trace, warn};

use crate::common::types::{FrameId, PageId, PageKey};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::handle::PageHandle;
use crate::storage::disk::PageFile;
use super::frame_management::bad_buffer;
use super::BufferPoolManager;

impl BufferPoolManager {
    /// Fetch a page, reading it from disk on a miss. The page comes back pinned.
    ///
    /// The frame is reserved under the pool lock, the read itself happens
    /// without it. Other callers asking for the same page meanwhile wait for
    /// the load to finish.
    pub fn fetch_page(&self, file: &Arc<PageFile>, page_id: PageId) -> Result<PageHandle, BufferPoolError> {
        let key = PageKey::new(file.id(), page_id);
        let mut state = self.state.lock();

        while let Some(frame_id) = state.index.lookup(&key) {
            let frame = state.frames.get_mut(frame_id);
            if frame.loading {
                self.loaded.wait(&mut state);
                continue;
            }

            frame.ref_bit = true;
            frame.pin_count += 1;
            self.data[frame_id as usize].set_pins(frame.pin_count);
            trace!("Hit page {} of file {} in frame {}", page_id, key.file_id, frame_id);
            return Ok(self.handle(key, frame_id));
        }

        let frame_id = self.allocate_frame(&mut state)?;
        state.index.insert(key, frame_id)?;
        let frame = state.frames.get_mut(frame_id);
        frame.set(file, page_id);
        frame.loading = true;
        self.data[frame_id as usize].set_pins(1);
        drop(state);

        // Nobody else touches the bytes of a frame that is still loading
        let loaded = file
            .read_page(page_id)
            .map(|page| *self.data[frame_id as usize].write() = page);

        let mut state = self.state.lock();
        let result = match loaded {
            Ok(()) => {
                state.frames.get_mut(frame_id).loading = false;
                debug!("Loaded page {} of file {} into frame {}", page_id, key.file_id, frame_id);
                Ok(self.handle(key, frame_id))
            }
            Err(e) => {
                debug!("Failed to load page {} of file {}: {}", page_id, key.file_id, e);
                state.index.remove(&key);
                self.release_frame(&mut state, frame_id);
                Err(e.into())
            }
        };
        drop(state);

        self.loaded.notify_all();
        result
    }

    /// Drop one pin on a page. Unpinning a page that is not cached does nothing.
    ///
    /// `is_dirty` only ever sets the dirty bit; it is cleared by write-back.
    /// A page that is still loading keeps its loader's pin until the load is done.
    pub fn unpin_page(&self, file: &PageFile, page_id: PageId, is_dirty: bool) -> Result<(), BufferPoolError> {
        let key = PageKey::new(file.id(), page_id);
        let mut state = self.state.lock();

        let frame_id = loop {
            let Some(frame_id) = state.index.lookup(&key) else {
                trace!("Unpin of uncached page {} of file {}", page_id, key.file_id);
                return Ok(());
            };
            if !state.frames.get(frame_id).loading {
                break frame_id;
            }
            self.loaded.wait(&mut state);
        };

        let frame = state.frames.get_mut(frame_id);
        if frame.pin_count == 0 {
            warn!("Unpin of page {} of file {} which is not pinned", page_id, key.file_id);
            return Err(BufferPoolError::PageNotPinned { key, frame_id });
        }

        frame.pin_count -= 1;
        if is_dirty {
            frame.dirty = true;
        }
        self.data[frame_id as usize].set_pins(frame.pin_count);
        Ok(())
    }

    /// Allocate a new page in `file` and cache it, pinned.
    ///
    /// If no frame can be found the page is deleted from the file again.
    pub fn allocate_page(&self, file: &Arc<PageFile>) -> Result<(PageId, PageHandle), BufferPoolError> {
        let page = file.allocate_page()?;
        let page_id = page.page_number();
        let key = PageKey::new(file.id(), page_id);

        let mut state = self.state.lock();
        let frame_id = match self.allocate_frame(&mut state) {
            Ok(frame_id) => frame_id,
            Err(e) => {
                drop(state);
                if let Err(cleanup) = file.delete_page(page_id) {
                    warn!("Could not remove page {} of file {} after failed allocation: {}", page_id, key.file_id, cleanup);
                }
                return Err(e);
            }
        };

        *self.data[frame_id as usize].write() = page;
        state.index.insert(key, frame_id)?;
        state.frames.get_mut(frame_id).set(file, page_id);
        self.data[frame_id as usize].set_pins(1);

        debug!("Allocated page {} of file {} in frame {}", page_id, key.file_id, frame_id);
        Ok((page_id, self.handle(key, frame_id)))
    }

    /// Delete a page from `file`, dropping any cached copy first.
    ///
    /// There is no pin check: disposing is the caller's statement that nobody
    /// needs the page any more. Outstanding handles become stale.
    pub fn dispose_page(&self, file: &PageFile, page_id: PageId) -> Result<(), BufferPoolError> {
        let key = PageKey::new(file.id(), page_id);
        {
            let mut state = self.state.lock();
            while let Some(frame_id) = state.index.lookup(&key) {
                let frame = state.frames.get(frame_id);
                if frame.loading {
                    self.loaded.wait(&mut state);
                    continue;
                }
                if frame.is_pinned() {
                    debug!("Disposing page {} of file {} with {} pins", page_id, key.file_id, frame.pin_count);
                }

                state.index.remove(&key);
                self.release_frame(&mut state, frame_id);
                break;
            }
        }

        file.delete_page(page_id)?;
        Ok(())
    }

    /// Write back and drop every cached page of `file`.
    ///
    /// Nothing is flushed if any page of the file is pinned: the call fails
    /// with `PagePinned` and leaves the pool as it was.
    pub fn flush_file(&self, file: &PageFile) -> Result<(), BufferPoolError> {
        let file_id = file.id();
        let mut state = self.state.lock();

        let mut owned: Vec<FrameId> = Vec::new();
        for frame in state.frames.iter().filter(|f| f.file_id() == Some(file_id)) {
            if !frame.valid {
                return Err(bad_buffer(frame, "frame is owned by a file but not valid"));
            }
            if frame.is_pinned() {
                warn!("Flush of file {} stopped at pinned page {}", file_id, frame.page_id);
                return Err(BufferPoolError::PagePinned {
                    key: PageKey::new(file_id, frame.page_id),
                    frame_id: frame.frame_id,
                });
            }
            owned.push(frame.frame_id);
        }

        for frame_id in owned {
            let frame = state.frames.get(frame_id);
            let key = PageKey::new(file_id, frame.page_id);
            if frame.dirty {
                self.write_back(frame_id, file)?;
                state.frames.get_mut(frame_id).dirty = false;
            }
            state.index.remove(&key);
            self.release_frame(&mut state, frame_id);
        }

        debug!("Flushed file {}", file_id);
        Ok(())
    }

    /// Write back every dirty, unpinned page without evicting anything.
    /// Returns the number of pages written.
    pub fn flush_all(&self) -> Result<usize, BufferPoolError> {
        let mut state = self.state.lock();
        let mut written = 0;

        for frame_id in 0..self.pool_size as FrameId {
            let frame = state.frames.get(frame_id);
            if !frame.valid || !frame.dirty || frame.is_pinned() {
                continue;
            }
            if let Some(file) = frame.file.clone() {
                self.write_back(frame_id, &file)?;
                state.frames.get_mut(frame_id).dirty = false;
                written += 1;
            }
        }

        Ok(written)
    }
}

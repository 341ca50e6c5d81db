use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::common::types::{FrameId, PageKey};
use crate::storage::buffer::error::BufferPoolError;

/// Maps (file, page number) to the frame holding that page.
pub struct PageIndex {
    map: HashMap<PageKey, FrameId>,
}

impl PageIndex {
    /// Sized for the pool with some headroom so it never rehashes while full
    pub fn new(pool_size: usize) -> Self {
        let capacity = pool_size + pool_size / 5 + 1;
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// A miss is `None`; callers use it to tell hits from misses.
    pub fn lookup(&self, key: &PageKey) -> Option<FrameId> {
        self.map.get(key).copied()
    }

    pub fn insert(&mut self, key: PageKey, frame_id: FrameId) -> Result<(), BufferPoolError> {
        match self.map.entry(key) {
            Entry::Occupied(_) => Err(BufferPoolError::DuplicateEntry(key)),
            Entry::Vacant(slot) => {
                slot.insert(frame_id);
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, key: &PageKey) -> Option<FrameId> {
        self.map.remove(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PageKey, &FrameId)> {
        self.map.iter()
    }
}

use std::fmt;

use serde::Serialize;

use crate::common::types::{FileId, FrameId, PageId};

/// Point-in-time view of one frame descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameInfo {
    pub frame_id: FrameId,
    pub file_id: Option<FileId>,
    pub page_id: PageId,
    pub valid: bool,
    pub ref_bit: bool,
    pub dirty: bool,
    pub pin_count: u32,
}

/// Frame table occupancy, for debugging and tests
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub frames: Vec<FrameInfo>,
    pub valid_frames: usize,
}

impl PoolSnapshot {
    pub fn frame(&self, frame_id: FrameId) -> &FrameInfo {
        &self.frames[frame_id as usize]
    }

    pub fn pinned_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.pin_count > 0).count()
    }

    pub fn dirty_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.dirty).count()
    }
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_id {
            Some(file_id) => write!(f, "file={} page={}", file_id, self.page_id)?,
            None => write!(f, "file=- page=-")?,
        }
        write!(
            f,
            " valid={} ref={} dirty={} pins={}",
            self.valid, self.ref_bit, self.dirty, self.pin_count
        )
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            writeln!(f, "FrameNo:{} {}", frame.frame_id, frame)?;
        }
        writeln!(f, "Total Number of Valid Frames:{}", self.valid_frames)
    }
}

use thiserror::Error;
use crate::common::types::{FrameId, PageKey};
use crate::storage::disk::DiskError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("Buffer pool exceeded: all {0} frames are pinned")]
    BufferExceeded(usize),
    #[error("Page {key:?} in frame {frame_id} is not pinned")]
    PageNotPinned { key: PageKey, frame_id: FrameId },
    #[error("Page {key:?} in frame {frame_id} is pinned")]
    PagePinned { key: PageKey, frame_id: FrameId },
    #[error("Bad buffer: frame {frame_id} (valid={valid}, dirty={dirty}, ref={ref_bit}): {reason}")]
    BadBuffer {
        frame_id: FrameId,
        valid: bool,
        dirty: bool,
        ref_bit: bool,
        reason: String,
    },
    #[error("Page {0:?} is already in the page index")]
    DuplicateEntry(PageKey),
    #[error("Invalid buffer pool configuration: {0}")]
    InvalidConfig(String),
    #[error("Disk error: {0}")]
    Disk(#[from] DiskError),
}

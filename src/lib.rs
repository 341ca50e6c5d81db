// Clockpool: a clock-replacement buffer pool for page files

pub mod common;
pub mod storage;

// Re-export key items for convenient access
pub use common::config::BufferPoolConfig;
pub use common::types::{FileId, FrameId, Page, PageId, PageKey, PAGE_SIZE};
pub use storage::buffer::{BufferPoolError, BufferPoolManager, PageHandle, PoolSnapshot};
pub use storage::disk::{DiskError, PageFile};

pub mod error;
pub mod frame;
pub mod handle;
pub mod manager;
pub mod page_index;
pub mod replacer;
pub mod snapshot;

pub use error::BufferPoolError;
pub use handle::PageHandle;
pub use manager::BufferPoolManager;
pub use snapshot::{FrameInfo, PoolSnapshot};

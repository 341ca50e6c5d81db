use serde::Deserialize;

/// Configuration for a buffer pool
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool
    pub pool_size: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 64,
        }
    }
}

impl BufferPoolConfig {
    pub fn with_pool_size(pool_size: usize) -> Self {
        Self { pool_size }
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::NamedTempFile;
use clockpool::{BufferPoolManager, PageFile, PageId};
use anyhow::Result;

// Create a page file backed by a temporary file
pub fn create_test_file() -> Result<(Arc<PageFile>, NamedTempFile)> {
    let temp = NamedTempFile::new()?;
    let file = Arc::new(PageFile::create(temp.path())?);
    Ok((file, temp))
}

// Create a page file that already holds `count` zeroed pages
pub fn create_file_with_pages(count: usize) -> Result<(Arc<PageFile>, NamedTempFile, Vec<PageId>)> {
    let (file, temp) = create_test_file()?;
    let mut page_ids = Vec::with_capacity(count);
    for _ in 0..count {
        page_ids.push(file.allocate_page()?.page_number());
    }
    Ok((file, temp, page_ids))
}

// Create a buffer pool manager with the given number of frames
pub fn create_test_buffer_pool(pool_size: usize) -> Result<Arc<BufferPoolManager>> {
    Ok(Arc::new(BufferPoolManager::with_pool_size(pool_size)?))
}

// Generate test data of specified size
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

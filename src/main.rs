use std::sync::Arc;
use anyhow::Result;

use clockpool::{BufferPoolManager, PageFile};

fn main() -> Result<()> {
    // Create a page file
    let file = Arc::new(PageFile::create("clockpool.db")?);

    // Create buffer pool manager with 3 frames
    let buffer_pool = BufferPoolManager::with_pool_size(3)?;

    // Allocate a few pages and write something into each
    let mut page_ids = Vec::new();
    for i in 0..5u8 {
        let (page_id, handle) = buffer_pool.allocate_page(&file)?;
        handle.write().data[0..5].copy_from_slice(&[b'p', b'a', b'g', b'e', b'0' + i]);
        buffer_pool.unpin_page(&file, page_id, true)?;
        page_ids.push(page_id);
    }

    // The first pages were evicted by now, fetching brings them back from disk
    let handle = buffer_pool.fetch_page(&file, page_ids[0])?;
    println!(
        "Page {} holds {:?}",
        page_ids[0],
        String::from_utf8_lossy(&handle.read().data[0..5])
    );
    buffer_pool.unpin_page(&file, page_ids[0], false)?;

    print!("{}", buffer_pool.snapshot());

    buffer_pool.flush_file(&file)?;
    Ok(())
}

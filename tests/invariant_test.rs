use std::collections::HashMap;

use anyhow::Result;
use rand::prelude::*;
use rand::rngs::StdRng;

use clockpool::{BufferPoolError, PageId};

mod common;
use common::{create_file_with_pages, create_test_buffer_pool};

const POOL_SIZE: usize = 4;
const STEPS: usize = 2000;

fn stamp(page_id: PageId) -> [u8; 4] {
    page_id.to_le_bytes()
}

#[test]
fn test_random_operations_keep_pool_consistent() -> Result<()> {
    let buffer_pool = create_test_buffer_pool(POOL_SIZE)?;
    let (file, _temp, initial) = create_file_with_pages(12)?;
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut live: Vec<PageId> = initial;
    // pins this test holds, per page
    let mut pins: HashMap<PageId, u32> = HashMap::new();
    // pages whose stamp has been written through the pool
    let mut stamped: Vec<PageId> = Vec::new();

    for step in 0..STEPS {
        match rng.gen_range(0..10) {
            0..=4 => {
                let page_id = *live.choose(&mut rng).unwrap();
                match buffer_pool.fetch_page(&file, page_id) {
                    Ok(page) => {
                        let data = page.read().data;
                        if stamped.contains(&page_id) {
                            assert_eq!(data[0..4], stamp(page_id), "step {}", step);
                        } else {
                            assert!(data[0..4].iter().all(|&b| b == 0), "step {}", step);
                        }
                        *pins.entry(page_id).or_default() += 1;
                    }
                    Err(BufferPoolError::BufferExceeded(_)) => {
                        // only possible when every frame is pinned
                        assert_eq!(buffer_pool.snapshot().pinned_frames(), POOL_SIZE, "step {}", step);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            5..=7 => {
                let page_id = *live.choose(&mut rng).unwrap();
                let held = pins.get(&page_id).copied().unwrap_or(0);
                let dirty = rng.gen_bool(0.5);

                if held > 0 {
                    if dirty {
                        let page = buffer_pool.fetch_page(&file, page_id)?;
                        page.write().data[0..4].copy_from_slice(&stamp(page_id));
                        buffer_pool.unpin_page(&file, page_id, false)?;
                        if !stamped.contains(&page_id) {
                            stamped.push(page_id);
                        }
                    }
                    buffer_pool.unpin_page(&file, page_id, dirty)?;
                    pins.insert(page_id, held - 1);
                } else if buffer_pool.is_cached(&file, page_id) {
                    let before = buffer_pool.snapshot();
                    let err = buffer_pool.unpin_page(&file, page_id, dirty).unwrap_err();
                    assert!(matches!(err, BufferPoolError::PageNotPinned { .. }));
                    assert_eq!(before.frames, buffer_pool.snapshot().frames);
                } else {
                    buffer_pool.unpin_page(&file, page_id, dirty)?;
                }
            }
            8 => {
                match buffer_pool.allocate_page(&file) {
                    Ok((page_id, _page)) => {
                        live.push(page_id);
                        pins.insert(page_id, 1);
                    }
                    Err(BufferPoolError::BufferExceeded(_)) => {
                        assert_eq!(buffer_pool.snapshot().pinned_frames(), POOL_SIZE, "step {}", step);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            _ => {
                if live.len() > 4 {
                    let idx = rng.gen_range(0..live.len());
                    let page_id = live.swap_remove(idx);
                    buffer_pool.dispose_page(&file, page_id)?;
                    pins.remove(&page_id);
                    stamped.retain(|&p| p != page_id);
                    assert!(!buffer_pool.is_cached(&file, page_id));
                }
            }
        }

        buffer_pool.check_invariants()?;
        for (&page_id, &held) in &pins {
            if held > 0 {
                assert_eq!(buffer_pool.pin_count(&file, page_id), Some(held), "step {}", step);
            }
        }
        let snapshot = buffer_pool.snapshot();
        assert!(snapshot.frames.iter().all(|f| f.valid || !f.dirty));
    }

    // Release everything and make sure the stamps reach the disk
    for (&page_id, &held) in &pins {
        for _ in 0..held {
            buffer_pool.unpin_page(&file, page_id, false)?;
        }
    }
    buffer_pool.flush_file(&file)?;
    for &page_id in &stamped {
        assert_eq!(file.read_page(page_id)?.data[0..4], stamp(page_id));
    }

    Ok(())
}

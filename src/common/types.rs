use serde::Serialize;

/// Page size in bytes (8KB)
pub const PAGE_SIZE: usize = 8192;

/// Page ID type. Page numbers start at 1.
pub type PageId = u32;

/// Buffer pool frame ID type
pub type FrameId = u32;

/// Identity of an open page file
pub type FileId = u32;

pub const INVALID_PAGE_ID: PageId = 0;

/// Page structure
#[derive(Debug, Clone)]
pub struct Page {
    pub data: [u8; PAGE_SIZE],
    pub page_id: PageId,
}

impl Page {
    pub fn new(page_id: PageId) -> Self {
        Self {
            data: [0; PAGE_SIZE],
            page_id,
        }
    }

    pub fn page_number(&self) -> PageId {
        self.page_id
    }
}

/// Key of the page location index: which file, which page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageKey {
    pub file_id: FileId,
    pub page_id: PageId,
}

impl PageKey {
    pub fn new(file_id: FileId, page_id: PageId) -> Self {
        Self { file_id, page_id }
    }
}

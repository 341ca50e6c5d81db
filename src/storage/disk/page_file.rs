use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{FileId, Page, PageId, INVALID_PAGE_ID, PAGE_SIZE};

/// Page number (u32) followed by slot flags (u32)
const SLOT_HEADER_SIZE: usize = 8;
const SLOT_SIZE: usize = SLOT_HEADER_SIZE + PAGE_SIZE;

const FLAG_ALLOCATED: u32 = 1;
const FLAG_DELETED: u32 = 1 << 1;

static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),
    #[error("Page {page_id} does not exist in file {file_id}")]
    PageNotFound { file_id: FileId, page_id: PageId },
    #[error("Corrupt page file: {0}")]
    Corrupt(String),
}

/// A file of fixed-size pages.
///
/// Page `n` occupies slot `n - 1`. Every slot starts with a small header
/// recording the page number and whether the page has been deleted, so page
/// numbers are never handed out twice and deleted pages stay unreadable.
pub struct PageFile {
    id: FileId,
    path: PathBuf,
    file: Mutex<File>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl PageFile {
    /// Create a new, empty page file, truncating anything already at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DiskError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;

        Ok(Self::from_file(file, path.as_ref()))
    }

    /// Open an existing page file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DiskError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;

        let len = file.metadata()?.len();
        if len % SLOT_SIZE as u64 != 0 {
            return Err(DiskError::Corrupt(format!(
                "{} has length {} which is not a multiple of the slot size",
                path.as_ref().display(),
                len
            )));
        }

        Ok(Self::from_file(file, path.as_ref()))
    }

    fn from_file(file: File, path: &Path) -> Self {
        let id = NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed);
        debug!("Opened page file {} as file {}", path.display(), id);

        Self {
            id,
            path: path.to_path_buf(),
            file: Mutex::new(file),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of page slots in the file, deleted ones included
    pub fn page_count(&self) -> Result<u32, DiskError> {
        let len = self.file.lock().metadata()?.len();
        Ok((len / SLOT_SIZE as u64) as u32)
    }

    /// Read a page from disk
    pub fn read_page(&self, page_id: PageId) -> Result<Page, DiskError> {
        let mut file = self.file.lock();
        self.live_slot(&mut file, page_id)?;

        let mut page = Page::new(page_id);
        file.read_exact(&mut page.data)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        Ok(page)
    }

    /// Write a page's bytes back to its slot
    pub fn write_page(&self, page: &Page) -> Result<(), DiskError> {
        let mut file = self.file.lock();
        self.live_slot(&mut file, page.page_id)?;

        file.write_all(&page.data)?;
        file.flush()?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    /// Append a new zeroed page to the file
    pub fn allocate_page(&self) -> Result<Page, DiskError> {
        let mut file = self.file.lock();

        let len = file.metadata()?.len();
        let page_id = (len / SLOT_SIZE as u64) as PageId + 1;

        let mut slot = Vec::with_capacity(SLOT_SIZE);
        slot.write_u32::<LittleEndian>(page_id)?;
        slot.write_u32::<LittleEndian>(FLAG_ALLOCATED)?;
        slot.resize(SLOT_SIZE, 0);

        file.seek(SeekFrom::Start(Self::slot_offset(page_id)))?;
        file.write_all(&slot)?;
        file.flush()?;

        debug!("Allocated page {} in file {}", page_id, self.id);
        Ok(Page::new(page_id))
    }

    /// Mark a page deleted. Its number is not reused.
    pub fn delete_page(&self, page_id: PageId) -> Result<(), DiskError> {
        let mut file = self.file.lock();
        self.live_slot(&mut file, page_id)?;

        file.seek(SeekFrom::Start(Self::slot_offset(page_id) + 4))?;
        file.write_u32::<LittleEndian>(FLAG_ALLOCATED | FLAG_DELETED)?;
        file.flush()?;

        debug!("Deleted page {} in file {}", page_id, self.id);
        Ok(())
    }

    /// Pages read from disk since the file was opened
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Pages written to disk since the file was opened
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Check that `page_id` is allocated and not deleted, leaving the cursor at
    /// the start of its payload.
    fn live_slot(&self, file: &mut File, page_id: PageId) -> Result<(), DiskError> {
        if page_id == INVALID_PAGE_ID {
            return Err(DiskError::InvalidPageId(page_id));
        }

        let not_found = DiskError::PageNotFound {
            file_id: self.id,
            page_id,
        };

        let offset = Self::slot_offset(page_id);
        if offset + SLOT_SIZE as u64 > file.metadata()?.len() {
            return Err(not_found);
        }

        file.seek(SeekFrom::Start(offset))?;
        let stored_id = file.read_u32::<LittleEndian>()?;
        let flags = file.read_u32::<LittleEndian>()?;

        if stored_id != page_id {
            return Err(DiskError::Corrupt(format!(
                "slot for page {} holds page {}",
                page_id, stored_id
            )));
        }
        if flags & FLAG_ALLOCATED == 0 || flags & FLAG_DELETED != 0 {
            return Err(not_found);
        }

        Ok(())
    }

    fn slot_offset(page_id: PageId) -> u64 {
        (page_id as u64 - 1) * SLOT_SIZE as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn temp_page_file() -> (PageFile, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let file = PageFile::create(temp.path()).unwrap();
        (file, temp)
    }

    #[test]
    fn test_allocate_assigns_increasing_page_numbers() {
        let (file, _temp) = temp_page_file();

        let first = file.allocate_page().unwrap();
        let second = file.allocate_page().unwrap();

        assert_eq!(first.page_number(), 1);
        assert_eq!(second.page_number(), 2);
        assert!(first.data.iter().all(|&b| b == 0));
        assert_eq!(file.page_count().unwrap(), 2);
    }

    #[test]
    fn test_write_then_read() {
        let (file, _temp) = temp_page_file();

        let mut page = file.allocate_page().unwrap();
        page.data[10..15].copy_from_slice(b"hello");
        file.write_page(&page).unwrap();

        let read = file.read_page(page.page_id).unwrap();
        assert_eq!(&read.data[10..15], b"hello");
        assert_eq!(file.reads(), 1);
        assert_eq!(file.writes(), 1);
    }

    #[test]
    fn test_read_missing_page_fails() {
        let (file, _temp) = temp_page_file();

        assert!(matches!(file.read_page(0), Err(DiskError::InvalidPageId(0))));
        assert!(matches!(
            file.read_page(1),
            Err(DiskError::PageNotFound { page_id: 1, .. })
        ));
    }

    #[test]
    fn test_deleted_page_is_gone_and_not_reused() {
        let (file, _temp) = temp_page_file();

        let page = file.allocate_page().unwrap();
        file.delete_page(page.page_id).unwrap();

        assert!(matches!(
            file.read_page(page.page_id),
            Err(DiskError::PageNotFound { .. })
        ));
        assert!(file.write_page(&page).is_err());
        assert!(file.delete_page(page.page_id).is_err());

        let next = file.allocate_page().unwrap();
        assert_eq!(next.page_number(), 2);
    }

    #[test]
    fn test_reopen_keeps_pages() {
        let temp = NamedTempFile::new().unwrap();
        {
            let file = PageFile::create(temp.path()).unwrap();
            let mut page = file.allocate_page().unwrap();
            page.data[0] = 42;
            file.write_page(&page).unwrap();
            file.allocate_page().unwrap();
            file.delete_page(2).unwrap();
        }

        let file = PageFile::open(temp.path()).unwrap();
        assert_eq!(file.read_page(1).unwrap().data[0], 42);
        assert!(file.read_page(2).is_err());
    }

    #[test]
    fn test_files_get_distinct_ids() {
        let (a, _ta) = temp_page_file();
        let (b, _tb) = temp_page_file();
        assert_ne!(a.id(), b.id());
    }
}

//! The disk manager: page-granularity reads and writes to a single
//! backing file, addressed by page number (§6).
//!
//! `(page_number - 1) * page_size` is the byte offset of a page's first
//! byte; page number 0 is never written. No checksum is computed over
//! the trailer — the format reserves the last 8 bytes of a page but this
//! crate leaves them zero-filled (see DESIGN.md for the dropped
//! checksum dependency).

use std::fs::{File, OpenOptions};
use std::io::{Read as _, Seek, SeekFrom, Write as _};
use std::path::Path;

use parking_lot::Mutex;

use crate::error::{Result, StorageError};
use crate::storage::page::{PageNumber, INVALID_PAGE_NUMBER};

pub struct DiskManager {
    file: Mutex<File>,
    page_size: usize,
}

impl DiskManager {
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            page_size,
        })
    }

    fn offset(&self, page_number: PageNumber) -> Result<u64> {
        if page_number == INVALID_PAGE_NUMBER {
            return Err(StorageError::PageNotAllocated(page_number));
        }
        Ok((page_number as u64 - 1) * self.page_size as u64)
    }

    /// Reads exactly one page's worth of bytes. Returns
    /// [`StorageError::PageNotAllocated`] if the page lies past the
    /// current end of the file (i.e. was never written).
    pub fn read_page(&self, page_number: PageNumber) -> Result<Vec<u8>> {
        let offset = self.offset(page_number)?;
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        if offset + self.page_size as u64 > len {
            return Err(StorageError::PageNotAllocated(page_number));
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.page_size];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn write_page(&self, page_number: PageNumber, buf: &[u8]) -> Result<()> {
        if buf.len() != self.page_size {
            return Err(StorageError::BytesizeMismatch {
                expected: self.page_size,
                actual: buf.len(),
            });
        }
        let offset = self.offset(page_number)?;
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    /// Flushes and releases the underlying file handle (§4.1's `close`).
    /// The handle closes on drop regardless; this exists so callers that
    /// want to observe I/O errors from the final flush have somewhere to
    /// send them, rather than losing them to an unchecked `Drop`.
    pub fn close(&self) -> Result<()> {
        self.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn write_then_read_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let disk = DiskManager::open(tmp.path(), 4096).unwrap();
        let page = vec![7u8; 4096];
        disk.write_page(1, &page).unwrap();
        let back = disk.read_page(1).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn reading_an_unwritten_page_fails() {
        let tmp = NamedTempFile::new().unwrap();
        let disk = DiskManager::open(tmp.path(), 4096).unwrap();
        assert!(matches!(
            disk.read_page(3),
            Err(StorageError::PageNotAllocated(3))
        ));
    }

    #[test]
    fn reading_the_invalid_sentinel_fails() {
        let tmp = NamedTempFile::new().unwrap();
        let disk = DiskManager::open(tmp.path(), 4096).unwrap();
        assert!(matches!(
            disk.read_page(INVALID_PAGE_NUMBER),
            Err(StorageError::PageNotAllocated(0))
        ));
    }

    #[test]
    fn wrong_size_write_is_rejected() {
        let tmp = NamedTempFile::new().unwrap();
        let disk = DiskManager::open(tmp.path(), 4096).unwrap();
        assert!(disk.write_page(1, &[0u8; 10]).is_err());
    }
}

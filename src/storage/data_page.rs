//! The slotted data page: file header, a 56-byte page header, and a
//! densely packed run of records. Per the resolved open question in
//! SPEC_FULL.md §9, the slot directory is non-authoritative — lookups
//! never consult it — so this implementation omits writing one; the
//! bytes between the last record and the file trailer are left
//! zero-filled, which is indistinguishable on disk from an empty
//! directory and keeps the format forward-compatible with one.
//!
//! A page's records are protected by an internal reader/writer lock
//! (§4.5): every accessor here takes `&self`, not `&mut self`.

use parking_lot::RwLock;

use crate::config::PAGE_SIZE;
use crate::error::{Result, StorageError};
use crate::storage::page::{FileHeader, PageNumber, PageType, FILE_HEADER_SIZE, FILE_TRAILER_SIZE, INVALID_PAGE_NUMBER};
use crate::storage::record::Record;
use crate::storage::schema::Schema;

pub const PAGE_HEADER_SIZE: usize = 56;
const RECORDS_OFFSET: usize = FILE_HEADER_SIZE + PAGE_HEADER_SIZE;

struct DataPageBody {
    is_leaf: bool,
    prev_page_number: PageNumber,
    next_page_number: PageNumber,
    records: Vec<Record>,
}

/// A single 4 KiB page holding a run of records, used both as a B+ tree
/// leaf (data records, sibling-linked) and as a B+ tree inner node
/// (internal key/child-page records).
pub struct DataPage {
    page_number: PageNumber,
    inner: RwLock<DataPageBody>,
}

impl DataPage {
    /// Reads the is-leaf flag directly out of a raw page buffer, without
    /// decoding any records. The buffer pool uses this to pick the right
    /// schema (leaf vs. inner index) before calling [`Self::from_bytes`],
    /// since the two page kinds are encoded against different schemas.
    pub fn peek_is_leaf(buf: &[u8]) -> Result<bool> {
        if buf.len() <= FILE_HEADER_SIZE {
            return Err(StorageError::BytesizeMismatch {
                expected: FILE_HEADER_SIZE + 1,
                actual: buf.len(),
            });
        }
        Ok(buf[FILE_HEADER_SIZE] != 0)
    }

    pub fn new(page_number: PageNumber, is_leaf: bool) -> Self {
        Self {
            page_number,
            inner: RwLock::new(DataPageBody {
                is_leaf,
                prev_page_number: INVALID_PAGE_NUMBER,
                next_page_number: INVALID_PAGE_NUMBER,
                records: Vec::new(),
            }),
        }
    }

    pub fn page_number(&self) -> PageNumber {
        self.page_number
    }

    pub fn is_leaf(&self) -> bool {
        self.inner.read().is_leaf
    }

    pub fn record_count(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn prev_page_number(&self) -> PageNumber {
        self.inner.read().prev_page_number
    }

    pub fn next_page_number(&self) -> PageNumber {
        self.inner.read().next_page_number
    }

    pub fn set_prev_page_number(&self, prev: PageNumber) {
        self.inner.write().prev_page_number = prev;
    }

    pub fn set_next_page_number(&self, next: PageNumber) {
        self.inner.write().next_page_number = next;
    }

    /// Returns a clone of the record at `index`.
    pub fn get(&self, index: usize) -> Option<Record> {
        self.inner.read().records.get(index).cloned()
    }

    pub fn records(&self) -> Vec<Record> {
        self.inner.read().records.clone()
    }

    pub fn insert(&self, index: usize, record: Record) {
        let mut guard = self.inner.write();
        guard.records.insert(index, record);
    }

    pub fn append(&self, record: Record) {
        let mut guard = self.inner.write();
        guard.records.push(record);
    }

    pub fn delete(&self, index: usize) -> Record {
        let mut guard = self.inner.write();
        guard.records.remove(index)
    }

    /// Removes and returns every record from `from_index` on, in order.
    /// Used by a split to hand the upper half of a node's records to its
    /// new right sibling.
    pub fn shrink(&self, from_index: usize) -> Vec<Record> {
        let mut guard = self.inner.write();
        guard.records.split_off(from_index)
    }

    pub fn replace_records(&self, records: Vec<Record>) {
        self.inner.write().records = records;
    }

    /// Serialises the full page, including the file header and trailer.
    /// Per §4.5, this acquires the write lock even though it only reads.
    pub fn buffer(&self, schema: &Schema) -> Result<Vec<u8>> {
        let guard = self.inner.write();

        let mut buf = vec![0u8; PAGE_SIZE];

        let file_header = FileHeader {
            page_number: self.page_number,
            page_type: PageType::Data,
            prev_page_number: guard.prev_page_number,
            next_page_number: guard.next_page_number,
        };
        buf[0..FILE_HEADER_SIZE].copy_from_slice(&file_header.to_bytes());

        buf[FILE_HEADER_SIZE] = guard.is_leaf as u8;
        let record_count = guard.records.len() as u16;
        buf[FILE_HEADER_SIZE + 1..FILE_HEADER_SIZE + 3]
            .copy_from_slice(&record_count.to_le_bytes());

        let mut offset = RECORDS_OFFSET;
        for record in &guard.records {
            let encoded = record.to_bytes(schema);
            let end = offset + encoded.len();
            if end > PAGE_SIZE - FILE_TRAILER_SIZE {
                return Err(StorageError::BytesizeMismatch {
                    expected: PAGE_SIZE - FILE_TRAILER_SIZE,
                    actual: end,
                });
            }
            buf[offset..end].copy_from_slice(&encoded);
            offset = end;
        }

        // Trailer (currently zero-filled, no checksum) already in place.
        Ok(buf)
    }

    pub fn from_bytes(buf: &[u8], schema: &Schema) -> Result<Self> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::BytesizeMismatch {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let file_header = FileHeader::from_bytes(&buf[0..FILE_HEADER_SIZE])?;
        let is_leaf = buf[FILE_HEADER_SIZE] != 0;
        let record_count = u16::from_le_bytes(
            buf[FILE_HEADER_SIZE + 1..FILE_HEADER_SIZE + 3]
                .try_into()
                .unwrap(),
        ) as usize;

        let mut records = Vec::with_capacity(record_count);
        let mut offset = RECORDS_OFFSET;
        for _ in 0..record_count {
            let (record, consumed) = Record::from_bytes(schema, &buf[offset..])?;
            offset += consumed;
            records.push(record);
        }

        Ok(Self {
            page_number: file_header.page_number,
            inner: RwLock::new(DataPageBody {
                is_leaf,
                prev_page_number: file_header.prev_page_number,
                next_page_number: file_header.next_page_number,
                records,
            }),
        })
    }
}

//! The B+ tree leaf node (§4.6): a data page whose records carry full
//! table rows, chained to its siblings for range scans.

use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::error::{Result, StorageError};
use crate::field::Key;
use crate::index::btree::{Metadata, SplitResult};
use crate::storage::data_page::DataPage;
use crate::storage::page::{PageNumber, INVALID_PAGE_NUMBER};
use crate::storage::record::Record;

pub struct LeafNode {
    page: Arc<DataPage>,
    pool: Arc<BufferPool>,
    meta: Arc<Metadata>,
}

impl LeafNode {
    pub(crate) fn from_page(page: Arc<DataPage>, pool: Arc<BufferPool>, meta: Arc<Metadata>) -> Self {
        Self { page, pool, meta }
    }

    pub fn page_number(&self) -> PageNumber {
        self.page.page_number()
    }

    /// The leaf's keys, in ascending order, parallel to its records.
    pub(crate) fn keys(&self) -> Vec<Key> {
        self.page.records().iter().map(|r| r.key().clone()).collect()
    }

    fn search(&self, key: &Key) -> std::result::Result<usize, usize> {
        self.page.records().binary_search_by(|r| r.key().cmp(key))
    }

    /// Binary search; returns `None` on a miss rather than an error —
    /// lookups are not errors (§7).
    pub fn get_record(&self, key: &Key) -> Option<Record> {
        self.search(key).ok().and_then(|idx| self.page.get(idx))
    }

    /// The insertion index of `key` (lower-bound semantics: the first
    /// position whose key is `>= key`). Used by [`super::tree::BPlusTree::scan`]
    /// to seed a range iterator.
    pub(crate) fn lower_bound(&self, key: &Key) -> usize {
        match self.search(key) {
            Ok(idx) | Err(idx) => idx,
        }
    }

    /// This leaf's records, in key order. Used by the range iterator to
    /// walk a leaf without re-locking for every `get`.
    pub(crate) fn records(&self) -> Vec<Record> {
        self.page.records()
    }

    pub(crate) fn next_page_number(&self) -> PageNumber {
        self.page.next_page_number()
    }

    pub(crate) fn prev_page_number(&self) -> PageNumber {
        self.page.prev_page_number()
    }

    /// Inserts `(key, record)`, splitting if the leaf overflows
    /// `2 * order` keys. Unpins itself before returning, dirty iff the
    /// insert succeeded.
    pub fn put(&self, key: Key, record: Record) -> Result<Option<SplitResult>> {
        let result = self.insert(key, record);
        self.pool.unpin(self.page_number(), result.is_ok());
        result
    }

    fn insert(&self, key: Key, record: Record) -> Result<Option<SplitResult>> {
        match self.search(&key) {
            Ok(_) => return Err(StorageError::KeyExists),
            Err(idx) => self.page.insert(idx, record),
        }

        let order = self.meta.order();
        if self.page.record_count() <= 2 * order {
            return Ok(None);
        }

        self.split(order)
    }

    /// The leaf has `2 * order + 1` records; the first `order` stay, the
    /// remaining `order + 1` move to a freshly allocated right sibling
    /// spliced into the leaf chain.
    fn split(&self, order: usize) -> Result<Option<SplitResult>> {
        let right_records = self.page.shrink(order);
        let split_key = right_records[0].key().clone();
        tracing::info!(
            left_page = self.page_number(),
            moved = right_records.len(),
            "leaf overflowed, splitting"
        );

        let right_page_number = self.pool.allocate_page_number();
        let right_page = DataPage::new(right_page_number, true);
        right_page.replace_records(right_records);
        right_page.set_prev_page_number(self.page_number());
        right_page.set_next_page_number(self.page.next_page_number());
        let right_page = self.pool.apply_new_page(right_page)?;

        let old_next = self.page.next_page_number();
        self.page.set_next_page_number(right_page.page_number());

        // The Go ancestor this is grounded on leaves the old next leaf's
        // `prev` pointer stale after a split; invariant 6 and the
        // bidirectional scan scenario require the leaf chain to stay
        // walkable in both directions, so this fixes it up.
        if old_next != INVALID_PAGE_NUMBER {
            let old_next_page = self.pool.fetch_page(old_next)?;
            old_next_page.set_prev_page_number(right_page.page_number());
            self.pool.unpin(old_next, true);
        }

        self.pool.unpin(right_page.page_number(), true);

        Ok(Some(SplitResult {
            split_key,
            right_page_number: right_page.page_number(),
        }))
    }

    /// Removes `key` if present; a no-op otherwise (§4.6, deletes never
    /// rebalance). Unpins itself dirty either way.
    pub fn delete(&self, key: &Key) -> Result<()> {
        if let Ok(idx) = self.search(key) {
            self.page.delete(idx);
        }
        self.pool.unpin(self.page_number(), true);
        Ok(())
    }
}

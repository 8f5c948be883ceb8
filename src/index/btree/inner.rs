//! The B+ tree inner (non-leaf) node (§4.7): a data page whose records
//! are `(separator key, child page number)` pairs rather than full rows.
//!
//! The first record on an inner page is a sentinel: its key slot is
//! unused (encoded as [`crate::field::Value::Null`]) and it carries only
//! `children[0]`, the subtree for every key below `keys[0]`. Records
//! `1..` each carry `(keys[i-1], children[i])`.

use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::error::Result;
use crate::field::Key;
use crate::index::btree::{decode_child, encode_child, put_recursive, Metadata, SplitResult};
use crate::storage::data_page::DataPage;
use crate::storage::page::PageNumber;
use crate::storage::record::Record;

pub struct InnerNode {
    page: Arc<DataPage>,
    pool: Arc<BufferPool>,
    meta: Arc<Metadata>,
}

impl InnerNode {
    pub(crate) fn from_page(page: Arc<DataPage>, pool: Arc<BufferPool>, meta: Arc<Metadata>) -> Self {
        Self { page, pool, meta }
    }

    pub fn page_number(&self) -> PageNumber {
        self.page.page_number()
    }

    /// The node's separator keys, in ascending order; `keys[i]` is the
    /// smallest key routed to `children[i + 1]`.
    fn keys(&self) -> Vec<Key> {
        self.page
            .records()
            .iter()
            .skip(1)
            .map(|r| r.key().clone())
            .collect()
    }

    /// The node's child page numbers, `len(keys) + 1` of them.
    fn children(&self) -> Vec<PageNumber> {
        self.page
            .records()
            .iter()
            .map(|r| decode_child(&r.values[1]))
            .collect()
    }

    /// The smallest index *i* with `key < keys[i]`, or `len(keys)` if
    /// none — the index of the child subtree `key` belongs to (§4.7 `get`).
    fn child_index(&self, key: &Key) -> usize {
        let keys = self.keys();
        keys.partition_point(|k| k <= key)
    }

    pub(crate) fn child_for(&self, key: &Key) -> PageNumber {
        self.children()[self.child_index(key)]
    }

    /// Descends to the child owning `key`, inserts there, and propagates
    /// a split upward if the child returned one (§4.7 `put`). Unpins
    /// itself dirty iff it performed a mutating insert of its own.
    pub fn put(&self, key: Key, record: Record) -> Result<Option<SplitResult>> {
        let child = self.child_for(&key);
        let split = put_recursive(child, key, record, &self.meta, &self.pool)?;

        let split = match split {
            None => {
                self.pool.unpin(self.page_number(), false);
                return Ok(None);
            }
            Some(split) => split,
        };

        let result = self.insert_split(split);
        self.pool.unpin(self.page_number(), true);
        result
    }

    /// Inserts the separator key and new child page number the child's
    /// split handed up, then splits this node in turn if it now overflows.
    fn insert_split(&self, split: SplitResult) -> Result<Option<SplitResult>> {
        let keys = self.keys();
        let idx = keys.partition_point(|k| k <= &split.split_key);

        self.page
            .insert(idx + 1, Record::internal(split.split_key, split.right_page_number));

        let order = self.meta.order();
        if self.keys().len() <= 2 * order {
            return Ok(None);
        }

        self.split(order)
    }

    /// The node has `2 * order + 1` keys (`2 * order + 2` records). The
    /// key at index `order` is promoted to the parent and does not
    /// survive in either half; the first `order` keys (records `0..=order`,
    /// i.e. the sentinel plus `order` separators) stay, and the last
    /// `order` keys move to a new right sibling together with their
    /// `order + 1` children.
    fn split(&self, order: usize) -> Result<Option<SplitResult>> {
        let mut right_records = self.page.shrink(order + 1);
        let promoted_key = right_records[0].key().clone();
        tracing::info!(
            left_page = self.page_number(),
            moved = right_records.len(),
            "inner node overflowed, splitting"
        );

        // The promoted key's record supplied only a child pointer on this
        // side; turn it into the new right sibling's sentinel record so
        // its child becomes `children[0]` there.
        right_records[0] = Record::internal_sentinel(right_records[0].values[1].clone());

        let right_page_number = self.pool.allocate_page_number();
        let right_page = DataPage::new(right_page_number, false);
        right_page.replace_records(right_records);
        right_page.set_prev_page_number(self.page_number());
        right_page.set_next_page_number(self.page.next_page_number());
        let right_page = self.pool.apply_new_page(right_page)?;

        self.page.set_next_page_number(right_page.page_number());
        self.pool.unpin(right_page.page_number(), true);

        Ok(Some(SplitResult {
            split_key: promoted_key,
            right_page_number: right_page.page_number(),
        }))
    }

    /// Recurses to the leaf owning `key` and deletes it there; inner
    /// nodes are never adjusted on delete (§4.7).
    pub fn delete(&self, key: &Key) -> Result<()> {
        let child = self.child_for(key);
        crate::index::btree::delete_recursive(child, key, &self.meta, &self.pool)?;
        self.pool.unpin(self.page_number(), false);
        Ok(())
    }
}

impl Record {
    /// Builds the `(key, child)` record an inner page stores for a
    /// non-sentinel entry.
    pub(crate) fn internal(key: Key, child: PageNumber) -> Record {
        Record::new(
            crate::storage::record::RecordType::Internal,
            0,
            vec![key, encode_child(child)],
        )
    }

    /// Builds the sentinel record occupying index 0 of an inner page: its
    /// key slot is unused (null) and it carries only `children[0]`.
    pub(crate) fn internal_sentinel(child: crate::field::Value) -> Record {
        Record::new(
            crate::storage::record::RecordType::Internal,
            0,
            vec![crate::field::Value::Null, child],
        )
    }
}

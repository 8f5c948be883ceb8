//! The top-level B+ tree (§4.8): root management, the public
//! `get`/`put`/`delete` API, and range-scan construction.
//!
//! The root is the one piece of tree-wide mutable state that isn't a
//! page itself-worth of bookkeeping — it can be replaced wholesale when
//! the old root splits — so it lives behind a [`parking_lot::Mutex`]
//! here rather than inside [`Metadata`], which is otherwise shared
//! read-only across every node.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::BufferPool;
use crate::error::Result;
use crate::field::Key;
use crate::storage::data_page::DataPage;
use crate::storage::page::PageNumber;
use crate::storage::record::Record;
use crate::storage::schema::Schema;

use super::{delete_recursive, encode_child, get_recursive, put_recursive, Metadata, RangeIterator, SplitResult};

struct RootState {
    page_number: PageNumber,
    height: usize,
}

pub struct BPlusTree {
    meta: Arc<Metadata>,
    pool: Arc<BufferPool>,
    root: Mutex<RootState>,
}

impl BPlusTree {
    /// Allocates a new, empty leaf through `pool` and installs it as the
    /// root at height 1 (§4.8 Construction).
    pub fn new(order: usize, schema: Schema, pool: Arc<BufferPool>) -> Result<Self> {
        let meta = Arc::new(Metadata::new(order, schema));
        let root = pool.apply_new_blank_page(true)?;
        let page_number = root.page_number();
        pool.unpin(page_number, true);

        Ok(Self {
            meta,
            pool,
            root: Mutex::new(RootState {
                page_number,
                height: 1,
            }),
        })
    }

    pub fn root_page_number(&self) -> PageNumber {
        self.root.lock().page_number
    }

    pub fn height(&self) -> usize {
        self.root.lock().height
    }

    pub fn order(&self) -> usize {
        self.meta.order()
    }

    /// Descends to the leaf that would hold `key` and looks it up there.
    /// A miss is `Ok(None)`, not an error (§7).
    pub fn get(&self, key: &Key) -> Result<Option<Record>> {
        let root_page_number = self.root.lock().page_number;
        let leaf = get_recursive(root_page_number, key, &self.meta, &self.pool)?;
        let record = leaf.get_record(key);
        self.pool.unpin(leaf.page_number(), false);
        Ok(record)
    }

    /// Inserts `(key, record)`, growing the tree's height by wrapping a
    /// fresh inner root around the old root when it splits (§4.8 `put`).
    /// Fails with [`crate::error::StorageError::KeyExists`] if `key` is
    /// already present, leaving the tree unchanged.
    pub fn put(&self, key: Key, record: Record) -> Result<()> {
        let mut root = self.root.lock();
        let split = put_recursive(root.page_number, key, record, &self.meta, &self.pool)?;
        if let Some(split) = split {
            self.grow_root(&mut root, split)?;
        }
        Ok(())
    }

    /// Wraps a brand-new inner node around the current root: its sentinel
    /// child is the old root, and its one separator is the split key the
    /// old root's split handed up.
    fn grow_root(&self, root: &mut RootState, split: SplitResult) -> Result<()> {
        let new_root_page_number = self.pool.allocate_page_number();
        let new_root_page = DataPage::new(new_root_page_number, false);
        new_root_page.append(Record::internal_sentinel(encode_child(root.page_number)));
        new_root_page.append(Record::internal(split.split_key, split.right_page_number));
        let new_root_page = self.pool.apply_new_page(new_root_page)?;
        self.pool.unpin(new_root_page.page_number(), true);

        root.page_number = new_root_page_number;
        root.height += 1;
        Ok(())
    }

    /// Deletes `key` if present; a no-op otherwise. Never rebalances
    /// (§4.7, §9 — an accepted trade-off inherited from the source).
    pub fn delete(&self, key: &Key) -> Result<()> {
        let root_page_number = self.root.lock().page_number;
        delete_recursive(root_page_number, key, &self.meta, &self.pool)
    }

    /// Navigates to the leaf that would contain `key` and seeds a
    /// bidirectional range iterator at the lower-bound position (§4.8
    /// `scan`): the first record whose key is `>= key`.
    pub fn scan(&self, key: &Key) -> Result<RangeIterator> {
        let root_page_number = self.root.lock().page_number;
        let leaf = get_recursive(root_page_number, key, &self.meta, &self.pool)?;
        let pos = leaf.lower_bound(key);
        Ok(RangeIterator::new(leaf, pos, self.pool.clone(), self.meta.clone()))
    }
}

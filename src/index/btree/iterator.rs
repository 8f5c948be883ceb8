//! The bidirectional range iterator returned by [`super::tree::BPlusTree::scan`]
//! (§4.8): a cursor over `(leaf, position)` that walks the leaf sibling
//! chain forward on [`RangeIterator::next`] and backward on
//! [`RangeIterator::prev`], crossing leaf boundaries via `next`/`prev`
//! page pointers and stopping at the invalid sentinel.

use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::error::Result;
use crate::index::btree::{BPlusNode, LeafNode, Metadata};
use crate::storage::page::{PageNumber, INVALID_PAGE_NUMBER};
use crate::storage::record::Record;

/// A cursor into the leaf chain, finite in both directions and
/// restartable only by calling [`super::tree::BPlusTree::scan`] again
/// (§4.8). `pos` may run one past the last record (forward exhaustion)
/// or one before the first (backward exhaustion); those are the only
/// two out-of-range states this cursor can reach.
pub struct RangeIterator {
    pool: Arc<BufferPool>,
    meta: Arc<Metadata>,
    leaf: LeafNode,
    pos: isize,
}

impl RangeIterator {
    pub(crate) fn new(leaf: LeafNode, start_pos: usize, pool: Arc<BufferPool>, meta: Arc<Metadata>) -> Self {
        Self {
            pool,
            meta,
            leaf,
            pos: start_pos as isize,
        }
    }

    /// Fetches and pins the leaf at `page_number`, unpinning the leaf
    /// this cursor is leaving.
    fn move_to(&mut self, page_number: PageNumber) -> Result<()> {
        let next = match crate::index::btree::node_from(page_number, &self.meta, &self.pool)? {
            BPlusNode::Leaf(leaf) => leaf,
            BPlusNode::Inner(inner) => {
                // Sibling links are only maintained within a tree level
                // (§3 invariant 6); a leaf's neighbour is always a leaf.
                self.pool.unpin(inner.page_number(), false);
                unreachable!("a leaf's sibling pointer must name another leaf")
            }
        };
        self.pool.unpin(self.leaf.page_number(), false);
        self.leaf = next;
        Ok(())
    }

    /// Yields the record at the cursor and advances it by one. Crosses
    /// into the next leaf when the cursor runs past the current leaf's
    /// last record; returns `Ok(None)` once the chain's end is reached.
    pub fn next(&mut self) -> Result<Option<Record>> {
        let records = self.leaf.records();
        if self.pos >= 0 && (self.pos as usize) < records.len() {
            let record = records[self.pos as usize].clone();
            self.pos += 1;
            return Ok(Some(record));
        }

        let next_page_number = self.leaf.next_page_number();
        if next_page_number == INVALID_PAGE_NUMBER {
            return Ok(None);
        }
        self.move_to(next_page_number)?;

        let records = self.leaf.records();
        match records.first() {
            Some(record) => {
                self.pos = 1;
                Ok(Some(record.clone()))
            }
            None => {
                self.pos = 0;
                Ok(None)
            }
        }
    }

    /// Yields the record at the cursor and retreats it by one. Crosses
    /// into the previous leaf when the cursor runs before the current
    /// leaf's first record; returns `Ok(None)` once the chain's start is
    /// reached.
    pub fn prev(&mut self) -> Result<Option<Record>> {
        let records = self.leaf.records();
        if self.pos >= 0 {
            let mut idx = self.pos as usize;
            if idx == records.len() && idx > 0 {
                idx -= 1;
            }
            if idx < records.len() {
                let record = records[idx].clone();
                self.pos = idx as isize - 1;
                return Ok(Some(record));
            }
        }

        let prev_page_number = self.leaf.prev_page_number();
        if prev_page_number == INVALID_PAGE_NUMBER {
            return Ok(None);
        }
        self.move_to(prev_page_number)?;

        let records = self.leaf.records();
        match records.len() {
            0 => {
                self.pos = -1;
                Ok(None)
            }
            len => {
                self.pos = len as isize - 1;
                Ok(Some(records[len - 1].clone()))
            }
        }
    }
}

impl Drop for RangeIterator {
    fn drop(&mut self) {
        self.pool.unpin(self.leaf.page_number(), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPool;
    use crate::config::PAGE_SIZE;
    use crate::field::{FieldType, Value};
    use crate::index::btree::BPlusTree;
    use crate::storage::disk::DiskManager;
    use crate::storage::schema::Schema;
    use tempfile::NamedTempFile;

    fn schema() -> Schema {
        Schema::new(vec![
            ("id".into(), FieldType::integer(false)),
            ("name".into(), FieldType::varchar(16, true).unwrap()),
        ])
    }

    fn tree(order: usize) -> BPlusTree {
        let tmp = NamedTempFile::new().unwrap();
        let disk = Arc::new(DiskManager::open(tmp.path(), PAGE_SIZE).unwrap());
        let pool = Arc::new(BufferPool::new(disk, schema(), 64, 2));
        BPlusTree::new(order, schema(), pool).unwrap()
    }

    fn record(id: i32) -> Record {
        Record::data(0, vec![Value::Integer(id), Value::Varchar(format!("n{id}"))])
    }

    #[test]
    fn forward_then_backward_visits_every_record_once_each_way() {
        let tree = tree(2);
        for id in [5, 2, 8, 1, 9, 3, 7, 4, 6, 10] {
            tree.put(Value::Integer(id), record(id)).unwrap();
        }

        let mut it = tree.scan(&Value::Integer(3)).unwrap();
        let mut forward = Vec::new();
        while let Some(r) = it.next().unwrap() {
            forward.push(r.key().clone());
        }
        assert_eq!(
            forward,
            (3..=10).map(Value::Integer).collect::<Vec<_>>()
        );
        assert!(it.next().unwrap().is_none());

        let mut backward = Vec::new();
        while let Some(r) = it.prev().unwrap() {
            backward.push(r.key().clone());
        }
        assert_eq!(
            backward,
            (1..=10).rev().map(Value::Integer).collect::<Vec<_>>()
        );
        assert!(it.prev().unwrap().is_none());
    }
}

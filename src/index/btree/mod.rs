//! The clustered B+ tree (§4.6–§4.8): leaf and inner nodes whose storage
//! *is* a [`DataPage`] drawn from the buffer pool, plus the tree that owns
//! root management and the bidirectional range iterator.
//!
//! Per the design note on polymorphism over node kinds, a node is a tagged
//! [`BPlusNode`] rather than a trait object; [`node_from`] materialises the
//! right variant by inspecting the page's is-leaf flag, mirroring the Go
//! ancestor's `BPlusNodeFrom`.

mod inner;
mod iterator;
mod leaf;
mod tree;

pub use iterator::RangeIterator;
pub use tree::BPlusTree;

use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::error::Result;
use crate::field::{Key, Value};
use crate::storage::page::PageNumber;
use crate::storage::record::Record;
use crate::storage::schema::Schema;

pub use inner::InnerNode;
pub use leaf::LeafNode;

/// Parameters shared by every node of one tree: its fanout and the schema
/// its leaves store full records against. Tree-level mutable state (root
/// page number, height) lives in [`BPlusTree`] itself, not here.
#[derive(Debug, Clone)]
pub struct Metadata {
    order: usize,
    schema: Schema,
    space_id: u32,
}

impl Metadata {
    pub fn new(order: usize, schema: Schema) -> Self {
        Self {
            order,
            schema,
            space_id: 1,
        }
    }

    /// The fanout parameter *d*: non-root nodes hold between `order` and
    /// `2 * order` keys.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn space_id(&self) -> u32 {
        self.space_id
    }
}

/// The pair a node split hands to its parent: the separator key to insert
/// and the page number of the newly created right sibling.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub split_key: Key,
    pub right_page_number: PageNumber,
}

/// A materialised B+ tree node: either variant exposes `page_number`, but
/// `get`/`put`/`delete` live on the concrete types since their shapes
/// differ enough that a shared trait would just be an indirection.
pub enum BPlusNode {
    Leaf(LeafNode),
    Inner(InnerNode),
}

impl BPlusNode {
    pub fn page_number(&self) -> PageNumber {
        match self {
            BPlusNode::Leaf(leaf) => leaf.page_number(),
            BPlusNode::Inner(inner) => inner.page_number(),
        }
    }
}

/// Fetches (and pins) `page_number` from the pool and wraps it in the
/// node variant its is-leaf flag indicates.
pub(crate) fn node_from(
    page_number: PageNumber,
    meta: &Arc<Metadata>,
    pool: &Arc<BufferPool>,
) -> Result<BPlusNode> {
    let page = pool.fetch_page(page_number)?;
    Ok(if page.is_leaf() {
        BPlusNode::Leaf(LeafNode::from_page(page, pool.clone(), meta.clone()))
    } else {
        BPlusNode::Inner(InnerNode::from_page(page, pool.clone(), meta.clone()))
    })
}

/// Descends from `page_number` to the leaf that would hold `key`,
/// unpinning every inner node it passes through (§4.7 `get`). The
/// returned leaf remains pinned; the caller must unpin it.
pub(crate) fn get_recursive(
    page_number: PageNumber,
    key: &Key,
    meta: &Arc<Metadata>,
    pool: &Arc<BufferPool>,
) -> Result<LeafNode> {
    match node_from(page_number, meta, pool)? {
        BPlusNode::Leaf(leaf) => Ok(leaf),
        BPlusNode::Inner(inner) => {
            let child = inner.child_for(key);
            pool.unpin(inner.page_number(), false);
            get_recursive(child, key, meta, pool)
        }
    }
}

/// Descends to the leaf owning `key`, inserts there, and propagates any
/// resulting split upward one level at a time (§4.6–§4.7 `put`).
pub(crate) fn put_recursive(
    page_number: PageNumber,
    key: Key,
    record: Record,
    meta: &Arc<Metadata>,
    pool: &Arc<BufferPool>,
) -> Result<Option<SplitResult>> {
    match node_from(page_number, meta, pool)? {
        BPlusNode::Leaf(leaf) => leaf.put(key, record),
        BPlusNode::Inner(inner) => inner.put(key, record),
    }
}

/// Descends to the leaf owning `key` and deletes it there; inner nodes
/// along the path are not adjusted (§4.7 `delete`).
pub(crate) fn delete_recursive(
    page_number: PageNumber,
    key: &Key,
    meta: &Arc<Metadata>,
    pool: &Arc<BufferPool>,
) -> Result<()> {
    match node_from(page_number, meta, pool)? {
        BPlusNode::Leaf(leaf) => leaf.delete(key),
        BPlusNode::Inner(inner) => inner.delete(key),
    }
}

/// Encodes a child page number as the 4-byte fixed-binary value an inner
/// page's second field holds (§4.7).
pub(crate) fn encode_child(page_number: PageNumber) -> Value {
    Value::Binary(page_number.to_le_bytes().to_vec())
}

/// Inverse of [`encode_child`]. Panics if `value` is not a 4-byte binary,
/// which would indicate a corrupt inner-page record.
pub(crate) fn decode_child(value: &Value) -> PageNumber {
    match value {
        Value::Binary(bytes) if bytes.len() == 4 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(bytes);
            PageNumber::from_le_bytes(buf)
        }
        other => panic!("inner node record's child field is not a 4-byte binary: {other:?}"),
    }
}

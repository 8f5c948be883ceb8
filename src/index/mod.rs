//! The clustered B+ tree index (§4.6–§4.8): leaf and inner nodes built
//! directly on top of [`crate::storage::data_page::DataPage`], with the
//! tree itself owning root management, the public `get`/`put`/`delete`
//! API, and the bidirectional range iterator.

pub mod btree;

pub use btree::{BPlusTree, InnerNode, LeafNode, Metadata, RangeIterator};

//! The buffer pool (§4.3) and its LRU-K replacement policy (§4.2): the
//! layer that mediates every page read and write between the B+ tree and
//! the disk manager.

pub mod pool;
pub mod replacer;

pub use pool::BufferPool;
pub use replacer::{FrameId, LruKReplacer, ReplacerError};

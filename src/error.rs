//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`Result<T>`], an alias for
//! `std::result::Result<T, StorageError>`. The variants mirror the error kinds
//! catalogued for the storage core: allocation failures, pool exhaustion,
//! duplicate keys, and malformed byte buffers. Lookup misses are represented
//! as `Option::None`, not as errors.

use std::io;

use crate::storage::page::PageNumber;

/// Errors produced by the page, buffer-pool, and B+ tree layers.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("page {0} has not been allocated")]
    PageNotAllocated(PageNumber),

    #[error("buffer pool is full: no evictable frame available")]
    BufferPoolFull,

    #[error("key already exists")]
    KeyExists,

    #[error("byte length mismatch: expected {expected}, got {actual}")]
    BytesizeMismatch { expected: usize, actual: usize },

    #[error("invalid length: variable-length fields require a positive declared maximum")]
    InvalidLength,

    #[error("I/O error")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

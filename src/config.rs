//! Runtime configuration for the storage core.
//!
//! Mirrors the builder pattern the rest of this lineage uses for its
//! configuration structs (compare `BufferPoolConfig`): a `Default` impl with
//! sensible values, plus a fluent builder for tests and embedders that want
//! non-default knobs.

use std::env;
use std::path::{Path, PathBuf};

use crate::storage::page::PageNumber;

/// Page size in bytes. Fixed at build time; every collaborator must agree on it.
pub const PAGE_SIZE: usize = 4096;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub page_size: usize,
    pub buffer_pool_size: usize,
    pub lru_k: usize,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            buffer_pool_size: 64,
            lru_k: 2,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::new()
    }
}

#[derive(Debug, Default)]
pub struct StorageConfigBuilder {
    config: StorageConfig,
}

impl StorageConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn buffer_pool_size(mut self, size: usize) -> Self {
        self.config.buffer_pool_size = size;
        self
    }

    pub fn lru_k(mut self, k: usize) -> Self {
        self.config.lru_k = k;
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    pub fn build(self) -> StorageConfig {
        self.config
    }
}

/// Process-wide page-number allocator.
///
/// Reified as an explicit value handed to the buffer pool rather than a
/// true global, per the design note on avoiding shared-ownership globals.
/// Seeded from `CUR_PAGE_NUMBER`; absent or malformed values default to 0,
/// so the first page allocated is number 1 (0 is the invalid sentinel).
pub struct PageNumberAllocator {
    next: PageNumber,
}

impl PageNumberAllocator {
    pub fn new(seed: PageNumber) -> Self {
        Self { next: seed }
    }

    pub fn from_env() -> Self {
        let seed = env::var("CUR_PAGE_NUMBER")
            .ok()
            .and_then(|v| v.parse::<PageNumber>().ok())
            .unwrap_or(0);
        Self::new(seed)
    }

    /// Returns the next fresh, process-unique page number.
    pub fn next(&mut self) -> PageNumber {
        self.next += 1;
        self.next
    }
}

pub fn data_file_path(config: &StorageConfig) -> PathBuf {
    Path::new(&config.data_dir).join("data.db")
}

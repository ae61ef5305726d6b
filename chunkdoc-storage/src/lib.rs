//! chunkdoc storage backends
//!
//! Provides store abstractions and implementations:
//! - `KvStore` trait for pluggable transactional key-value stores
//! - `MemoryStore` for testing
//! - `SledStore` for persistent storage

pub mod backend;
pub mod memory;
pub mod sled_backend;

pub use backend::{AsyncWrapper, KvStore, KvStoreSync, StoreStats, WriteOp};
pub use memory::MemoryStore;
pub use sled_backend::SledStore;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path to storage directory
    pub path: std::path::PathBuf,

    /// Flush to disk after every commit
    pub flush_on_commit: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: std::path::PathBuf::from("./chunkdoc_data"),
            flush_on_commit: true,
        }
    }
}

impl StorageConfig {
    /// Create a new storage config with the given path
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Enable/disable flushing after each commit
    pub fn with_flush_on_commit(mut self, enabled: bool) -> Self {
        self.flush_on_commit = enabled;
        self
    }
}

/// In-memory store behind the async trait
pub fn memory_store() -> AsyncWrapper<MemoryStore> {
    AsyncWrapper(MemoryStore::new())
}

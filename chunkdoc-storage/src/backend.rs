//! Key-value store trait
//!
//! Defines the transactional store interface the document engine writes
//! through: point reads, ordered prefix scans, and atomic multi-key commits.

use bytes::Bytes;
use chunkdoc_core::error::Result;
use futures::stream::BoxStream;
use std::future::Future;
use std::pin::Pin;

/// A single mutation inside an atomic commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: String, value: Bytes },
    Delete { key: String },
}

impl WriteOp {
    pub fn put(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        WriteOp::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        WriteOp::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Number of keys currently stored
    pub key_count: u64,

    /// Total bytes used by values
    pub bytes_used: u64,

    /// Number of point reads
    pub reads: u64,

    /// Number of prefix scans
    pub scans: u64,

    /// Number of put operations applied
    pub writes: u64,

    /// Number of delete operations applied, including deletes of absent keys
    pub deletes: u64,

    /// Number of atomic commits
    pub commits: u64,
}

/// Async transactional store trait
///
/// All implementations must be Send + Sync for use in async contexts.
/// `commit` applies every operation or none of them.
pub trait KvStore: Send + Sync {
    /// Read a value
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>>> + Send + 'a>>;

    /// Stream every `(key, value)` under `prefix` in key order
    fn scan_prefix<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, Result<(String, Bytes)>>;

    /// Atomically apply a batch of operations
    fn commit<'a>(
        &'a self,
        ops: Vec<WriteOp>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Get store statistics
    fn stats<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<StoreStats>> + Send + 'a>>;

    /// Flush any pending writes to disk
    fn flush<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Synchronous store trait (for simpler implementations)
pub trait KvStoreSync: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Every `(key, value)` under `prefix` in key order
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Bytes)>>;

    /// Atomically apply a batch of operations
    fn commit(&self, ops: Vec<WriteOp>) -> Result<()>;

    /// Get store statistics
    fn stats(&self) -> Result<StoreStats>;

    /// Flush any pending writes
    fn flush(&self) -> Result<()>;
}

/// Wrapper to convert a sync store to async
pub struct AsyncWrapper<T: KvStoreSync>(pub T);

impl<T: KvStoreSync> AsyncWrapper<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }
}

impl<T: KvStoreSync + 'static> KvStore for AsyncWrapper<T> {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>>> + Send + 'a>> {
        Box::pin(async move { self.0.get(key) })
    }

    fn scan_prefix<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, Result<(String, Bytes)>> {
        let items: Vec<Result<(String, Bytes)>> = match self.0.scan_prefix(prefix) {
            Ok(entries) => entries.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        Box::pin(futures::stream::iter(items))
    }

    fn commit<'a>(
        &'a self,
        ops: Vec<WriteOp>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { self.0.commit(ops) })
    }

    fn stats<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<StoreStats>> + Send + 'a>> {
        Box::pin(async move { self.0.stats() })
    }

    fn flush<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { self.0.flush() })
    }
}

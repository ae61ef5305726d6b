//! In-memory store
//!
//! Used for testing and development. Not persistent.

use crate::backend::{KvStoreSync, StoreStats, WriteOp};
use bytes::Bytes;
use chunkdoc_core::error::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory ordered key-value store
///
/// Commits run under a single write guard, so readers observe either all
/// of a batch or none of it.
pub struct MemoryStore {
    /// Key-value storage, ordered for prefix scans
    entries: RwLock<BTreeMap<String, Bytes>>,

    /// Current bytes used by values
    bytes_used: AtomicU64,

    /// Operation counters
    reads: AtomicU64,
    scans: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    commits: AtomicU64,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            bytes_used: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            commits: AtomicU64::new(0),
        }
    }

    /// All keys currently stored, in order
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of keys stored
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.bytes_used.store(0, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStoreSync for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.read();
        Ok(entries.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Bytes)>> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut entries = self.entries.write();

        for op in ops {
            match op {
                WriteOp::Put { key, value } => {
                    let len = value.len() as u64;
                    if let Some(old) = entries.insert(key, value) {
                        self.bytes_used.fetch_sub(old.len() as u64, Ordering::SeqCst);
                    }
                    self.bytes_used.fetch_add(len, Ordering::SeqCst);
                    self.writes.fetch_add(1, Ordering::Relaxed);
                }
                WriteOp::Delete { key } => {
                    if let Some(old) = entries.remove(&key) {
                        self.bytes_used.fetch_sub(old.len() as u64, Ordering::SeqCst);
                    }
                    self.deletes.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        let entries = self.entries.read();
        Ok(StoreStats {
            key_count: entries.len() as u64,
            bytes_used: self.bytes_used.load(Ordering::SeqCst),
            reads: self.reads.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
        })
    }

    fn flush(&self) -> Result<()> {
        // No-op for in-memory storage
        Ok(())
    }
}

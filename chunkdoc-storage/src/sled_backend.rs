//! Sled-based persistent store
//!
//! Sled is pure Rust, keeps keys ordered for prefix scans, and applies a
//! `Batch` atomically, which is exactly the commit contract the document
//! engine needs.

use crate::backend::{KvStoreSync, StoreStats, WriteOp};
use crate::StorageConfig;
use bytes::Bytes;
use chunkdoc_core::error::{ChunkDocError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Sled-backed key-value store
pub struct SledStore {
    db: sled::Db,

    /// Flush after every commit
    flush_on_commit: bool,

    /// Operation counters
    reads: AtomicU64,
    scans: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    commits: AtomicU64,
}

impl SledStore {
    /// Open or create a store at `config.path`
    pub fn open(config: StorageConfig) -> Result<Self> {
        info!(path = ?config.path, "Opening Sled store");

        let db = sled::open(&config.path)
            .map_err(|e| ChunkDocError::Storage(format!("Failed to open Sled: {}", e)))?;

        Ok(Self::from_db(db, config.flush_on_commit))
    }

    /// Open an in-memory store (for testing)
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| ChunkDocError::Storage(format!("Failed to open Sled: {}", e)))?;
        Ok(Self::from_db(db, false))
    }

    fn from_db(db: sled::Db, flush_on_commit: bool) -> Self {
        Self {
            db,
            flush_on_commit,
            reads: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            commits: AtomicU64::new(0),
        }
    }

    /// Get database size estimate
    pub fn size_on_disk(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }
}

fn storage_err(e: sled::Error) -> ChunkDocError {
    ChunkDocError::Storage(e.to_string())
}

impl KvStoreSync for SledStore {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .db
            .get(key.as_bytes())
            .map_err(storage_err)?
            .map(|v| Bytes::copy_from_slice(&v)))
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Bytes)>> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        let mut entries = Vec::new();

        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, value) = item.map_err(storage_err)?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| ChunkDocError::Storage(format!("Non UTF-8 key: {}", e)))?;
            entries.push((key, Bytes::copy_from_slice(&value)));
        }

        Ok(entries)
    }

    fn commit(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut batch = sled::Batch::default();
        let (mut puts, mut dels) = (0u64, 0u64);

        for op in ops {
            match op {
                WriteOp::Put { key, value } => {
                    batch.insert(key.as_bytes(), value.as_ref());
                    puts += 1;
                }
                WriteOp::Delete { key } => {
                    batch.remove(key.as_bytes());
                    dels += 1;
                }
            }
        }

        self.db.apply_batch(batch).map_err(storage_err)?;
        if self.flush_on_commit {
            self.db.flush().map_err(storage_err)?;
        }

        self.writes.fetch_add(puts, Ordering::Relaxed);
        self.deletes.fetch_add(dels, Ordering::Relaxed);
        self.commits.fetch_add(1, Ordering::Relaxed);
        debug!(puts, deletes = dels, "Committed batch");

        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        let mut bytes_used = 0u64;
        let mut key_count = 0u64;
        for item in self.db.iter() {
            let (_, value) = item.map_err(storage_err)?;
            bytes_used += value.len() as u64;
            key_count += 1;
        }

        Ok(StoreStats {
            key_count,
            bytes_used,
            reads: self.reads.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
        })
    }

    fn flush(&self) -> Result<()> {
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }
}

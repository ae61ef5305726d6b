//! Chunk diff / reuse engine
//!
//! Compares the chunk set of a new buffer against the previous generation's
//! meta and proposes the minimal store write: new chunks are put, chunks the
//! new generation no longer references are deleted, shared chunks are left
//! alone. Nothing is committed here; the caller applies the resulting
//! operations in one atomic batch.

use crate::keys::{validate_name, KeyLayout};
use crate::meta::ChunkMeta;
use base64::Engine;
use bytes::Bytes;
use chunkdoc_core::error::Result;
use chunkdoc_core::{chunk, ChunkHash, ChunkHasher, ChunkingConfig};
use chunkdoc_storage::WriteOp;
use std::collections::HashSet;
use tracing::debug;

/// Reuse counters for one diff
///
/// Totals count distinct chunks of the new generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReuseStats {
    pub chunks_total: usize,
    pub chunks_reused: usize,
    pub chunks_written: usize,
    pub chunks_deleted: usize,
    pub bytes_total: u64,
    pub bytes_reused: u64,
}

impl ReuseStats {
    /// Fraction of distinct chunks that needed no write
    pub fn chunk_reuse_ratio(&self) -> f64 {
        if self.chunks_total == 0 {
            0.0
        } else {
            self.chunks_reused as f64 / self.chunks_total as f64
        }
    }

    /// Fraction of distinct chunk bytes that needed no write
    pub fn byte_reuse_ratio(&self) -> f64 {
        if self.bytes_total == 0 {
            0.0
        } else {
            self.bytes_reused as f64 / self.bytes_total as f64
        }
    }
}

/// Proposed store write for one document update
#[derive(Debug, Clone)]
pub struct WriteSet {
    pub name: String,

    /// Chunks not present in the previous generation
    pub chunk_puts: Vec<(ChunkHash, Bytes)>,

    /// Chunks only the previous generation referenced
    pub chunk_deletes: Vec<ChunkHash>,

    /// Replacement meta record
    pub meta: ChunkMeta,

    pub stats: ReuseStats,
}

impl WriteSet {
    /// Lower to store operations: base64 chunk puts, chunk deletes, then
    /// the JSON meta put.
    pub fn to_ops(&self, layout: &KeyLayout) -> Result<Vec<WriteOp>> {
        let engine = base64::engine::general_purpose::STANDARD;
        let mut ops = Vec::with_capacity(self.chunk_puts.len() + self.chunk_deletes.len() + 1);

        for (hash, data) in &self.chunk_puts {
            ops.push(WriteOp::put(
                layout.chunk_key(&self.name, hash),
                engine.encode(data),
            ));
        }
        for hash in &self.chunk_deletes {
            ops.push(WriteOp::delete(layout.chunk_key(&self.name, hash)));
        }
        ops.push(WriteOp::put(layout.meta_key(&self.name), self.meta.to_bytes()?));

        Ok(ops)
    }
}

/// Chunk `new_bytes` and diff it against `prior`.
///
/// Pure with respect to the store: the same inputs always produce the same
/// write set, so a replayed transaction can call this again safely.
pub async fn diff_and_write<H>(
    name: &str,
    new_bytes: &[u8],
    prior: Option<&ChunkMeta>,
    config: &ChunkingConfig,
    hasher: &H,
) -> Result<WriteSet>
where
    H: ChunkHasher + ?Sized,
{
    validate_name(name)?;
    let set = chunk(config, new_bytes, hasher).await?;

    let mut to_delete: HashSet<&ChunkHash> = prior
        .map(|meta| meta.ordered_hashes.iter().collect())
        .unwrap_or_default();

    let mut stats = ReuseStats::default();
    let mut chunk_puts = Vec::new();
    for hash in set.distinct_in_order() {
        let data = &set.chunks[hash];
        stats.chunks_total += 1;
        stats.bytes_total += data.len() as u64;

        if to_delete.remove(hash) {
            stats.chunks_reused += 1;
            stats.bytes_reused += data.len() as u64;
        } else {
            chunk_puts.push((hash.clone(), data.clone()));
        }
    }

    let mut chunk_deletes: Vec<ChunkHash> = to_delete.into_iter().cloned().collect();
    chunk_deletes.sort();

    stats.chunks_written = chunk_puts.len();
    stats.chunks_deleted = chunk_deletes.len();

    let meta = ChunkMeta {
        total_length: new_bytes.len() as u64,
        write_count: prior.map_or(0, |m| m.write_count).saturating_add(1),
        ordered_hashes: set.ordered_hashes,
    };

    debug!(
        name,
        reused = stats.chunks_reused,
        total = stats.chunks_total,
        bytes_reused = stats.bytes_reused,
        bytes_total = stats.bytes_total,
        deleted = stats.chunks_deleted,
        "{} of {} chunks reused, {}B of {}B reused",
        stats.chunks_reused,
        stats.chunks_total,
        stats.bytes_reused,
        stats.bytes_total,
    );

    Ok(WriteSet {
        name: name.to_string(),
        chunk_puts,
        chunk_deletes,
        meta,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkdoc_core::{Blake3Hasher, ChunkDocError};

    fn small() -> ChunkingConfig {
        ChunkingConfig::new(1024, 256, 2048)
    }

    #[tokio::test]
    async fn test_first_write_puts_every_distinct_chunk() {
        let data = vec![0u8; 5000];
        let ws = diff_and_write("doc", &data, None, &small(), &Blake3Hasher)
            .await
            .unwrap();

        // 2048 + 2048 + 904, first two identical
        assert_eq!(ws.meta.ordered_hashes.len(), 3);
        assert_eq!(ws.chunk_puts.len(), 2);
        assert!(ws.chunk_deletes.is_empty());
        assert_eq!(ws.meta.total_length, 5000);
        assert_eq!(ws.meta.write_count, 1);
        assert_eq!(ws.stats.chunks_reused, 0);
        assert_eq!(ws.stats.bytes_total, 2048 + 904);
    }

    #[tokio::test]
    async fn test_unchanged_rewrite_reuses_everything() {
        let data = vec![0u8; 5000];
        let first = diff_and_write("doc", &data, None, &small(), &Blake3Hasher)
            .await
            .unwrap();
        let second = diff_and_write("doc", &data, Some(&first.meta), &small(), &Blake3Hasher)
            .await
            .unwrap();

        assert!(second.chunk_puts.is_empty());
        assert!(second.chunk_deletes.is_empty());
        assert_eq!(second.meta.ordered_hashes, first.meta.ordered_hashes);
        assert_eq!(second.meta.write_count, 2);
        assert_eq!(second.stats.chunk_reuse_ratio(), 1.0);
        assert_eq!(second.stats.byte_reuse_ratio(), 1.0);

        // meta put is the only operation
        let ops = second.to_ops(&KeyLayout::default()).unwrap();
        assert_eq!(ops, vec![WriteOp::put("chunkdoc/doc/meta", second.meta.to_bytes().unwrap())]);
    }

    #[tokio::test]
    async fn test_single_byte_flip_rewrites_one_chunk() {
        let original = vec![0u8; 5000];
        let mut edited = original.clone();
        edited[2500] = 1;

        let first = diff_and_write("doc", &original, None, &small(), &Blake3Hasher)
            .await
            .unwrap();
        let second = diff_and_write("doc", &edited, Some(&first.meta), &small(), &Blake3Hasher)
            .await
            .unwrap();

        // only the chunk covering 2048..4096 changed
        assert_eq!(second.chunk_puts.len(), 1);
        assert_eq!(second.chunk_puts[0].1.len(), 2048);
        assert_eq!(second.chunk_puts[0].1[2500 - 2048], 1);
        assert!(second.chunk_deletes.is_empty());
        assert_eq!(second.stats.chunks_reused, 2);
        assert_eq!(second.stats.chunks_total, 3);
        assert_eq!(second.meta.ordered_hashes[0], first.meta.ordered_hashes[0]);
        assert_eq!(second.meta.ordered_hashes[2], first.meta.ordered_hashes[2]);
    }

    #[tokio::test]
    async fn test_unreferenced_chunks_deleted() {
        let first = diff_and_write("doc", &vec![1u8; 3000], None, &small(), &Blake3Hasher)
            .await
            .unwrap();
        let second = diff_and_write("doc", &vec![2u8; 100], Some(&first.meta), &small(), &Blake3Hasher)
            .await
            .unwrap();

        let mut old: Vec<ChunkHash> = first.meta.referenced().into_iter().cloned().collect();
        old.sort();
        assert_eq!(second.chunk_deletes, old);
        assert_eq!(second.chunk_puts.len(), 1);
        assert_eq!(second.stats.chunks_deleted, old.len());
    }

    #[tokio::test]
    async fn test_empty_buffer() {
        let first = diff_and_write("doc", &[7u8; 200], None, &small(), &Blake3Hasher)
            .await
            .unwrap();
        let second = diff_and_write("doc", &[], Some(&first.meta), &small(), &Blake3Hasher)
            .await
            .unwrap();

        assert!(second.meta.ordered_hashes.is_empty());
        assert_eq!(second.meta.total_length, 0);
        assert_eq!(second.chunk_deletes.len(), 1);
    }

    #[tokio::test]
    async fn test_to_ops_layout() {
        let ws = diff_and_write("doc", b"hello world", None, &small(), &Blake3Hasher)
            .await
            .unwrap();
        let ops = ws.to_ops(&KeyLayout::new("p")).unwrap();

        let hash = &ws.meta.ordered_hashes[0];
        assert_eq!(
            ops[0],
            WriteOp::put(format!("p/doc/chunk/{hash}"), "aGVsbG8gd29ybGQ=")
        );
        assert_eq!(ops[1].key(), "p/doc/meta");
    }

    #[tokio::test]
    async fn test_bad_inputs_rejected() {
        let err = diff_and_write("a/b", b"x", None, &small(), &Blake3Hasher)
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkDocError::InvalidName { .. }));

        let err = diff_and_write("doc", b"x", None, &ChunkingConfig::new(64, 64, 2048), &Blake3Hasher)
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkDocError::Configuration(_)));
    }
}

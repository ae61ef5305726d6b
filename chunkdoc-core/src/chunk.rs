//! Chunk pipeline and reconstruction
//!
//! `chunk` splits a buffer with the rolling-hash chunker and addresses every
//! piece by content. `unchunk` is the inverse: the ordered hash list plus a
//! hash-to-bytes map rebuild the exact original buffer.

use crate::chunker::RollingHashChunker;
use crate::config::ChunkingConfig;
use crate::error::{ChunkDocError, Result};
use crate::hash::{ChunkHash, ChunkHasher};
use bytes::{Bytes, BytesMut};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Result of chunking one buffer
///
/// `ordered_hashes` lists every chunk in buffer order, repeats included.
/// `chunks` holds the bytes of each distinct hash once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSet {
    pub chunks: HashMap<ChunkHash, Bytes>,
    pub ordered_hashes: Vec<ChunkHash>,
}

impl ChunkSet {
    /// Length of the buffer this set was built from
    pub fn total_len(&self) -> usize {
        self.ordered_hashes
            .iter()
            .filter_map(|h| self.chunks.get(h))
            .map(Bytes::len)
            .sum()
    }

    /// Distinct hashes in order of first appearance
    pub fn distinct_in_order(&self) -> impl Iterator<Item = &ChunkHash> {
        let mut seen = HashSet::with_capacity(self.chunks.len());
        self.ordered_hashes.iter().filter(move |h| seen.insert(*h))
    }

    /// Rebuild the source buffer
    pub fn unchunk(&self) -> Result<Bytes> {
        unchunk(&self.chunks, &self.ordered_hashes, self.total_len())
    }
}

/// Split `source` into content-defined chunks and hash each one.
///
/// Invalid parameters fail before any byte is scanned.
pub async fn chunk<H>(config: &ChunkingConfig, source: &[u8], hasher: &H) -> Result<ChunkSet>
where
    H: ChunkHasher + ?Sized,
{
    let chunker = RollingHashChunker::new(config)?;
    chunk_with(&chunker, source, hasher).await
}

/// Same as [`chunk`] with an already validated chunker
pub async fn chunk_with<H>(
    chunker: &RollingHashChunker,
    source: &[u8],
    hasher: &H,
) -> Result<ChunkSet>
where
    H: ChunkHasher + ?Sized,
{
    let mut set = ChunkSet::default();
    let mut offset = 0usize;

    while offset < source.len() {
        let size = chunker.cut(source, offset);
        if size == 0 {
            return Err(ChunkDocError::Integrity(format!(
                "zero-length chunk at offset {offset}"
            )));
        }
        if size > chunker.maximum() {
            return Err(ChunkDocError::Integrity(format!(
                "chunk of {size} bytes exceeds maximum {}",
                chunker.maximum()
            )));
        }
        let end = offset
            .checked_add(size)
            .filter(|end| *end <= source.len())
            .ok_or_else(|| {
                ChunkDocError::Integrity(format!(
                    "chunk {offset}+{size} runs past source length {}",
                    source.len()
                ))
            })?;

        let data = &source[offset..end];
        let hash = hasher.hash(data).await?;
        set.chunks
            .entry(hash.clone())
            .or_insert_with(|| Bytes::copy_from_slice(data));
        set.ordered_hashes.push(hash);
        offset = end;
    }

    trace!(
        bytes = source.len(),
        chunks = set.ordered_hashes.len(),
        distinct = set.chunks.len(),
        "Chunked buffer"
    );
    Ok(set)
}

/// Reassemble a buffer from its ordered chunk hashes.
///
/// Every hash is resolved and the lengths checked before the output is
/// allocated, so a missing chunk never yields a partial buffer.
pub fn unchunk(
    chunks: &HashMap<ChunkHash, Bytes>,
    ordered_hashes: &[ChunkHash],
    total_length: usize,
) -> Result<Bytes> {
    let mut resolved = Vec::with_capacity(ordered_hashes.len());
    let mut length = 0usize;
    for hash in ordered_hashes {
        let data = chunks.get(hash).ok_or_else(|| ChunkDocError::MissingChunk {
            hash: hash.to_string(),
        })?;
        length = length.checked_add(data.len()).ok_or_else(|| {
            ChunkDocError::Integrity("chunk lengths overflow".to_string())
        })?;
        resolved.push(data);
    }

    if length != total_length {
        return Err(ChunkDocError::Integrity(format!(
            "chunks cover {length} bytes, expected {total_length}"
        )));
    }

    let mut out = BytesMut::with_capacity(total_length);
    for data in resolved {
        out.extend_from_slice(data);
    }
    Ok(out.freeze())
}

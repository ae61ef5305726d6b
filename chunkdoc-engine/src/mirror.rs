//! Read-side replica of one document
//!
//! A mirror follows the committed operations under a document's key prefix
//! and can rebuild the current bytes at any point without touching the
//! store.

use crate::keys::{validate_name, KeyKind, KeyLayout};
use crate::meta::ChunkMeta;
use crate::read::{read_chunks, read_meta};
use base64::Engine;
use bytes::Bytes;
use chunkdoc_core::error::{ChunkDocError, Result};
use chunkdoc_core::{unchunk, ChunkHash};
use chunkdoc_storage::{KvStore, WriteOp};
use std::collections::HashMap;
use tracing::trace;

/// Decoded op waiting to be applied
enum Change {
    Meta(Option<ChunkMeta>),
    PutChunk(ChunkHash, Bytes),
    RemoveChunk(ChunkHash),
}

/// Local copy of one document's meta and chunks
#[derive(Debug, Clone)]
pub struct ChunkMirror {
    name: String,
    layout: KeyLayout,
    meta: Option<ChunkMeta>,
    chunks: HashMap<ChunkHash, Bytes>,
}

impl ChunkMirror {
    /// Empty mirror for `name`
    pub fn new(name: impl Into<String>, layout: KeyLayout) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            layout,
            meta: None,
            chunks: HashMap::new(),
        })
    }

    /// Mirror seeded from the store's current state
    pub async fn load<S>(store: &S, name: impl Into<String>, layout: KeyLayout) -> Result<Self>
    where
        S: KvStore + ?Sized,
    {
        let mut mirror = Self::new(name, layout)?;
        mirror.meta = read_meta(store, &mirror.layout, &mirror.name).await?;
        mirror.chunks = read_chunks(store, &mirror.layout, &mirror.name).await?;
        Ok(mirror)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> Option<&ChunkMeta> {
        self.meta.as_ref()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Apply one committed operation; `false` if it belongs to another
    /// document
    pub fn apply(&mut self, op: &WriteOp) -> Result<bool> {
        Ok(self.apply_all([op])? == 1)
    }

    /// Apply a committed batch in order; returns how many ops matched
    ///
    /// Every op is decoded before any of them is applied, so an error
    /// leaves the mirror as it was before the batch.
    pub fn apply_all<'a>(&mut self, ops: impl IntoIterator<Item = &'a WriteOp>) -> Result<usize> {
        let mut staged = Vec::new();
        for op in ops {
            if let Some(change) = self.stage(op)? {
                trace!(name = %self.name, key = op.key(), "Mirror staged op");
                staged.push(change);
            }
        }

        let applied = staged.len();
        for change in staged {
            match change {
                Change::Meta(meta) => self.meta = meta,
                Change::PutChunk(hash, data) => {
                    self.chunks.insert(hash, data);
                }
                Change::RemoveChunk(hash) => {
                    self.chunks.remove(&hash);
                }
            }
        }
        Ok(applied)
    }

    fn stage(&self, op: &WriteOp) -> Result<Option<Change>> {
        let kind = match self.layout.parse(op.key()) {
            Some(kind) if kind.name() == self.name => kind,
            _ => return Ok(None),
        };

        let change = match (kind, op) {
            (KeyKind::Meta { .. }, WriteOp::Put { value, .. }) => {
                Change::Meta(Some(ChunkMeta::from_bytes(value)?))
            }
            (KeyKind::Meta { .. }, WriteOp::Delete { .. }) => Change::Meta(None),
            (KeyKind::Chunk { hash, .. }, WriteOp::Put { value, .. }) => {
                let data = base64::engine::general_purpose::STANDARD.decode(value)?;
                Change::PutChunk(ChunkHash::new(hash), Bytes::from(data))
            }
            (KeyKind::Chunk { hash, .. }, WriteOp::Delete { .. }) => {
                Change::RemoveChunk(ChunkHash::new(hash))
            }
        };
        Ok(Some(change))
    }

    /// Rebuild the current bytes; `None` when the document does not exist
    pub fn snapshot(&self) -> Result<Option<Bytes>> {
        let Some(meta) = &self.meta else {
            return Ok(None);
        };
        let total = usize::try_from(meta.total_length).map_err(|_| {
            ChunkDocError::Integrity(format!("total length {} exceeds usize", meta.total_length))
        })?;
        unchunk(&self.chunks, &meta.ordered_hashes, total).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_and_write;
    use chunkdoc_core::{Blake3Hasher, ChunkingConfig, FnHasher};

    async fn ops_for(data: &[u8], prior: Option<&ChunkMeta>) -> (ChunkMeta, Vec<WriteOp>) {
        let ws = diff_and_write("doc", data, prior, &ChunkingConfig::default(), &Blake3Hasher)
            .await
            .unwrap();
        let ops = ws.to_ops(&KeyLayout::default()).unwrap();
        (ws.meta, ops)
    }

    #[tokio::test]
    async fn test_follows_generations() {
        let mut mirror = ChunkMirror::new("doc", KeyLayout::default()).unwrap();
        assert!(mirror.snapshot().unwrap().is_none());

        let v1: Vec<u8> = (0..6000u32).map(|i| (i * 7 % 251) as u8).collect();
        let (meta, ops) = ops_for(&v1, None).await;
        assert_eq!(mirror.apply_all(&ops).unwrap(), ops.len());
        assert_eq!(mirror.snapshot().unwrap().unwrap(), v1);

        let mut v2 = v1.clone();
        v2.truncate(1000);
        let (meta2, ops) = ops_for(&v2, Some(&meta)).await;
        mirror.apply_all(&ops).unwrap();
        assert_eq!(mirror.snapshot().unwrap().unwrap(), v2);
        assert_eq!(mirror.meta(), Some(&meta2));
        assert_eq!(mirror.chunk_count(), meta2.referenced().len());
    }

    #[test]
    fn test_ignores_other_documents() {
        let mut mirror = ChunkMirror::new("doc", KeyLayout::default()).unwrap();
        let foreign = [
            WriteOp::put("chunkdoc/doc2/chunk/abc", "aGk="),
            WriteOp::put("other/doc/meta", "{}"),
            WriteOp::delete("chunkdoc/doc/unknown"),
        ];
        assert_eq!(mirror.apply_all(&foreign).unwrap(), 0);
        assert_eq!(mirror.chunk_count(), 0);
    }

    #[test]
    fn test_missing_chunk_surfaces() {
        let mut mirror = ChunkMirror::new("doc", KeyLayout::default()).unwrap();
        let meta = ChunkMeta {
            ordered_hashes: vec![ChunkHash::from("gone")],
            total_length: 4,
            write_count: 1,
        };
        mirror
            .apply(&WriteOp::put("chunkdoc/doc/meta", meta.to_bytes().unwrap()))
            .unwrap();

        let err = mirror.snapshot().unwrap_err();
        assert!(matches!(err, ChunkDocError::MissingChunk { ref hash } if hash == "gone"));
    }

    #[tokio::test]
    async fn test_hash_with_slashes() {
        let hasher =
            FnHasher(|data: &[u8]| ChunkHash::new(format!("ab/{}", Blake3Hasher::digest(data))));
        let data: Vec<u8> = (0..3000u32).map(|i| (i * 13 % 241) as u8).collect();
        let ws = diff_and_write("doc", &data, None, &ChunkingConfig::default(), &hasher)
            .await
            .unwrap();
        let ops = ws.to_ops(&KeyLayout::default()).unwrap();

        let mut mirror = ChunkMirror::new("doc", KeyLayout::default()).unwrap();
        assert_eq!(mirror.apply_all(&ops).unwrap(), ops.len());
        assert_eq!(mirror.chunk_count(), ws.meta.referenced().len());
        assert_eq!(mirror.snapshot().unwrap().unwrap(), data);

        // deletes address the same slashed hashes
        let deletes: Vec<WriteOp> = ws
            .meta
            .referenced()
            .into_iter()
            .map(|h| WriteOp::delete(KeyLayout::default().chunk_key("doc", h)))
            .collect();
        mirror.apply_all(&deletes).unwrap();
        assert_eq!(mirror.chunk_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_batch_changes_nothing() {
        let v1: Vec<u8> = (0..4000u32).map(|i| (i * 31 % 253) as u8).collect();
        let (meta, ops) = ops_for(&v1, None).await;
        let mut mirror = ChunkMirror::new("doc", KeyLayout::default()).unwrap();
        mirror.apply_all(&ops).unwrap();

        let v2: Vec<u8> = v1.iter().rev().copied().collect();
        let (_, mut ops) = ops_for(&v2, Some(&meta)).await;
        ops.insert(ops.len() - 1, WriteOp::put("chunkdoc/doc/chunk/bad", "not base64!"));

        assert!(mirror.apply_all(&ops).is_err());
        assert_eq!(mirror.meta(), Some(&meta));
        assert_eq!(mirror.chunk_count(), meta.referenced().len());
        assert_eq!(mirror.snapshot().unwrap().unwrap(), v1);
    }
}

//! Read path: meta lookup and chunk map loading

use crate::keys::KeyLayout;
use crate::meta::ChunkMeta;
use base64::Engine;
use bytes::Bytes;
use chunkdoc_core::error::{ChunkDocError, Result};
use chunkdoc_core::ChunkHash;
use chunkdoc_storage::KvStore;
use futures::TryStreamExt;
use std::collections::HashMap;

/// Fetch and parse a document's meta record
pub async fn read_meta<S>(store: &S, layout: &KeyLayout, name: &str) -> Result<Option<ChunkMeta>>
where
    S: KvStore + ?Sized,
{
    match store.get(&layout.meta_key(name)).await? {
        Some(raw) => Ok(Some(ChunkMeta::from_bytes(&raw)?)),
        None => Ok(None),
    }
}

/// Scan every stored chunk of a document into a hash-to-bytes map
pub async fn read_chunks<S>(
    store: &S,
    layout: &KeyLayout,
    name: &str,
) -> Result<HashMap<ChunkHash, Bytes>>
where
    S: KvStore + ?Sized,
{
    let prefix = layout.chunk_prefix(name);
    let engine = base64::engine::general_purpose::STANDARD;
    let mut stream = store.scan_prefix(&prefix);
    let mut chunks = HashMap::new();

    while let Some((key, value)) = stream.try_next().await? {
        let hash = key.strip_prefix(prefix.as_str()).ok_or_else(|| {
            ChunkDocError::Storage(format!("scan for {prefix} returned {key}"))
        })?;
        chunks.insert(ChunkHash::new(hash), Bytes::from(engine.decode(&value)?));
    }

    Ok(chunks)
}

//! Chunk meta record
//!
//! The meta record is the only thing needed, besides the chunks it points
//! at, to rebuild a stored buffer. It is rewritten on every update.

use bytes::Bytes;
use chunkdoc_core::error::Result;
use chunkdoc_core::ChunkHash;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current generation of a stored buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Chunk addresses in buffer order, repeats included
    pub ordered_hashes: Vec<ChunkHash>,

    /// Length of the reconstructed buffer in bytes
    pub total_length: u64,

    /// Number of updates written so far, this one included
    pub write_count: u64,
}

impl ChunkMeta {
    /// Distinct chunk addresses referenced by this generation
    pub fn referenced(&self) -> HashSet<&ChunkHash> {
        self.ordered_hashes.iter().collect()
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

//! chunkdoc core library
//!
//! Content-defined chunking for large, frequently rewritten buffers.
//! This crate provides:
//! - A rolling-hash chunker with bounded, content-determined cut points
//! - The chunk/hash pipeline and its inverse reconstruction
//! - The injectable content-address capability (BLAKE3 by default)
//! - Common configuration and error handling

pub mod chunk;
pub mod chunker;
pub mod config;
pub mod error;
pub mod hash;

pub use chunk::{chunk, chunk_with, unchunk, ChunkSet};
pub use chunker::RollingHashChunker;
pub use config::ChunkingConfig;
pub use error::{ChunkDocError, Result};
pub use hash::{Blake3Hasher, ChunkHash, ChunkHasher, FnHasher};

/// Default chunk size bounds, sized for update logs of a few KB to a few MB
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 256;
pub const DEFAULT_AVERAGE_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2048;

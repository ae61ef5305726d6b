//! Content addressing for chunks
//!
//! The hash function is a capability handed to the pipeline at the call
//! site. `Blake3Hasher` is the default; `FnHasher` adapts any synchronous
//! function, which is mostly useful in tests.
//!
//! Hashes are trusted to be collision-free. Two chunks with the same address
//! are assumed to hold the same bytes and nothing re-checks this.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Content address of a chunk
///
/// Opaque string form so any hasher can be plugged in; it is used verbatim
/// as the last segment of a chunk's store key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkHash(String);

impl ChunkHash {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Base58 encoding of a raw digest
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(bs58::encode(digest).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "ChunkHash({})", short)
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChunkHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for ChunkHash {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Async hash capability: chunk bytes to content address
///
/// Implementations must be deterministic; the same bytes must always map
/// to the same address or chunk reuse silently stops working.
pub trait ChunkHasher: Send + Sync {
    fn hash<'a>(
        &'a self,
        chunk: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<ChunkHash>> + Send + 'a>>;
}

/// BLAKE3 digest, base58 encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl Blake3Hasher {
    pub fn digest(data: &[u8]) -> ChunkHash {
        ChunkHash::from_digest(blake3::hash(data).as_bytes())
    }
}

impl ChunkHasher for Blake3Hasher {
    fn hash<'a>(
        &'a self,
        chunk: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<ChunkHash>> + Send + 'a>> {
        Box::pin(async move { Ok(Self::digest(chunk)) })
    }
}

/// Wrapper to use a synchronous function as a hasher
pub struct FnHasher<F>(pub F);

impl<F> ChunkHasher for FnHasher<F>
where
    F: Fn(&[u8]) -> ChunkHash + Send + Sync,
{
    fn hash<'a>(
        &'a self,
        chunk: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<ChunkHash>> + Send + 'a>> {
        Box::pin(async move { Ok((self.0)(chunk)) })
    }
}

impl<H: ChunkHasher + ?Sized> ChunkHasher for std::sync::Arc<H> {
    fn hash<'a>(
        &'a self,
        chunk: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<ChunkHash>> + Send + 'a>> {
        (**self).hash(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blake3_deterministic() {
        let a = Blake3Hasher.hash(b"hello world").await.unwrap();
        let b = Blake3Hasher.hash(b"hello world").await.unwrap();
        let c = Blake3Hasher.hash(b"hello worle").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Blake3Hasher::digest(b"hello world"));
    }

    #[test]
    fn test_base58_has_no_separator() {
        // store keys rely on addresses never containing '/'
        let hash = Blake3Hasher::digest(&[0xffu8; 4096]);
        assert!(!hash.as_str().contains('/'));
        assert!(hash.as_str().len() >= 43);
    }

    #[tokio::test]
    async fn test_fn_hasher() {
        let hasher = FnHasher(|data: &[u8]| ChunkHash::new(format!("len-{}", data.len())));
        assert_eq!(hasher.hash(b"abc").await.unwrap().as_str(), "len-3");
    }

    #[test]
    fn test_serde_transparent() {
        let hash = ChunkHash::from("abc");
        assert_eq!(serde_json::to_string(&hash).unwrap(), "\"abc\"");
    }
}

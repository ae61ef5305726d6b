//! Store key layout
//!
//! Every document lives under its own namespace:
//!
//! ```text
//! {prefix}/{name}/meta           ordered hashes, length, write count (JSON)
//! {prefix}/{name}/chunk/{hash}   chunk bytes (base64)
//! ```
//!
//! Names may not contain `/`, otherwise one document's chunk prefix could
//! cover another document's keys.

use chunkdoc_core::error::{ChunkDocError, Result};
use chunkdoc_core::ChunkHash;

pub const DEFAULT_KEY_PREFIX: &str = "chunkdoc";

/// What a store key refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind<'a> {
    Meta { name: &'a str },
    Chunk { name: &'a str, hash: &'a str },
}

impl<'a> KeyKind<'a> {
    /// Document the key belongs to
    pub fn name(&self) -> &'a str {
        match self {
            KeyKind::Meta { name } | KeyKind::Chunk { name, .. } => *name,
        }
    }
}

/// Key builder for a fixed top-level prefix
#[derive(Debug, Clone)]
pub struct KeyLayout {
    prefix: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefix covering every key of one document
    pub fn document_prefix(&self, name: &str) -> String {
        format!("{}/{}/", self.prefix, name)
    }

    pub fn meta_key(&self, name: &str) -> String {
        format!("{}/{}/meta", self.prefix, name)
    }

    pub fn chunk_prefix(&self, name: &str) -> String {
        format!("{}/{}/chunk/", self.prefix, name)
    }

    pub fn chunk_key(&self, name: &str, hash: &ChunkHash) -> String {
        format!("{}/{}/chunk/{}", self.prefix, name, hash)
    }

    /// Classify a key produced by this layout; `None` for foreign keys
    pub fn parse<'a>(&self, key: &'a str) -> Option<KeyKind<'a>> {
        let rest = key.strip_prefix(self.prefix.as_str())?.strip_prefix('/')?;
        let (name, tail) = rest.split_once('/')?;
        if name.is_empty() {
            return None;
        }
        if tail == "meta" {
            return Some(KeyKind::Meta { name });
        }
        // the hash is everything after `chunk/`, slashes included
        let hash = tail.strip_prefix("chunk/")?;
        if hash.is_empty() {
            return None;
        }
        Some(KeyKind::Chunk { name, hash })
    }
}

/// Reject names that would break the key layout
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.contains('/') {
        "must not contain '/'"
    } else {
        return Ok(());
    };
    Err(ChunkDocError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

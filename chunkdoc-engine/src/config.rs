//! Engine configuration

use crate::keys::DEFAULT_KEY_PREFIX;
use chunkdoc_core::ChunkingConfig;
use serde::{Deserialize, Serialize};

/// Default number of writes between forced materializations
pub const DEFAULT_MATERIALIZE_EVERY: u64 = 16;

/// When the accumulated log is decoded and re-encoded
///
/// `every == 0` disables periodic materialization; only writes that carry a
/// validator materialize then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializePolicy {
    #[serde(default = "default_every")]
    pub every: u64,
}

fn default_every() -> u64 {
    DEFAULT_MATERIALIZE_EVERY
}

impl Default for MaterializePolicy {
    fn default() -> Self {
        Self::every(DEFAULT_MATERIALIZE_EVERY)
    }
}

impl MaterializePolicy {
    pub fn every(every: u64) -> Self {
        Self { every }
    }

    pub fn never() -> Self {
        Self { every: 0 }
    }

    /// Whether the write that will carry `next_write_count` materializes
    pub fn fires(&self, next_write_count: u64) -> bool {
        self.every != 0 && next_write_count % self.every == 0
    }
}

/// Document engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub materialize: MaterializePolicy,

    /// Leading segment of every store key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            materialize: MaterializePolicy::default(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl EngineConfig {
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_materialize(mut self, policy: MaterializePolicy) -> Self {
        self.materialize = policy;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

//! chunkdoc document engine
//!
//! Stores a growing update log as content-defined chunks in a key-value
//! store, rewriting only the chunks an update actually changes:
//! - `diff` proposes chunk puts/deletes against the previous generation
//! - `lifecycle` merges updates, materializes periodically, and commits
//! - `mirror` replays committed operations into a read-side replica
//! - `codec` is a reference update format (append-only key/value log)

pub mod codec;
pub mod config;
pub mod diff;
pub mod keys;
pub mod lifecycle;
pub mod meta;
pub mod metrics;
pub mod mirror;
pub mod read;

pub use codec::{AppendLogCodec, LogDocument, LogEntry, UpdateCodec};
pub use config::{EngineConfig, MaterializePolicy, DEFAULT_MATERIALIZE_EVERY};
pub use diff::{diff_and_write, ReuseStats, WriteSet};
pub use keys::{validate_name, KeyKind, KeyLayout, DEFAULT_KEY_PREFIX};
pub use lifecycle::{DocumentStore, UpdateOutcome, UpdatePlan, Validator};
pub use meta::ChunkMeta;
pub use mirror::ChunkMirror;

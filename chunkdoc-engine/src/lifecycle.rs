//! Update-merge lifecycle
//!
//! Every write merges the incoming update onto the accumulated log, and on
//! some writes materializes it (decode, validate, re-encode) before the
//! result is chunked and diffed against the stored generation:
//!
//! ```text
//! Uninitialized ──first update──▶ Accumulated ──merge──▶ Accumulated
//!                                      ▲                      │
//!                                      └──── Materialized ◀───┘
//!                                   (policy fires or validator given)
//! ```
//!
//! Proposals are pure; only [`DocumentStore::apply_update`] and
//! [`DocumentStore::delete`] touch the store, each with one atomic commit.

use crate::codec::UpdateCodec;
use crate::config::EngineConfig;
use crate::diff::{diff_and_write, ReuseStats, WriteSet};
use crate::keys::{validate_name, KeyLayout};
use crate::meta::ChunkMeta;
use crate::read::{read_chunks, read_meta};
use bytes::Bytes;
use chunkdoc_core::error::{ChunkDocError, Result};
use chunkdoc_core::{unchunk, Blake3Hasher, ChunkHasher, RollingHashChunker};
use chunkdoc_storage::{KvStore, WriteOp};
use futures::TryStreamExt;
use tracing::{debug, info};

/// Accept or reject a materialized document
pub trait Validator<D>: Send + Sync {
    /// `Err(reason)` aborts the write
    fn validate(&self, document: &D) -> std::result::Result<(), String>;
}

impl<D, F> Validator<D> for F
where
    F: Fn(&D) -> std::result::Result<(), String> + Send + Sync,
{
    fn validate(&self, document: &D) -> std::result::Result<(), String> {
        self(document)
    }
}

/// Proposed write for one update, not yet committed
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub write_set: WriteSet,

    /// Whether the log was decoded and re-encoded for this write
    pub materialized: bool,
}

/// Result of a committed update
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub meta: ChunkMeta,
    pub stats: ReuseStats,
    pub materialized: bool,

    /// Number of store operations in the commit
    pub ops: usize,
}

/// Chunked document storage over a key-value store
pub struct DocumentStore<S, C, H = Blake3Hasher> {
    store: S,
    codec: C,
    hasher: H,
    config: EngineConfig,
    layout: KeyLayout,
}

impl<S, C> DocumentStore<S, C, Blake3Hasher>
where
    S: KvStore,
    C: UpdateCodec,
{
    /// Create a store that addresses chunks with BLAKE3
    pub fn new(store: S, codec: C, config: EngineConfig) -> Result<Self> {
        Self::with_hasher(store, codec, Blake3Hasher, config)
    }
}

impl<S, C, H> DocumentStore<S, C, H>
where
    S: KvStore,
    C: UpdateCodec,
    H: ChunkHasher,
{
    /// Create a store with a custom chunk hasher
    ///
    /// Chunking bounds are checked here so a bad config fails at startup
    /// rather than on the first write.
    pub fn with_hasher(store: S, codec: C, hasher: H, config: EngineConfig) -> Result<Self> {
        RollingHashChunker::new(&config.chunking)?;
        if config.key_prefix.is_empty() || config.key_prefix.contains('/') {
            return Err(ChunkDocError::Configuration(format!(
                "key prefix {:?} must be non-empty and contain no '/'",
                config.key_prefix
            )));
        }

        info!(
            prefix = %config.key_prefix,
            average = config.chunking.average,
            materialize_every = config.materialize.every,
            "Document store ready"
        );

        let layout = KeyLayout::new(config.key_prefix.clone());
        Ok(Self {
            store,
            codec,
            hasher,
            config,
            layout,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// Current meta record of `name`
    pub async fn load_meta(&self, name: &str) -> Result<Option<ChunkMeta>> {
        validate_name(name)?;
        read_meta(&self.store, &self.layout, name).await
    }

    /// Meta record plus reconstructed bytes of `name`
    pub async fn load_with_meta(&self, name: &str) -> Result<Option<(ChunkMeta, Bytes)>> {
        let Some(meta) = self.load_meta(name).await? else {
            return Ok(None);
        };

        let chunks = read_chunks(&self.store, &self.layout, name).await?;
        let total = usize::try_from(meta.total_length).map_err(|_| {
            ChunkDocError::Integrity(format!("total length {} exceeds usize", meta.total_length))
        })?;
        let bytes = unchunk(&chunks, &meta.ordered_hashes, total)?;

        Ok(Some((meta, bytes)))
    }

    /// Reconstructed accumulated log of `name`
    pub async fn load(&self, name: &str) -> Result<Option<Bytes>> {
        Ok(self.load_with_meta(name).await?.map(|(_, bytes)| bytes))
    }

    /// Decoded document of `name`
    pub async fn load_document(&self, name: &str) -> Result<Option<C::Document>> {
        match self.load(name).await? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Compute the write for `update` without committing it
    ///
    /// The same stored state and inputs always yield the same plan, so a
    /// transaction that is replayed can call this again.
    pub async fn prepare_update(
        &self,
        name: &str,
        update: &[u8],
        validator: Option<&dyn Validator<C::Document>>,
    ) -> Result<UpdatePlan> {
        let prior = self.load_with_meta(name).await?;
        let next_write_count = prior.as_ref().map_or(0, |(meta, _)| meta.write_count) + 1;

        let accumulated = match &prior {
            None => Bytes::copy_from_slice(update),
            Some((_, bytes)) => self.codec.merge(bytes, update)?,
        };

        let materialized =
            validator.is_some() || self.config.materialize.fires(next_write_count);
        let bytes = if materialized {
            self.materialize(name, &accumulated, validator)?
        } else {
            accumulated
        };

        let write_set = diff_and_write(
            name,
            &bytes,
            prior.as_ref().map(|(meta, _)| meta),
            &self.config.chunking,
            &self.hasher,
        )
        .await?;

        Ok(UpdatePlan {
            write_set,
            materialized,
        })
    }

    fn materialize(
        &self,
        name: &str,
        log: &[u8],
        validator: Option<&dyn Validator<C::Document>>,
    ) -> Result<Bytes> {
        let document = self.codec.decode(log)?;
        if let Some(validator) = validator {
            validator
                .validate(&document)
                .map_err(ChunkDocError::ValidationRejected)?;
        }
        let encoded = self.codec.encode(&document)?;

        debug!(
            name,
            before = log.len(),
            after = encoded.len(),
            "Materialized update log"
        );
        Ok(encoded)
    }

    /// Merge `update` into `name` and commit the result atomically
    pub async fn apply_update(
        &self,
        name: &str,
        update: &[u8],
        validator: Option<&dyn Validator<C::Document>>,
    ) -> Result<UpdateOutcome> {
        let plan = self.prepare_update(name, update, validator).await?;
        let ops = plan.write_set.to_ops(&self.layout)?;
        let op_count = ops.len();

        self.store.commit(ops).await?;

        crate::metrics::record_reuse(&plan.write_set.stats);
        if plan.materialized {
            crate::metrics::record_materialization();
        }

        Ok(UpdateOutcome {
            meta: plan.write_set.meta,
            stats: plan.write_set.stats,
            materialized: plan.materialized,
            ops: op_count,
        })
    }

    /// Remove `name` and all of its chunks; `false` if it did not exist
    pub async fn delete(&self, name: &str) -> Result<bool> {
        if self.load_meta(name).await?.is_none() {
            return Ok(false);
        }

        let mut ops: Vec<WriteOp> = self
            .store
            .scan_prefix(&self.layout.chunk_prefix(name))
            .map_ok(|(key, _)| WriteOp::delete(key))
            .try_collect()
            .await?;
        ops.push(WriteOp::delete(self.layout.meta_key(name)));

        debug!(name, chunks = ops.len() - 1, "Deleting document");
        self.store.commit(ops).await?;
        Ok(true)
    }
}

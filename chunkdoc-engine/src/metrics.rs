//! Reuse and write-volume metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use crate::diff::ReuseStats;
use metrics::{counter, describe_counter};

/// Metric names as constants
pub mod names {
    pub const CHUNKS_WRITTEN: &str = "chunkdoc_chunks_written_total";
    pub const CHUNKS_REUSED: &str = "chunkdoc_chunks_reused_total";
    pub const CHUNKS_DELETED: &str = "chunkdoc_chunks_deleted_total";
    pub const BYTES_WRITTEN: &str = "chunkdoc_bytes_written_total";
    pub const BYTES_REUSED: &str = "chunkdoc_bytes_reused_total";
    pub const MATERIALIZATIONS: &str = "chunkdoc_materializations_total";
}

/// Initialize metric descriptions
pub fn describe_metrics() {
    describe_counter!(names::CHUNKS_WRITTEN, "Chunks written to the store");
    describe_counter!(
        names::CHUNKS_REUSED,
        "Chunks carried over unchanged from the previous generation"
    );
    describe_counter!(
        names::CHUNKS_DELETED,
        "Chunks deleted because no generation references them"
    );
    describe_counter!(names::BYTES_WRITTEN, "Chunk bytes written to the store");
    describe_counter!(names::BYTES_REUSED, "Chunk bytes reused without a write");
    describe_counter!(
        names::MATERIALIZATIONS,
        "Updates that decoded, validated and re-encoded the document"
    );
}

/// Record the outcome of one diff
pub fn record_reuse(stats: &ReuseStats) {
    counter!(names::CHUNKS_WRITTEN).increment(stats.chunks_written as u64);
    counter!(names::CHUNKS_REUSED).increment(stats.chunks_reused as u64);
    counter!(names::CHUNKS_DELETED).increment(stats.chunks_deleted as u64);
    counter!(names::BYTES_WRITTEN).increment(stats.bytes_total - stats.bytes_reused);
    counter!(names::BYTES_REUSED).increment(stats.bytes_reused);
}

pub fn record_materialization() {
    counter!(names::MATERIALIZATIONS).increment(1);
}

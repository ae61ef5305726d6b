//! Benchmarks for store backends
//!
//! Run with: cargo bench --package chunkdoc-storage --bench storage

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chunkdoc_storage::backend::{KvStoreSync, WriteOp};
use chunkdoc_storage::memory::MemoryStore;
use chunkdoc_storage::sled_backend::SledStore;
use chunkdoc_storage::StorageConfig;
use tempfile::TempDir;

/// Generate test data of specified size
fn generate_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// A batch shaped like one document write: chunk puts plus a meta put
fn document_batch(round: u64, chunks: usize, data: &Bytes) -> Vec<WriteOp> {
    let mut ops: Vec<WriteOp> = (0..chunks)
        .map(|i| WriteOp::put(format!("chunkdoc/bench/chunk/{round}-{i}"), data.clone()))
        .collect();
    ops.push(WriteOp::put("chunkdoc/bench/meta", Bytes::from_static(b"{}")));
    ops
}

/// Benchmark atomic batch commits
fn bench_commit(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let sled = SledStore::open(StorageConfig::new(temp_dir.path()).with_flush_on_commit(false))
        .unwrap();
    let memory = MemoryStore::new();
    let data = Bytes::from(generate_data(1024));

    let mut group = c.benchmark_group("commit_batch");

    for chunks in [1usize, 16, 128] {
        group.throughput(Throughput::Bytes((chunks * data.len()) as u64));

        let mut round = 0u64;
        group.bench_with_input(BenchmarkId::new("sled", chunks), &chunks, |b, &chunks| {
            b.iter(|| {
                round += 1;
                sled.commit(black_box(document_batch(round, chunks, &data)))
                    .unwrap()
            })
        });

        let mut round = 0u64;
        group.bench_with_input(BenchmarkId::new("memory", chunks), &chunks, |b, &chunks| {
            b.iter(|| {
                round += 1;
                memory
                    .commit(black_box(document_batch(round, chunks, &data)))
                    .unwrap()
            })
        });
    }

    group.finish();
}

/// Benchmark prefix scans over one document's chunks
fn bench_scan_prefix(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let sled = SledStore::open(StorageConfig::new(temp_dir.path()).with_flush_on_commit(false))
        .unwrap();
    let data = Bytes::from(generate_data(1024));

    sled.commit(document_batch(0, 1024, &data)).unwrap();
    sled.commit(vec![WriteOp::put("chunkdoc/other/chunk/x", data.clone())])
        .unwrap();

    let mut group = c.benchmark_group("scan_prefix");
    group.throughput(Throughput::Bytes(1024 * data.len() as u64));
    group.bench_function("sled_1024_chunks", |b| {
        b.iter(|| black_box(sled.scan_prefix("chunkdoc/bench/chunk/").unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_commit, bench_scan_prefix);
criterion_main!(benches);

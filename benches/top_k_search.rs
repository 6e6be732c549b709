use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docdesk::index::{top_k, IndexHandle, IndexManifest, StoredChunk};

const DIMS: usize = 1536;

/// Deterministic pseudo-random vector.
fn vector(seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..DIMS)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / u32::MAX as f32) - 0.25
        })
        .collect()
}

fn handle(chunks: usize) -> IndexHandle {
    let stored = (0..chunks)
        .map(|i| StoredChunk {
            ordinal: i as u32,
            page: 1,
            text: format!("chunk {}", i),
            vector: vector(i as u64),
        })
        .collect();
    let manifest = IndexManifest {
        name: "Bench".to_string(),
        source_path: "/docs/Bench.pdf".to_string(),
        source_hash: String::new(),
        chunk_count: chunks as u32,
        dimensions: DIMS as u32,
        embedding_model: "bench".to_string(),
        chunk_size: 1000,
        chunk_overlap: 200,
        created_at: "2026-01-01T00:00:00Z".to_string(),
    };
    IndexHandle::new(manifest, stored)
}

fn bench_top_k(c: &mut Criterion) {
    let query = vector(u64::MAX);
    let mut group = c.benchmark_group("top_k");
    for chunks in [100usize, 1_000, 5_000] {
        let vectors: Vec<Vec<f32>> = (0..chunks).map(|i| vector(i as u64)).collect();
        group.bench_with_input(BenchmarkId::new("raw", chunks), &vectors, |b, vectors| {
            b.iter(|| top_k(black_box(&query), vectors.iter().map(|v| v.as_slice()), 3))
        });

        let index = handle(chunks);
        group.bench_with_input(BenchmarkId::new("handle", chunks), &index, |b, index| {
            b.iter(|| index.search(black_box(&query), 3))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_top_k);
criterion_main!(benches);

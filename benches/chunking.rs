use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use docrag::chunker::{ChunkingConfig, chunk_text};
use docrag::index::FlatIndex;

/// Generate a document with a predictable word count
fn synthetic_document(word_count: usize) -> String {
    (0..word_count)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_chunk_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_text");

    let config = ChunkingConfig::default();
    for word_count in [1_000, 10_000, 100_000] {
        let text = synthetic_document(word_count);

        group.bench_with_input(
            BenchmarkId::new("default_config", word_count),
            &text,
            |b, text| {
                b.iter(|| chunk_text(text, &config).expect("chunking should succeed"));
            },
        );
    }

    // Heavy overlap multiplies the number of windows produced
    let overlapping = ChunkingConfig {
        chunk_size: 500,
        overlap: 450,
    };
    for word_count in [10_000, 100_000] {
        let text = synthetic_document(word_count);

        group.bench_with_input(
            BenchmarkId::new("heavy_overlap", word_count),
            &text,
            |b, text| {
                b.iter(|| chunk_text(text, &overlapping).expect("chunking should succeed"));
            },
        );
    }

    group.finish();
}

fn bench_index_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_search");

    const DIMENSION: usize = 768;

    for vector_count in [100, 1_000, 10_000] {
        let mut index = FlatIndex::new();
        let vectors: Vec<Vec<f32>> = (0..vector_count)
            .map(|i| {
                (0..DIMENSION)
                    .map(|d| ((i * 31 + d * 7) % 97) as f32 / 97.0)
                    .collect()
            })
            .collect();
        index.insert(vectors).expect("insertion should succeed");

        let query: Vec<f32> = (0..DIMENSION).map(|d| (d % 13) as f32 / 13.0).collect();

        group.bench_with_input(
            BenchmarkId::new("top_4", vector_count),
            &index,
            |b, index| {
                b.iter(|| index.search(&query, 4).expect("search should succeed"));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_text, bench_index_search);
criterion_main!(benches);

#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests for the retrieval pipeline using a deterministic
// embedder, suitable for CI.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use docrag::Result;
use docrag::chunker::ChunkingConfig;
use docrag::embeddings::Embedder;
use docrag::store::RetrievalStore;

const MOCK_DIMENSION: usize = 16;

/// Hash-seeded embedder: identical text always produces the identical
/// vector, so exact-text queries land at distance zero.
struct MockEmbedder;

impl Embedder for MockEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                let mut state = hasher.finish() | 1;
                (0..MOCK_DIMENSION)
                    .map(|_| {
                        state = state
                            .wrapping_mul(6364136223846793005)
                            .wrapping_add(1442695040888963407);
                        ((state >> 33) as f32 / u32::MAX as f32) - 0.5
                    })
                    .collect()
            })
            .collect())
    }
}

fn store_with(chunk_size: usize, overlap: usize) -> RetrievalStore {
    RetrievalStore::new(
        Arc::new(MockEmbedder),
        ChunkingConfig {
            chunk_size,
            overlap,
        },
    )
}

#[test]
fn ingest_then_query_round_trip() {
    let store = store_with(2, 1);
    store
        .add_text("alpha beta gamma delta epsilon")
        .expect("ingestion should succeed");

    let results = store
        .query("gamma delta", 1)
        .expect("query should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "gamma delta");
    assert_eq!(results[0].distance, 0.0);
}

#[test]
fn multiple_documents_accumulate() {
    let store = store_with(50, 10);

    let first = store
        .add_text("the quick brown fox jumps over the lazy dog")
        .expect("ingestion should succeed");
    let second = store
        .add_text("pack my box with five dozen liquor jugs")
        .expect("ingestion should succeed");

    assert_eq!(
        store.chunk_count().expect("can read store"),
        first + second
    );
}

#[test]
fn later_chunks_stay_retrievable_by_exact_text() {
    let store = store_with(3, 1);

    store
        .add_text("one two three four five six")
        .expect("ingestion should succeed");
    store
        .add_text("seven eight nine ten eleven twelve")
        .expect("ingestion should succeed");

    // An exact chunk from the second document must come back first with
    // distance zero, which only holds if positions never drifted
    let results = store
        .query("seven eight nine", 1)
        .expect("query should succeed");
    assert_eq!(results[0].text, "seven eight nine");
    assert_eq!(results[0].distance, 0.0);
}

#[test]
fn top_k_capped_at_store_size() {
    let store = store_with(2, 0);
    store
        .add_text("a b c d e f")
        .expect("ingestion should succeed");

    let results = store.query("a b", 50).expect("query should succeed");
    assert_eq!(results.len(), 3);

    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn query_before_any_ingestion() {
    let store = store_with(500, 100);
    let results = store
        .query("anything at all", 4)
        .expect("query should succeed");
    assert!(results.is_empty());
}

#[test]
fn reset_then_query_is_empty() {
    let store = store_with(2, 1);
    store
        .add_text("alpha beta gamma")
        .expect("ingestion should succeed");

    store.reset().expect("reset should succeed");

    assert_eq!(store.chunk_count().expect("can read store"), 0);
    let results = store
        .query("alpha beta", 4)
        .expect("query should succeed");
    assert!(results.is_empty());
}

#[test]
fn queries_are_deterministic() {
    let store = store_with(2, 1);
    store
        .add_text("alpha beta gamma delta epsilon zeta eta theta")
        .expect("ingestion should succeed");

    let first = store.query("delta epsilon", 3).expect("query should succeed");
    let second = store.query("delta epsilon", 3).expect("query should succeed");
    assert_eq!(first, second);
}

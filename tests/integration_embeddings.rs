#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// HTTP-level tests for the Ollama embedding client against a mock server.
// The client is blocking, so requests run on a blocking task while the
// mock server lives on the tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docrag::chunker::ChunkingConfig;
use docrag::config::OllamaConfig;
use docrag::embeddings::{Embedder, OllamaClient};
use docrag::store::RetrievalStore;

fn client_for(server: &MockServer) -> OllamaClient {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "127.0.0.1".to_string(),
        port: server.address().port(),
        embedding_model: "nomic-embed-text:latest".to_string(),
        batch_size: 2,
    };

    OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(5))
        .with_retry_attempts(1)
}

#[tokio::test]
async fn embed_batch_parses_server_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["first".to_string(), "second".to_string()];

    let embeddings = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic")
        .expect("embedding should succeed");

    assert_eq!(embeddings, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
}

#[tokio::test]
async fn embed_batch_splits_into_configured_batches() {
    let server = MockServer::start().await;

    // batch_size is 2, so three texts become two requests
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0], [0.0, 1.0]]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["c"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 1.0]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let embeddings = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic")
        .expect("embedding should succeed");

    assert_eq!(embeddings.len(), 3);
    assert_eq!(embeddings[2], vec![1.0, 1.0]);
}

#[tokio::test]
async fn count_mismatch_is_an_embedding_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 2.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["first".to_string(), "second".to_string()];

    let result = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic");

    assert!(result.is_err());
    let message = result.expect_err("should be an error").to_string();
    assert!(message.contains("Mismatch"), "unexpected error: {message}");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_attempts(3);
    let texts = vec!["text".to_string()];

    let result = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic");

    assert!(result.is_err());
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.5, 0.5]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_attempts(3);
    let texts = vec!["text".to_string()];

    let embeddings = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic")
        .expect("embedding should succeed after retry");

    assert_eq!(embeddings, vec![vec![0.5, 0.5]]);
}

#[tokio::test]
async fn list_models_parses_tags_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "nomic-embed-text:latest", "size": 274_302_450_u64, "digest": "abc123"},
                {"name": "deepseek-r1:8b"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let models = tokio::task::spawn_blocking(move || client.list_models())
        .await
        .expect("task should not panic")
        .expect("listing should succeed");

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "nomic-embed-text:latest");
    assert_eq!(models[0].size, Some(274_302_450));
    assert_eq!(models[1].size, None);
}

#[tokio::test]
async fn health_check_requires_configured_model() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "some-other-model:latest"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let result = tokio::task::spawn_blocking(move || client.health_check())
        .await
        .expect("task should not panic");

    assert!(result.is_err(), "health check should fail without the model");
}

#[tokio::test]
async fn store_ingests_through_http_embedder() {
    let server = MockServer::start().await;

    // Three overlapping chunks from one document, then the query
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "input": ["alpha beta", "beta gamma"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.0, 0.0], [3.0, 4.0]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["gamma"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[6.0, 8.0]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["beta gamma"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[3.0, 4.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let store = RetrievalStore::new(
        Arc::new(client),
        ChunkingConfig {
            chunk_size: 2,
            overlap: 1,
        },
    );

    let results = tokio::task::spawn_blocking(move || {
        store.add_text("alpha beta gamma")?;
        store.query("beta gamma", 2)
    })
    .await
    .expect("task should not panic")
    .expect("query should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "beta gamma");
    assert_eq!(results[0].distance, 0.0);
    // (0,0) and (6,8) are both 25 from (3,4); the earlier chunk wins the tie
    assert_eq!(results[1].text, "alpha beta");
    assert_eq!(results[1].distance, 25.0);
}

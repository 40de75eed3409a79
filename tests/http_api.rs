#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// HTTP contract tests against a server bound to an ephemeral port

use async_trait::async_trait;
use rag_qa::answer::{FAILURE_ANSWER, LOW_CONFIDENCE_ANSWER, UPLOAD_FIRST_ANSWER};
use rag_qa::config::ServerConfig;
use rag_qa::embeddings::{ChunkingConfig, Embedder, HashEmbedder, Vector};
use rag_qa::llm::CompletionClient;
use rag_qa::retrieval::RetrievalConfig;
use rag_qa::server::{HEALTH_MESSAGE, app_router};
use rag_qa::service::RagService;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct CountingClient {
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for CountingClient {
    async fn complete(&self, _system: &str, user: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Answer based on: {}", user))
    }
}

struct BrokenClient;

#[async_trait]
impl CompletionClient for BrokenClient {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("connection reset"))
    }
}

/// Only understands the word "cat", so anything else scores zero
struct CatEmbedder;

impl Embedder for CatEmbedder {
    fn embed(&self, text: &str) -> Vector {
        vec![text.matches("cat").count() as f32, 0.0]
    }

    fn dimension(&self) -> usize {
        2
    }
}

async fn spawn_server(
    embedder: Arc<dyn Embedder>,
    client: Arc<dyn CompletionClient>,
) -> (String, tokio::task::JoinHandle<()>) {
    let service = Arc::new(RagService::new(
        embedder,
        client,
        ChunkingConfig::default(),
        RetrievalConfig::default(),
    ));
    let app = app_router(service, &ServerConfig::default()).expect("router should build");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn post_json(base: &str, route: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}{}", base, route))
        .json(&body)
        .send()
        .await
        .expect("request should be sent");
    let status = response.status().as_u16();
    let body = response.json().await.expect("response should be json");
    (status, body)
}

#[tokio::test]
async fn health_probe() {
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::new(CountingClient::default()),
    )
    .await;

    let response = reqwest::get(format!("{}/", base))
        .await
        .expect("health response");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.expect("body"), HEALTH_MESSAGE);

    handle.abort();
}

#[tokio::test]
async fn upload_then_ask_returns_single_source() {
    let client = Arc::new(CountingClient::default());
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::clone(&client) as Arc<dyn CompletionClient>,
    )
    .await;

    let (status, body) = post_json(
        &base,
        "/upload",
        json!({ "text": "cats are mammals. dogs are mammals too." }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "success": true, "chunks": 1 }));

    let (status, body) = post_json(&base, "/ask", json!({ "question": "are cats mammals?" })).await;
    assert_eq!(status, 200);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);

    let sources = body["sources"].as_array().expect("sources array");
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["id"], 1);
    assert_eq!(sources[0]["text"], "cats are mammals. dogs are mammals too.");
    assert!(
        body["answer"]
            .as_str()
            .expect("answer string")
            .contains("[1] cats are mammals.")
    );

    handle.abort();
}

#[tokio::test]
async fn ask_without_upload() {
    let client = Arc::new(CountingClient::default());
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::clone(&client) as Arc<dyn CompletionClient>,
    )
    .await;

    let (status, body) = post_json(&base, "/ask", json!({ "question": "anything?" })).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "answer": UPLOAD_FIRST_ANSWER, "sources": [] }));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);

    handle.abort();
}

#[tokio::test]
async fn empty_upload_is_rejected_and_index_unchanged() {
    let client = Arc::new(CountingClient::default());
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::clone(&client) as Arc<dyn CompletionClient>,
    )
    .await;

    let (status, body) = post_json(&base, "/upload", json!({ "text": "" })).await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, _) = post_json(&base, "/upload", json!({})).await;
    assert_eq!(status, 400);

    // Still nothing indexed
    let (_, body) = post_json(&base, "/ask", json!({ "question": "cats?" })).await;
    assert_eq!(body["answer"], UPLOAD_FIRST_ANSWER);

    handle.abort();
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::new(CountingClient::default()),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/upload", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request should be sent");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("error body is json");
    assert!(body["error"].is_string());

    handle.abort();
}

#[tokio::test]
async fn missing_question_is_a_client_error() {
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::new(CountingClient::default()),
    )
    .await;

    let (status, body) = post_json(&base, "/ask", json!({})).await;

    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    handle.abort();
}

#[tokio::test]
async fn unrelated_question_is_refused() {
    let client = Arc::new(CountingClient::default());
    let (base, handle) = spawn_server(
        Arc::new(CatEmbedder),
        Arc::clone(&client) as Arc<dyn CompletionClient>,
    )
    .await;

    let (status, _) = post_json(
        &base,
        "/upload",
        json!({ "text": "cats sleep most of the day" }),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = post_json(&base, "/ask", json!({ "question": "stock prices" })).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "answer": LOW_CONFIDENCE_ANSWER, "sources": [] }));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);

    handle.abort();
}

#[tokio::test]
async fn completion_failure_returns_generic_answer() {
    let (base, handle) = spawn_server(Arc::new(HashEmbedder::default()), Arc::new(BrokenClient)).await;

    post_json(&base, "/upload", json!({ "text": "cats are mammals." })).await;
    let (status, body) = post_json(&base, "/ask", json!({ "question": "cats?" })).await;

    assert_eq!(status, 502);
    assert_eq!(body, json!({ "answer": FAILURE_ANSWER, "sources": [] }));

    // The index survives the failed request
    let (status, body) = post_json(&base, "/upload", json!({ "text": "new text" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["chunks"], 1);

    handle.abort();
}

#[tokio::test]
async fn long_upload_reports_chunk_count() {
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::new(CountingClient::default()),
    )
    .await;
    let text = (0..1000)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ");

    let (status, body) = post_json(&base, "/upload", json!({ "text": text })).await;

    assert_eq!(status, 200);
    assert_eq!(body["chunks"], 3);

    handle.abort();
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let (base, handle) = spawn_server(
        Arc::new(HashEmbedder::default()),
        Arc::new(CountingClient::default()),
    )
    .await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/ask", base))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .expect("preflight response");

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );

    handle.abort();
}

use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
        ..LlmConfig::default()
    }
}

fn test_client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(&test_config(&format!("{}/v1", server.uri())))
        .expect("Failed to create client")
        .with_retry_attempts(1)
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[test]
fn client_configuration() {
    let config = test_config("https://api.example.com/openai/v1");
    let client = OpenAiClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.api_key, "test-key");
    assert_eq!(client.base_url.as_str(), "https://api.example.com/openai/v1/");
    assert_eq!(client.retry_attempts, config.retry_attempts);
}

#[test]
fn client_builder_methods() {
    let client = OpenAiClient::new(&LlmConfig::default())
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);

    let client = client.with_retry_attempts(0);
    assert_eq!(client.retry_attempts, 1);
}

#[test]
fn invalid_base_url_is_rejected() {
    assert!(OpenAiClient::new(&test_config("not a url")).is_err());
}

#[test]
fn completion_urls_keep_base_path() {
    let client = OpenAiClient::new(&test_config("https://api.groq.com/openai/v1"))
        .expect("Failed to create client");

    let url = client
        .base_url
        .join("chat/completions")
        .expect("url should join");

    assert_eq!(url.as_str(), "https://api.groq.com/openai/v1/chat/completions");
}

#[tokio::test]
async fn complete_sends_system_and_user_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hi [1]")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let answer = client
        .complete("be brief", "hello")
        .await
        .expect("completion should succeed");

    assert_eq!(answer, "Hi [1]");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).with_retry_attempts(3);
    let result = client.complete("system", "user").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("recovered")))
        .mount(&server)
        .await;

    let client = test_client(&server).with_retry_attempts(2);
    let answer = client
        .complete("system", "user")
        .await
        .expect("second attempt should succeed");

    assert_eq!(answer, "recovered");
}

#[tokio::test]
async fn malformed_response_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = test_client(&server).complete("system", "user").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn response_without_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let result = test_client(&server).complete("system", "user").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("too late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = test_client(&server).with_timeout(Duration::from_millis(200));
    let result = client.complete("system", "user").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn health_check_finds_configured_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "id": "other-model", "owned_by": "someone" },
                { "id": "test-model", "owned_by": "someone" }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = tokio::task::spawn_blocking(move || client.health_check())
        .await
        .expect("health check task should finish");

    assert!(result.is_ok(), "health check failed: {:?}", result);
}

#[tokio::test]
async fn health_check_reports_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "other-model" }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = tokio::task::spawn_blocking(move || client.health_check())
        .await
        .expect("health check task should finish");

    assert!(result.is_err());
}

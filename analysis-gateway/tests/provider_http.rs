//! HTTP backends against a mock server: wire format and failure classification.

use std::time::Duration;

use analysis_gateway::config::gateway_config::CacheConfig;
use analysis_gateway::config::llm_model_config::LlmModelConfig;
use analysis_gateway::config::llm_provider::LlmProvider;
use analysis_gateway::{
    AnalysisGateway, AnalysisKind, AnalysisResult, AnalysisTask, CompletenessGate, FailureKind,
    GateConfig, Language, ProviderClient, ResultCache, RetryConfig, RetryPolicy,
};
use analysis_gateway::model::Submission;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HINTS_JSON: &str = r#"{"hints":["Consider a hash map"],"progressive":true,"next_steps":["Store complements"]}"#;
const CODE: &str = "def add(a, b):\n    return a + b\n";

fn hints() -> AnalysisTask {
    AnalysisTask::Analyze(AnalysisKind::Hints)
}

fn anthropic(server: &MockServer) -> ProviderClient {
    let cfg = LlmModelConfig::new(LlmProvider::Anthropic, "claude-test", server.uri())
        .with_api_key("test-key")
        .with_timeout_secs(5);
    ProviderClient::from_config(&cfg).unwrap()
}

fn openai(server: &MockServer, model: &str) -> ProviderClient {
    let cfg = LlmModelConfig::new(LlmProvider::OpenAI, model, server.uri())
        .with_api_key("sk-test")
        .with_timeout_secs(5);
    ProviderClient::from_config(&cfg).unwrap()
}

fn ollama(server: &MockServer) -> ProviderClient {
    let cfg = LlmModelConfig::new(LlmProvider::Ollama, "qwen3:14b", server.uri()).with_timeout_secs(5);
    ProviderClient::from_config(&cfg).unwrap()
}

#[tokio::test]
async fn anthropic_sends_key_and_version_and_joins_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({ "model": "claude-test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "text", "text": "```json\n" },
                { "type": "text", "text": HINTS_JSON },
                { "type": "text", "text": "\n```" }
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sub = Submission::new(CODE, Language::Python, None);
    let out = anthropic(&server).analyze(&hints(), &sub).await.unwrap();
    assert!(matches!(out, AnalysisResult::Hints(h) if h.hints == vec!["Consider a hash map"]));
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "17")
                .set_body_string(r#"{"type":"error","error":{"type":"rate_limit_error"}}"#),
        )
        .mount(&server)
        .await;

    let sub = Submission::new(CODE, Language::Python, None);
    let err = anthropic(&server).analyze(&hints(), &sub).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::RateLimited { retry_after_secs: 17 });
    assert_eq!(err.provider, "anthropic");
}

#[tokio::test]
async fn status_codes_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "overloaded" })))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "revoked" })))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "bad-request" })))
        .respond_with(ResponseTemplate::new(400).set_body_string("context too long"))
        .mount(&server)
        .await;

    let sub = Submission::new(CODE, Language::Python, None);

    let err = openai(&server, "overloaded").analyze(&hints(), &sub).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Transient);
    assert!(err.message.contains("upstream overloaded"), "{}", err.message);

    let err = openai(&server, "revoked").analyze(&hints(), &sub).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Permanent);
    assert!(err.message.starts_with("authentication rejected"), "{}", err.message);

    let err = openai(&server, "bad-request").analyze(&hints(), &sub).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Permanent);
}

#[tokio::test]
async fn openai_uses_bearer_auth_and_reads_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": HINTS_JSON } }]
        })))
        .mount(&server)
        .await;

    let sub = Submission::new(CODE, Language::Python, None);
    let out = openai(&server, "gpt-4o-mini").analyze(&hints(), &sub).await.unwrap();
    assert!(matches!(out, AnalysisResult::Hints(_)));
}

#[tokio::test]
async fn malformed_analysis_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "{\"hints\": \"not a list\"}" } }]
        })))
        .mount(&server)
        .await;

    let sub = Submission::new(CODE, Language::Python, None);
    let err = openai(&server, "gpt-4o-mini").analyze(&hints(), &sub).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Permanent);
    assert_eq!(err.provider, "openai");
}

#[tokio::test]
async fn ollama_requests_json_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "qwen3:14b", "stream": false, "format": "json" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen3:14b",
            "response": HINTS_JSON,
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sub = Submission::new(CODE, Language::Python, None);
    let out = ollama(&server).analyze(&hints(), &sub).await.unwrap();
    assert!(matches!(out, AnalysisResult::Hints(_)));
}

#[tokio::test]
async fn gateway_fails_over_from_rate_limited_http_provider() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(2)
        .mount(&primary)
        .await;

    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": HINTS_JSON })))
        .expect(1)
        .mount(&secondary)
        .await;

    let gw = AnalysisGateway::new(
        vec![anthropic(&primary), ollama(&secondary)],
        RetryPolicy::new(RetryConfig {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            ..RetryConfig::default()
        }),
        ResultCache::new(CacheConfig::default()),
        CompletenessGate::new(GateConfig::default()),
    );

    let out = gw
        .analyze(&analysis_gateway::AnalysisRequest::new(
            CODE,
            Language::Python,
            AnalysisKind::Hints,
        ))
        .await
        .unwrap();
    assert!(matches!(out, AnalysisResult::Hints(_)));
}

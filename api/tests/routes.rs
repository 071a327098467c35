//! Route-level tests: the router is driven in-process with scripted backends.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use analysis_gateway::prompt::Prompt;
use analysis_gateway::{
    AnalysisGateway, CacheConfig, CompletenessGate, GateConfig, LlmBackend, ProviderClient,
    ProviderFailure, ResultCache, RetryConfig, RetryPolicy,
};
use api::core::app_state::AppState;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

type Reply = Result<String, ProviderFailure>;

struct Fake {
    calls: AtomicU32,
    reply: Box<dyn Fn() -> Reply + Send + Sync>,
}

impl Fake {
    fn new(reply: impl Fn() -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            reply: Box::new(reply),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for Fake {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, _prompt: &Prompt) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)()
    }
}

fn app(backend: Arc<Fake>) -> axum::Router {
    let backend: Arc<dyn LlmBackend> = backend;
    let gateway = AnalysisGateway::new(
        vec![ProviderClient::new(backend, Duration::from_secs(5))],
        RetryPolicy::new(RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        }),
        ResultCache::new(CacheConfig::default()),
        CompletenessGate::new(GateConfig::default()),
    );
    api::router(Arc::new(AppState::new(gateway)))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const TWO_SUM: &str = "def two_sum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n    return []\n";
const TWO_SUM_STUB: &str = "class Solution:\n    def twoSum(self, nums: List[int], target: int) -> List[int]:\n        pass\n";
const COMPLEXITY_JSON: &str = r#"{"time_complexity":"O(n)","space_complexity":"O(n)","explanation":"One pass with a hash map.","key_operations":["dict lookup"]}"#;
const EXPLAIN_JSON: &str = r#"{"explanation":"Each element is visited once.","key_operations":["dict lookup"]}"#;

fn replying(body: &'static str) -> Arc<Fake> {
    Fake::new(move || Ok(body.to_string()))
}

#[tokio::test]
async fn health_lists_providers() {
    let res = app(replying(COMPLEXITY_JSON)).oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let v = json_body(res).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["status"], "healthy");
    assert_eq!(v["data"]["providers"], json!(["fake"]));
}

#[tokio::test]
async fn analyze_returns_tagged_result() {
    let fake = replying(COMPLEXITY_JSON);
    let res = app(fake.clone())
        .oneshot(post(
            "/api/analyze",
            json!({ "code": TWO_SUM, "language": "python", "analysis_type": "complexity" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let v = json_body(res).await;
    assert_eq!(v["data"]["type"], "complexity");
    assert_eq!(v["data"]["time_complexity"], "O(n)");
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn stub_gets_incomplete_notice() {
    let fake = replying(COMPLEXITY_JSON);
    let res = app(fake.clone())
        .oneshot(post(
            "/api/analyze",
            json!({ "code": TWO_SUM_STUB, "language": "python", "analysis_type": "optimization" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let v = json_body(res).await;
    assert_eq!(v["data"]["type"], "incomplete_solution");
    assert_eq!(v["data"]["analysis_kind"], "optimization");
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn validation_failures_carry_field_details() {
    let fake = replying(COMPLEXITY_JSON);
    let res = app(fake.clone())
        .oneshot(post(
            "/api/analyze",
            json!({ "code": TWO_SUM, "language": "cobol", "analysis_type": "complexity" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let v = json_body(res).await;
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(v["error"]["retryable"], false);
    let detail = &v["error"]["details"][0];
    assert_eq!(detail["path"], "language");
    assert!(detail["examples"].as_array().unwrap().contains(&json!("python")));
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn body_rejections_use_the_envelope() {
    let res = app(replying(COMPLEXITY_JSON))
        .oneshot(post("/api/analyze", json!({ "code": TWO_SUM, "language": 3 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

    let v = json_body(res).await;
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert_eq!(v["error"]["details"][0]["path"], "language");

    let res = app(replying(COMPLEXITY_JSON))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let v = json_body(res).await;
    assert_eq!(v["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn rate_limited_chain_maps_to_429() {
    let fake = Fake::new(|| Err(ProviderFailure::rate_limited("fake", 30, "slow down")));
    let res = app(fake)
        .oneshot(post(
            "/api/analyze",
            json!({ "code": TWO_SUM, "language": "python", "analysis_type": "hints" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()[header::RETRY_AFTER], "30");

    let v = json_body(res).await;
    assert_eq!(v["error"]["code"], "RATE_LIMITED");
    assert_eq!(v["error"]["retryable"], true);
    assert_eq!(v["error"]["retry_after_secs"], 30);
}

#[tokio::test]
async fn permanent_failure_maps_to_502() {
    let fake = Fake::new(|| Err(ProviderFailure::permanent("fake", "authentication rejected")));
    let res = app(fake)
        .oneshot(post(
            "/api/analyze-complexity-quick",
            json!({ "code": TWO_SUM, "language": "python" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let v = json_body(res).await;
    assert_eq!(v["error"]["code"], "PROVIDER_ERROR");
    assert_eq!(v["error"]["retryable"], false);
}

#[tokio::test]
async fn explain_requires_big_o() {
    let fake = replying(EXPLAIN_JSON);
    let router = app(fake.clone());

    let res = router
        .clone()
        .oneshot(post(
            "/api/explain-complexity",
            json!({
                "code": TWO_SUM,
                "language": "python",
                "time_complexity": "  ",
                "space_complexity": "O(n)"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"]["code"], "INVALID_INPUT");

    let res = router
        .oneshot(post(
            "/api/explain-complexity",
            json!({
                "code": TWO_SUM,
                "language": "python",
                "time_complexity": "O(n)",
                "space_complexity": "O(n)"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["type"], "complexity_explanation");
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn completeness_check_reports_missing_elements() {
    let fake = replying(COMPLEXITY_JSON);
    let res = app(fake.clone())
        .oneshot(post(
            "/api/check-completeness",
            json!({ "code": TWO_SUM_STUB, "language": "python" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let v = json_body(res).await;
    assert_eq!(v["data"]["is_complete"], false);
    assert!(
        v["data"]["missing_elements"]
            .as_array()
            .unwrap()
            .contains(&json!("return statement"))
    );
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn validate_checks_only_present_fields() {
    let res = app(replying(COMPLEXITY_JSON))
        .oneshot(post("/api/validate", json!({ "code": "x = 1", "language": "python" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let v = json_body(res).await;
    let results = &v["data"]["validation_results"];
    assert_eq!(v["data"]["all_valid"], false);
    assert_eq!(results["code"]["errors"][0]["error_type"], "code_too_short");
    assert_eq!(results["language"]["is_valid"], true);
    assert!(results.get("analysis_type").is_none());
}

#[tokio::test]
async fn cache_stats_and_clear() {
    let fake = replying(COMPLEXITY_JSON);
    let router = app(fake.clone());
    let body = json!({ "code": TWO_SUM, "language": "python", "analysis_type": "complexity" });

    for _ in 0..2 {
        let res = router
            .clone()
            .oneshot(post("/api/analyze", body.clone()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(fake.calls(), 1);

    let v = json_body(router.clone().oneshot(get("/api/cache/stats")).await.unwrap()).await;
    assert_eq!(v["data"]["size"], 1);
    assert_eq!(v["data"]["hits"], 1);

    let res = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/cache/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(res).await["data"]["cleared"], 1);

    let v = json_body(router.oneshot(get("/api/cache/stats")).await.unwrap()).await;
    assert_eq!(v["data"]["size"], 0);
}

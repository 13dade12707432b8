//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;
use std::time::Duration;

use apiscope::{
    api::create_router,
    config::Config,
    error::ComputeError,
    perf::PerformanceSampler,
    query::{ApiItem, ComputeBackend, QueryPipeline, SearchRequest},
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::from_config(&Config::default()))
}

fn app_with_backend(backend: Arc<dyn ComputeBackend>, timeout: Duration) -> Router {
    let sampler = Arc::new(PerformanceSampler::default());
    let pipeline =
        Arc::new(QueryPipeline::new(&Config::default(), sampler).with_offload_threshold(2));
    let mut state = AppState::new(pipeline, backend);
    state.compute_timeout = timeout;
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

/// 100 operations, the first 40 tagged "users" and 10 of those GETs.
fn scenario_items() -> Value {
    let items: Vec<Value> = (0..100)
        .map(|i| {
            let tags: Vec<&str> = if i < 40 { vec!["users"] } else { vec![] };
            json!({
                "id": format!("op{}", i),
                "method": if i < 10 { "GET" } else { "POST" },
                "path": format!("/resource/{}", i),
                "summary": format!("Operation {}", i),
                "tags": tags,
            })
        })
        .collect();
    json!({ "items": items })
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Items Endpoint Tests ==

#[tokio::test]
async fn test_put_items_success() {
    let app = create_test_app();

    let (status, json) = send(&app, "PUT", "/items", Some(scenario_items())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 100);
    assert_eq!(json["generation"], 1);
}

#[tokio::test]
async fn test_put_items_duplicate_ids_rejected() {
    let app = create_test_app();
    let body = json!({ "items": [
        { "id": "a", "method": "GET", "path": "/a" },
        { "id": "a", "method": "GET", "path": "/b" },
    ]});

    let (status, json) = send(&app, "PUT", "/items", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Duplicate"));
}

#[tokio::test]
async fn test_put_items_malformed_body() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/items")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"items":[{"id":"a"}]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == Query Endpoint Tests ==

#[tokio::test]
async fn test_query_grouping_scenario() {
    let app = create_test_app();
    send(&app, "PUT", "/items", Some(scenario_items())).await;

    let (status, json) = send(&app, "POST", "/query", Some(json!({ "group": { "by": "tag" } }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["grouped_items"]["users"].as_array().unwrap().len(), 40);
    assert_eq!(json["total_filtered"], 100);

    let filtered = json!({ "filter": { "methods": ["GET"] }, "group": { "by": "tag" } });
    let (status, json) = send(&app, "POST", "/query", Some(filtered)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["grouped_items"]["users"].as_array().unwrap().len(), 10);

    // The unfiltered composite is still cached
    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["pools"]["results"]["total_entries"], 2);
}

#[tokio::test]
async fn test_query_unknown_sort_falls_back() {
    let app = create_test_app();
    send(&app, "PUT", "/items", Some(scenario_items())).await;

    let body = json!({ "sort": { "by": "popularity" }, "filter": { "query": "operation 1" } });
    let (status, json) = send(&app, "POST", "/query", Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["total_filtered"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_query_too_long_rejected() {
    let app = create_test_app();
    let body = json!({ "filter": { "query": "x".repeat(1_000) } });

    let (status, _) = send(&app, "POST", "/query", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_replacing_items_invalidates_results() {
    let app = create_test_app();
    send(&app, "PUT", "/items", Some(scenario_items())).await;
    send(&app, "POST", "/query", Some(json!({}))).await;

    let replacement = json!({ "items": [{ "id": "only", "method": "GET", "path": "/only" }] });
    send(&app, "PUT", "/items", Some(replacement)).await;

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["pools"]["results"]["total_entries"], 0);
    assert_eq!(stats["generation"], 2);

    let (_, json) = send(&app, "POST", "/query", Some(json!({}))).await;
    assert_eq!(json["total_filtered"], 1);
    assert_eq!(json["generation"], 2);
}

// == Invalidate Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_tag() {
    let app = create_test_app();
    send(&app, "PUT", "/items", Some(scenario_items())).await;
    send(&app, "POST", "/query", Some(json!({ "filter": { "query": "operation" } }))).await;

    let (status, json) = send(&app, "POST", "/invalidate/grouping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);

    // Search stage results survive a grouping change
    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["pools"]["search"]["total_entries"], 1);
}

#[tokio::test]
async fn test_invalidate_unknown_tag() {
    let app = create_test_app();

    let (status, json) = send(&app, "POST", "/invalidate/colors", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json.get("error").is_some());
}

// == Stats and Report Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_lists_pools() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    for pool in ["search", "filter", "results"] {
        assert_eq!(json["pools"][pool]["hits"], 0);
    }
    assert_eq!(json["pools"]["filter"]["strategy"], "lru");
}

#[tokio::test]
async fn test_report_endpoint() {
    let app = create_test_app();
    send(&app, "PUT", "/items", Some(scenario_items())).await;
    send(&app, "POST", "/query", Some(json!({ "filter": { "query": "users" } }))).await;

    let (status, json) = send(&app, "GET", "/report", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["general_stats"]["total_samples"].as_u64().unwrap() >= 2);
    assert!(json["detailed_stats"].get("search").is_some());
    assert!(json["recommendations"].is_array());
}

// == Offloaded Search Tests ==

struct FailingBackend;

#[async_trait]
impl ComputeBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(
        &self,
        _: Arc<Vec<ApiItem>>,
        _: SearchRequest,
    ) -> Result<Vec<usize>, ComputeError> {
        Err(ComputeError::Failed("worker crashed".into()))
    }
}

struct StalledBackend;

#[async_trait]
impl ComputeBackend for StalledBackend {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn search(
        &self,
        _: Arc<Vec<ApiItem>>,
        _: SearchRequest,
    ) -> Result<Vec<usize>, ComputeError> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_backend_failure_is_bad_gateway() {
    let app = app_with_backend(Arc::new(FailingBackend), Duration::from_secs(5));
    send(&app, "PUT", "/items", Some(scenario_items())).await;

    let (status, json) = send(&app, "POST", "/query", Some(json!({ "filter": { "query": "users" } }))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Compute failed: worker crashed");
}

#[tokio::test(start_paused = true)]
async fn test_backend_timeout_is_gateway_timeout() {
    let app = app_with_backend(Arc::new(StalledBackend), Duration::from_millis(200));
    send(&app, "PUT", "/items", Some(scenario_items())).await;

    let (status, _) = send(&app, "POST", "/query", Some(json!({ "filter": { "query": "users" } }))).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_empty_query_is_never_offloaded() {
    let app = app_with_backend(Arc::new(FailingBackend), Duration::from_secs(5));
    send(&app, "PUT", "/items", Some(scenario_items())).await;

    let (status, json) = send(&app, "POST", "/query", Some(json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_filtered"], 100);
}

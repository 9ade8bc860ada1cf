//! Integration Tests for API Endpoints
//!
//! Drives the full router against a local stand-in for every upstream
//! (countries list, chat completions and an external data source).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use feast_finder::config::{
    AuthenticationConfig, DataFormat, ExternalDataSource, OpenAiConfig,
};
use feast_finder::rate_limit::RateLimitConfig;
use feast_finder::{create_router, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

const CULTURAL_REPLY: &str = r#"{
  "dishes": {
    "entry": null,
    "main": {"name": "Julskinka", "description": "Glazed Christmas ham.", "ingredients": ["ham", "mustard"]},
    "dessert": {"name": "Risalamalta", "description": "Rice pudding with cream.", "ingredients": ["rice", "cream"]}
  },
  "carol": {"name": "Nu tändas tusen juleljus", "author": "Emmy Köhler"}
}"#;

const RECIPE_REPLY: &str = r#"{"steps": [
  {"stepNumber": 1, "instruction": "Boil the ham", "details": "About 2 hours"},
  {"stepNumber": 2, "instruction": "Glaze and bake"}
]}"#;

// == Upstream Stand-in ==

#[derive(Clone, Default)]
struct Upstream {
    chat_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
}

async fn countries() -> Json<Value> {
    Json(json!([
        {"name": {"common": "Sweden"}},
        {"name": {"common": "Mexico"}},
        {"name": {"common": "Japan"}}
    ]))
}

async fn chat(State(up): State<Upstream>, Json(body): Json<Value>) -> Json<Value> {
    up.chat_calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    let content = if prompt.contains("step-by-step recipe") {
        RECIPE_REPLY
    } else {
        CULTURAL_REPLY
    };
    Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
}

async fn posts(
    State(up): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    up.fetch_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!([{"id": 1, "userId": params.get("userId"), "title": "Advent"}]))
}

async fn create_post(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"id": 101, "echo": body}))
}

async fn spawn_upstream(up: Upstream) -> String {
    let app = Router::new()
        .route("/all", get(countries))
        .route("/chat/completions", post(chat))
        .route("/posts", get(posts).post(create_post))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .with_state(up);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// == Helper Functions ==

async fn create_test_app() -> (Router, Upstream) {
    let up = Upstream::default();
    let base = spawn_upstream(up.clone()).await;

    let mut config = Config {
        countries_url: format!("{}/all", base),
        openai: OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: base.clone(),
            timeout: Duration::from_secs(5),
        },
        retry_base_delay: Duration::from_millis(1),
        ..Config::default()
    };
    config.external_data_sources.push(ExternalDataSource {
        id: "local".to_string(),
        name: "Local".to_string(),
        endpoint_url: base,
        authentication: AuthenticationConfig::none(),
        data_format: DataFormat::Json,
        refresh_frequency_ms: 0,
        timeout_ms: 2000,
        retry_attempts: 2,
    });
    config.ai_services[0].rate_limit = RateLimitConfig {
        requests_per_minute: 2,
        ..RateLimitConfig::default()
    };

    (create_router(AppState::from_config(config)), up)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == Countries ==

#[tokio::test]
async fn test_countries_sorted() {
    let (app, _) = create_test_app().await;

    let (status, json) = get_json(&app, "/api/countries").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], json!(["Japan", "Mexico", "Sweden"]));
}

// == Dishes ==

#[tokio::test]
async fn test_dishes_for_valid_country() {
    let (app, up) = create_test_app().await;

    let (status, json) = post_json(&app, "/api/dishes", json!({"country": "sweden"})).await;

    assert_eq!(status, StatusCode::OK);
    let dishes = &json["data"];
    assert!(dishes["entry"].is_null());
    assert_eq!(dishes["main"]["name"], "Julskinka");
    assert_eq!(dishes["main"]["country"], "Sweden");
    assert_eq!(dishes["main"]["type"], "main");
    assert_eq!(dishes["dessert"]["type"], "dessert");
    assert_eq!(up.chat_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dishes_unknown_country_never_reaches_model() {
    let (app, up) = create_test_app().await;

    let (status, json) = post_json(&app, "/api/dishes", json!({"country": "Atlantis"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["retryable"], false);
    assert_eq!(
        json["error"]["message"],
        "Country 'Atlantis' is not recognized. Please select a valid country from the list."
    );
    assert_eq!(up.chat_calls.load(Ordering::SeqCst), 0);
}

// == Cultural Data ==

#[tokio::test]
async fn test_cultural_data_is_cached_per_mode() {
    let (app, up) = create_test_app().await;

    let (status, first) =
        post_json(&app, "/api/cultural-data", json!({"country": "Sweden"})).await;
    let (_, second) = post_json(&app, "/api/cultural-data", json!({"country": "SWEDEN"})).await;
    let (_, detailed) = post_json(
        &app,
        "/api/cultural-data",
        json!({"country": "Sweden", "mode": "detailed"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["carol"]["name"], "Nu tändas tusen juleljus");
    assert_eq!(first["data"]["carol"]["author"], "Emmy Köhler");
    assert_eq!(first["data"]["carol"]["country"], "Sweden");
    assert!(first["data"]["spotifyUrl"].is_null());
    assert_eq!(first["data"], second["data"]);
    assert_eq!(detailed["success"], true);
    assert_eq!(up.chat_calls.load(Ordering::SeqCst), 2, "one call per mode");
}

#[tokio::test]
async fn test_cultural_data_rejects_invalid_mode() {
    let (app, up) = create_test_app().await;

    let (status, json) = post_json(
        &app,
        "/api/cultural-data",
        json!({"country": "Sweden", "mode": "turbo"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid mode. Must be 'fast' or 'detailed'");
    assert_eq!(up.chat_calls.load(Ordering::SeqCst), 0);
}

// == Recipe ==

#[tokio::test]
async fn test_recipe_steps() {
    let (app, _) = create_test_app().await;

    let (status, json) = post_json(
        &app,
        "/api/recipe",
        json!({"country": "Sweden", "dishName": "Julskinka"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let steps = json["data"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["stepNumber"], 1);
    assert_eq!(steps[0]["details"], "About 2 hours");
    assert!(steps[1].get("details").is_none());
}

#[tokio::test]
async fn test_recipe_requires_dish_name() {
    let (app, _) = create_test_app().await;

    let (status, json) = post_json(&app, "/api/recipe", json!({"country": "Sweden"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Dish name is required");
}

// == AI Process ==

#[tokio::test]
async fn test_ai_process_demo_then_rate_limited() {
    let (app, _) = create_test_app().await;
    let request = json!({"serviceId": "demo-ai", "prompt": "What is Lucia day?"});

    for _ in 0..2 {
        let (status, json) = post_json(&app, "/api/ai/process", request.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["data"]["result"],
            "[Demo AI Response] Processed: \"What is Lucia day?...\""
        );
        assert_eq!(json["metadata"]["tokensUsed"], 4);
    }

    let (status, json) = post_json(&app, "/api/ai/process", request).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(json["error"]["message"], "Rate limit exceeded. Please try again later.");
}

#[tokio::test]
async fn test_ai_process_rejects_empty_prompt() {
    let (app, _) = create_test_app().await;

    let (status, json) = post_json(
        &app,
        "/api/ai/process",
        json!({"serviceId": "demo-ai", "prompt": "   "}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "prompt is required and must be a non-empty string"
    );
}

// == External Data ==

#[tokio::test]
async fn test_external_data_get_with_params() {
    let (app, up) = create_test_app().await;

    let (status, json) = get_json(
        &app,
        "/api/external-data?sourceId=local&endpoint=posts&params=%7B%22userId%22%3A%227%22%7D",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["userId"], "7");
    assert_eq!(json["metadata"]["sourceId"], "local");
    assert!(json["metadata"]["responseTime"].is_u64());
    assert_eq!(up.fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_external_data_post_forwards_body() {
    let (app, _) = create_test_app().await;

    let (status, json) = post_json(
        &app,
        "/api/external-data?sourceId=local&endpoint=posts",
        json!({"title": "God Jul"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["echo"]["title"], "God Jul");
}

#[tokio::test]
async fn test_external_data_upstream_404_is_not_retried() {
    let (app, _) = create_test_app().await;

    let (status, json) = get_json(&app, "/api/external-data?sourceId=local&endpoint=missing").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "EXTERNAL_SERVICE_ERROR");
    assert_eq!(json["error"]["retryable"], false);
    assert_eq!(json["metadata"]["sourceId"], "local");
}

// == Stats ==

#[tokio::test]
async fn test_stats_reflect_cache_use() {
    let (app, _) = create_test_app().await;

    post_json(&app, "/api/dishes", json!({"country": "Japan"})).await;
    post_json(&app, "/api/dishes", json!({"country": "Japan"})).await;
    let (status, json) = get_json(&app, "/api/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["hits"].as_u64().unwrap() >= 2);
    assert!(json["data"]["totalEntries"].as_u64().unwrap() >= 2);
    assert!(json["data"]["hitRate"].as_f64().unwrap() > 0.0);
}

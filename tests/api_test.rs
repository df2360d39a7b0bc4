use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt; // for `oneshot`

use linkfetcher::api::state::AppState;
use linkfetcher::config::Config;
use linkfetcher::engine::{Engine, FetchErrorKind, FetchResult};

const PAGE: &str = "<html><body><p>lol</p><p><b>x</b></p><img src=a.png/></body></html>";

/// Stands in for the remote hosts a batch points at
async fn start_mock_server() -> String {
    let app = Router::new()
        .route(
            "/page",
            get(|| async { ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], PAGE) }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "<p>nothing</p>") }),
        )
        .route(
            "/api",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{\"ok\":true}") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "too late"
            }),
        );

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Creates a config with small limits and a short fetch deadline
fn create_test_config() -> Config {
    let config_toml = r#"
[server]
bind_addr = "127.0.0.1:0"

[server.api]
max_payload_bytes = "4KB"
max_urls_per_batch = 10

[engine]
workers = 4
queue_capacity = 8
request_timeout_secs = 1
connect_timeout_secs = 1
    "#;

    toml::from_str(config_toml).expect("Failed to parse test config")
}

/// Builds the real router over a fresh engine
fn build_test_app() -> (Router, Arc<Engine>) {
    let config = create_test_config();
    let engine = Arc::new(
        Engine::new(config.engine.to_engine_config()).expect("Failed to start test engine"),
    );
    let app = linkfetcher::api::router(AppState::new(config, engine.clone()));
    (app, engine)
}

fn post_fetch_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri("/fetch")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn find<'a>(results: &'a [FetchResult], url: &str) -> &'a FetchResult {
    results
        .iter()
        .find(|r| r.url == url)
        .unwrap_or_else(|| panic!("no result for {}", url))
}

#[tokio::test]
async fn test_fetch_batch_mixed_outcomes() {
    let base = start_mock_server().await;
    let (app, engine) = build_test_app();

    let page = format!("{}/page", base);
    let missing = format!("{}/missing", base);
    let api = format!("{}/api", base);
    let request = post_fetch_request(json!([page, missing, api, "not a url", page]));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let results: Vec<FetchResult> = serde_json::from_slice(&body).unwrap();

    // One result per submitted URL, duplicates included
    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|r| r.url == page).count(), 2);

    let page_result = find(&results, &page);
    assert_eq!(page_result.meta.status, 200);
    assert_eq!(page_result.meta.content_length, PAGE.len());
    let mut tags: Vec<(String, usize)> = page_result
        .elements
        .iter()
        .map(|e| (e.tag_name.clone(), e.count))
        .collect();
    tags.sort();
    assert_eq!(
        tags,
        vec![
            ("b".to_string(), 1),
            ("body".to_string(), 1),
            ("html".to_string(), 1),
            ("img".to_string(), 1),
            ("p".to_string(), 2),
        ]
    );

    let missing_result = find(&results, &missing);
    assert_eq!(missing_result.meta.status, 404);
    assert!(missing_result.meta.content_type.is_empty());
    assert!(missing_result.meta.error.is_none());
    assert!(missing_result.elements.is_empty());

    let api_result = find(&results, &api);
    assert_eq!(api_result.meta.status, 200);
    assert_eq!(api_result.meta.content_length, "{\"ok\":true}".len());
    assert!(api_result.elements.is_empty());

    let bad = find(&results, "not a url");
    assert_eq!(bad.meta.status, 500);
    assert_eq!(bad.meta.error_kind, Some(FetchErrorKind::InvalidUrl));

    engine.stop().await;
}

#[tokio::test]
async fn test_fetch_response_json_shape() {
    let base = start_mock_server().await;
    let (app, engine) = build_test_app();

    let response = app
        .oneshot(post_fetch_request(json!([format!("{}/page", base)])))
        .await
        .unwrap();
    let value = body_json(response).await;

    let item = &value.as_array().unwrap()[0];
    assert!(item["url"].is_string());
    assert_eq!(item["meta"]["status"], 200);
    assert_eq!(item["meta"]["contentType"], "text/html; charset=utf-8");
    assert!(item["meta"]["contentLength"].is_u64());
    assert!(item["meta"].get("error").is_none());
    assert!(item["elements"][0]["tagName"].is_string());
    assert!(item["elements"][0]["count"].is_u64());

    engine.stop().await;
}

#[tokio::test]
async fn test_slow_url_times_out_without_blocking_siblings() {
    let base = start_mock_server().await;
    let (app, engine) = build_test_app();

    let slow = format!("{}/slow", base);
    let page = format!("{}/page", base);

    let started = Instant::now();
    let response = app
        .oneshot(post_fetch_request(json!([slow, page])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Request deadline is 1s; the slow handler would take 10s
    assert!(started.elapsed() < Duration::from_secs(5));

    let value = body_json(response).await;
    let results: Vec<FetchResult> = serde_json::from_value(value).unwrap();
    assert_eq!(results.len(), 2);

    let slow_result = find(&results, &slow);
    assert_eq!(slow_result.meta.error_kind, Some(FetchErrorKind::Timeout));
    assert!(slow_result.meta.error.is_some());
    assert!(slow_result.elements.is_empty());

    let page_result = find(&results, &page);
    assert_eq!(page_result.meta.status, 200);
    assert!(!page_result.elements.is_empty());

    engine.stop().await;
}

#[tokio::test]
async fn test_empty_batch() {
    let (app, engine) = build_test_app();

    let response = app.oneshot(post_fetch_request(json!([]))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    engine.stop().await;
}

#[tokio::test]
async fn test_invalid_content_type() {
    let (app, engine) = build_test_app();

    let request = Request::builder()
        .uri("/fetch")
        .method("POST")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("[\"https://example.com\"]"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    engine.stop().await;
}

#[tokio::test]
async fn test_body_not_a_url_list() {
    let (app, engine) = build_test_app();

    let response = ServiceExt::<Request<Body>>::oneshot(
        app.clone(),
        post_fetch_request(json!({"urls": ["https://example.com"]})),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = body_json(response).await;
    assert_eq!(value["code"], "INVALID_PAYLOAD");

    let response = app
        .oneshot(post_fetch_request(json!(["https://example.com", 42])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    engine.stop().await;
}

#[tokio::test]
async fn test_too_many_urls() {
    let (app, engine) = build_test_app();

    let urls: Vec<String> = (0..11).map(|i| format!("http://h{}.invalid/", i)).collect();
    let response = app.oneshot(post_fetch_request(json!(urls))).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["code"], "TOO_MANY_URLS");

    engine.stop().await;
}

#[tokio::test]
async fn test_payload_too_large() {
    let (app, engine) = build_test_app();

    let long_url = format!("https://example.com/{}", "a".repeat(8 * 1024));
    let response = app
        .oneshot(post_fetch_request(json!([long_url])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");

    engine.stop().await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, engine) = build_test_app();

    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = ServiceExt::<Request<Body>>::oneshot(app.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["workers"], 4);
    assert!(health["version"].is_string());
    let components = health["components"].as_object().unwrap();
    assert!(components.contains_key("api"));
    assert!(components.contains_key("worker_pool"));

    // After the pool stops, health degrades and batches are refused
    engine.stop().await;

    let request = Request::builder()
        .uri("/operators/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let response = ServiceExt::<Request<Body>>::oneshot(app.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .oneshot(post_fetch_request(json!(["https://example.com"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_stats_endpoint_counts_batches() {
    let base = start_mock_server().await;
    let (app, engine) = build_test_app();

    let batch = json!([format!("{}/page", base), "not a url"]);
    let response = ServiceExt::<Request<Body>>::oneshot(app.clone(), post_fetch_request(batch))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rejected = Request::builder()
        .uri("/fetch")
        .method("POST")
        .body(Body::from("[]"))
        .unwrap();
    let response = ServiceExt::<Request<Body>>::oneshot(app.clone(), rejected)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/operators/stats")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let stats = body_json(app.oneshot(request).await.unwrap()).await;

    assert_eq!(stats["batches_accepted"], 1);
    assert_eq!(stats["batches_rejected"], 1);
    assert_eq!(stats["fetches_completed"], 1);
    assert_eq!(stats["fetches_failed"], 1);
    assert_eq!(stats["workers"], 4);

    engine.stop().await;
}

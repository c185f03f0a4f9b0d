use super::*;
use crate::pipeline::test_helpers::{
    article_png, article_server, create_test_orchestrator, serve_page, stub_adapters,
    wait_for_terminal,
};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;

mod chapters;

/// Orchestrator with stub media adapters plus a router over it.
/// The tempdir must be kept alive for the duration of the test.
async fn create_test_app() -> (Router, Arc<TaskOrchestrator>, tempfile::TempDir) {
    let (adapters, _) = stub_adapters();
    let (orchestrator, temp_dir) = create_test_orchestrator(adapters).await;
    let orchestrator = Arc::new(orchestrator);
    let app = create_router(orchestrator.clone(), orchestrator.get_config());
    (app, orchestrator, temp_dir)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response should be JSON")
}

/// Submit `url` through the router and wait for the task to finish
async fn submit_and_wait(app: &Router, orchestrator: &TaskOrchestrator, url: &str) -> String {
    let response = post_json(app, "/process", serde_json::json!({ "url": url })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let task_id = body_json(response).await["task_id"]
        .as_str()
        .unwrap()
        .to_string();
    wait_for_terminal(orchestrator, task_id.parse().unwrap()).await;
    task_id
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _orchestrator, _temp_dir) = create_test_app().await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_enabled() {
    let (_app, orchestrator, _temp_dir) = create_test_app().await;

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(orchestrator, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (_app, orchestrator, _temp_dir) = create_test_app().await;

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(orchestrator, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (app, orchestrator, _temp_dir) = create_test_app().await;

    let response = get(&app, "/swagger-ui/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("<html") || html.contains("<!DOCTYPE html>"));

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.swagger_ui = false;
    let app = create_router(orchestrator, Arc::new(config));
    assert_eq!(get(&app, "/swagger-ui/").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_serves_until_shutdown_signal() {
    let (_app, orchestrator, _temp_dir) = create_test_app().await;

    // Reserve a free port, then hand it to the server
    let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = reserved.local_addr().unwrap();
    drop(reserved);

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.bind_address = addr;
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server(orchestrator, config, async move {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::new();
    let url = format!("http://{addr}/health");
    let mut body = None;
    for _ in 0..50 {
        if let Ok(response) = client.get(&url).send().await {
            body = Some(response.json::<serde_json::Value>().await.unwrap());
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(body.unwrap()["status"], "ok");

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap()
        .unwrap();
}

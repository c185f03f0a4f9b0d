use super::*;

#[tokio::test]
async fn extract_chapters_lists_headings() {
    let server = wiremock::MockServer::start().await;
    serve_page(
        &server,
        "/guide",
        "<html><head><title>Guide</title></head><body>\
         <h1>Intro</h1><h2>Setup</h2><h3>Details</h3><h4>Ignored</h4>\
         </body></html>",
    )
    .await;
    let (app, _orchestrator, _temp_dir) = create_test_app().await;

    let response = post_json(
        &app,
        "/extract-chapters",
        serde_json::json!({ "url": format!("{}/guide", server.uri()) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["title"], "Guide");
    let chapters = body["chapters"].as_array().unwrap();
    let levels: Vec<u64> = chapters.iter().map(|c| c["level"].as_u64().unwrap()).collect();
    assert_eq!(levels, vec![1, 2, 3]);
    assert!(chapters.iter().all(|c| c["id"].as_str().is_some()));
}

#[tokio::test]
async fn extract_chapters_without_headings_is_empty() {
    let server = wiremock::MockServer::start().await;
    serve_page(&server, "/flat", "<html><body><p>Nothing to see.</p></body></html>").await;
    let (app, _orchestrator, _temp_dir) = create_test_app().await;

    let response = post_json(
        &app,
        "/extract-chapters",
        serde_json::json!({ "url": format!("{}/flat", server.uri()) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["chapters"], serde_json::json!([]));
}

#[tokio::test]
async fn extract_chapters_never_fails_on_bad_urls() {
    let (app, _orchestrator, _temp_dir) = create_test_app().await;

    let response = post_json(
        &app,
        "/extract-chapters",
        serde_json::json!({ "url": "http://127.0.0.1:9/unreachable" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["title"], "http://127.0.0.1:9/unreachable");
    assert_eq!(body["chapters"], serde_json::json!([]));
}

//! Management API behavior over HTTP, including the cascade from target
//! removal to metric-series deletion.

mod helpers;

use helpers::app::spawn_app;
use helpers::mock_prober::MockProber;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn target_crud_round_trip() {
    let app = spawn_app(Arc::new(MockProber::new())).await;
    let client = reqwest::Client::new();

    // Initially empty.
    let body: Value = client
        .get(app.api_url("/targets"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["targets"], json!([]));

    // Add.
    let response = client
        .post(app.api_url("/targets"))
        .json(&json!({ "address": "8.8.8.8" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = client
        .get(app.api_url("/targets"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["targets"], json!(["8.8.8.8"]));

    // Duplicate add conflicts and cardinality is unchanged.
    let response = client
        .post(app.api_url("/targets"))
        .json(&json!({ "address": "8.8.8.8" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Rename.
    let response = client
        .put(app.api_url("/targets/8.8.8.8"))
        .json(&json!({ "address": "1.1.1.1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = client
        .get(app.api_url("/targets"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["targets"], json!(["1.1.1.1"]));

    // Remove.
    let response = client
        .delete(app.api_url("/targets/1.1.1.1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .delete(app.api_url("/targets/1.1.1.1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.shutdown().await;
}

#[tokio::test]
async fn invalid_and_missing_targets_map_to_client_errors() {
    let app = spawn_app(Arc::new(MockProber::new())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.api_url("/targets"))
        .json(&json!({ "address": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("empty"));

    let response = client
        .put(app.api_url("/targets/9.9.9.9"))
        .json(&json!({ "address": "1.1.1.1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.shutdown().await;
}

#[tokio::test]
async fn removing_a_target_deletes_its_series() {
    let app = spawn_app(Arc::new(MockProber::new())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.api_url("/targets"))
        .json(&json!({ "address": "8.8.8.8" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Wait for a collection cycle to export series for the new target.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let body = client
            .get(app.metrics_url())
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        if body.contains(r#"target="8.8.8.8""#) {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "series for the new target never appeared"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let response = client
        .delete(app.api_url("/targets/8.8.8.8"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // A cycle in flight at the moment of removal may still write the
    // target once, but the series must be gone within one interval.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let body = client
            .get(app.metrics_url())
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        if !body.contains(r#"target="8.8.8.8""#) {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "series still present after removal:\n{body}"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    app.shutdown().await;
}

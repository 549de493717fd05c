//! Download redemption through the admission queue.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use sharegate_core::config::DownloadQueueConfig;

use crate::helpers::{TestApp, path_of};

fn single_slot() -> DownloadQueueConfig {
    DownloadQueueConfig {
        max_concurrent: 1,
        max_queue_size: 1,
        min_file_size_bytes: 0,
        ..DownloadQueueConfig::default()
    }
}

async fn download_url(app: &TestApp) -> String {
    let token = app.owner_token();
    let file_id = app.library_file(&token, "video.mp4", b"not really a video").await;
    let handle = app
        .request("GET", &format!("/api/files/{file_id}/download"), None, Some(&token))
        .await;
    assert_eq!(handle.status, StatusCode::OK, "{}", handle.body);
    handle.str("url")
}

/// Start a download without reading its body.
async fn start(app: &TestApp, url: &str, id: Uuid) -> Response {
    let req = Request::builder()
        .uri(format!("{}?downloadId={id}", path_of(url)))
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(req).await.unwrap()
}

async fn wait_until_queued(app: &TestApp, expected: usize) {
    for _ in 0..200 {
        if app.state.download_queue.queue_status().queue_length == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("queue never reached {expected} entries");
}

#[tokio::test]
async fn test_download_reports_its_id_and_frees_the_slot() {
    let app = TestApp::with_queue(single_slot()).await;
    let url = download_url(&app).await;
    let id = Uuid::new_v4();

    let response = start(&app, &url, id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["x-download-id"].to_str().unwrap(),
        id.to_string()
    );
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"not really a video");

    let anonymous = app
        .request("GET", "/api/filesystem/download-queue/status", None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let token = app.owner_token();
    let status = app
        .request("GET", "/api/filesystem/download-queue/status", None, Some(&token))
        .await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["data"]["activeDownloads"], 0);
    assert_eq!(status.body["data"]["maxConcurrent"], 1);
}

#[tokio::test]
async fn test_second_download_waits_and_third_is_rejected() {
    let app = TestApp::with_queue(single_slot()).await;
    let url = download_url(&app).await;

    let first = start(&app, &url, Uuid::new_v4()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second_id = Uuid::new_v4();
    let second = tokio::spawn({
        let router = app.router.clone();
        let uri = format!("{}?downloadId={second_id}", path_of(&url));
        async move {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            router.oneshot(req).await.unwrap()
        }
    });
    wait_until_queued(&app, 1).await;

    let entry = app
        .request(
            "GET",
            &format!("/api/filesystem/download-queue/{second_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(entry.status, StatusCode::OK);
    assert_eq!(entry.body["data"]["state"], "queued");
    assert_eq!(entry.body["data"]["position"], 1);

    let third = app.get_raw(&url).await;
    assert_eq!(third.status, StatusCode::TOO_MANY_REQUESTS);

    drop(first);
    let second = second.await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(
        second.headers()["x-download-id"].to_str().unwrap(),
        second_id.to_string()
    );
}

#[tokio::test]
async fn test_cancelling_a_queued_download() {
    let app = TestApp::with_queue(single_slot()).await;
    let url = download_url(&app).await;

    let _first = start(&app, &url, Uuid::new_v4()).await;
    let waiting_id = Uuid::new_v4();
    let waiting = tokio::spawn({
        let router = app.router.clone();
        let uri = format!("{}?downloadId={waiting_id}", path_of(&url));
        async move {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            router.oneshot(req).await.unwrap()
        }
    });
    wait_until_queued(&app, 1).await;

    let cancelled = app
        .request(
            "DELETE",
            &format!("/api/filesystem/download-queue/{waiting_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(cancelled.body["data"]["cancelled"], true);
    assert_eq!(waiting.await.unwrap().status(), StatusCode::CONFLICT);

    let unknown = app
        .request(
            "GET",
            &format!("/api/filesystem/download-queue/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clearing_the_queue_requires_an_owner() {
    let app = TestApp::new().await;

    let anonymous = app
        .request("DELETE", "/api/filesystem/download-queue", None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let token = app.owner_token();
    let cleared = app
        .request("DELETE", "/api/filesystem/download-queue", None, Some(&token))
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.body["data"], json!({ "cleared": 0 }));
}

#[tokio::test]
async fn test_health_reports_storage() {
    let app = TestApp::new().await;
    let health = app.request("GET", "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["data"]["status"], "ok");
    assert_eq!(health.body["data"]["storageProvider"], "local");
}

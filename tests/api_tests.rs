//! HTTP API Integration Tests
//!
//! Drives the router against a file-backed store the way the server does:
//! requests before init, recording through the REST endpoints, and the
//! counters surviving a close and reload.

use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

use jukebox::api::{create_router, AppState};
use jukebox::config::JukeboxConfig;

fn config_in(dir: &TempDir) -> JukeboxConfig {
    let root = dir.path();
    fs::create_dir_all(root.join("music")).unwrap();
    JukeboxConfig::from_lookup(root, |key| match key {
        "DB_FILENAME" => Some("db/stats.jsonl".to_string()),
        "STATS_DAYS" => Some("5".to_string()),
        "STATS_TZ_OFFSET" => Some("utc".to_string()),
        _ => None,
    })
}

async fn call(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn track(uri: &str, filename: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "filename": filename }).to_string()))
        .unwrap()
}

fn visit() -> Request<Body> {
    Request::builder().method("POST").uri("/api/trackvisit").body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_requests_wait_for_store_init() {
    let dir = TempDir::new().unwrap();
    let state = Arc::new(AppState::from_config(config_in(&dir)));

    let (status, body) = call(&state, visit()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "NOT_READY");

    state.store().init().unwrap();

    let (status, body) = call(&state, visit()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_jukebox_session_persists() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let music_dir = config.music_dir.clone();
    fs::write(music_dir.join("Opening.mp3"), b"ID3").unwrap();
    fs::write(music_dir.join("Closing.mp3"), b"ID3").unwrap();

    {
        let state = Arc::new(AppState::from_config(config.clone()));
        state.store().init().unwrap();

        call(&state, visit()).await;
        call(&state, track("/api/trackplay", "Closing")).await;
        call(&state, track("/api/trackplay", "Closing")).await;
        let (status, body) = call(&state, track("/api/trackdownload", "Opening")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Download tracked.");

        let (_, music) = call(&state, get("/api/music")).await;
        assert_eq!(music[0]["filename"], "Closing");
        assert_eq!(music[0]["play_count"], 2);
        assert_eq!(music[1]["filename"], "Opening");
        assert_eq!(music[1]["download_count"], 1);

        state.store().close().unwrap();
    }

    assert!(config.db_path.exists());

    let state = Arc::new(AppState::from_config(config));
    state.store().init().unwrap();

    let (status, stats) = call(&state, get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalVisits"], 1);
    assert_eq!(stats["tracks"][0]["filename"], "Closing");
    assert_eq!(stats["dailyData"]["labels"].as_array().unwrap().len(), 5);

    let plays: u64 = stats["dailyData"]["plays"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(plays, 2);

    let (_, body) = call(&state, track("/api/trackplay", "Closing")).await;
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_rejected_requests_leave_no_trace() {
    let dir = TempDir::new().unwrap();
    let state = Arc::new(AppState::from_config(config_in(&dir)));
    state.store().init().unwrap();

    let (status, _) = call(&state, track("/api/trackplay", "  ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&state, track("/api/trackdownload", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    assert!(!state.store().is_dirty());
    let (_, stats) = call(&state, get("/api/stats")).await;
    assert_eq!(stats["tracks"], serde_json::json!([]));
}

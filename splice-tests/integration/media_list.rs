//! Integration tests for the `/media-list` endpoint and directory scanner

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use splice_core::config::SpliceConfig;
use splice_core::list_media_files;
use splice_core::test_fixtures::create_media_dir;
use splice_web::{AppState, build_router};
use tower::ServiceExt;

async fn media_list(query: &str) -> (StatusCode, serde_json::Value) {
    let app = build_router(AppState::from_config(&SpliceConfig::default()));
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media-list{query}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_segments_ordered_by_first_number() {
    let dir = create_media_dir(&["seg10.mp4", "seg2.mp4", "seg1.mp4", "readme.txt"]);

    let (status, body) = media_list(&format!("?path={}", dir.path().display())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["files"],
        serde_json::json!(["seg1.mp4", "seg2.mp4", "seg10.mp4"])
    );
}

#[tokio::test]
async fn test_names_without_digits_keep_enumeration_order() {
    let dir = create_media_dir(&["b.webm", "a.mov", "c.avi"]);

    let enumerated: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();

    let scanned: Vec<String> = list_media_files(dir.path())
        .await
        .unwrap()
        .into_iter()
        .map(|file| file.name)
        .collect();

    assert_eq!(scanned, enumerated);
}

#[tokio::test]
async fn test_extension_digits_count_toward_key() {
    let dir = create_media_dir(&["outro.mp4", "seg5.webm", "intro.webm", "seg1.mp4"]);

    let (status, body) = media_list(&format!("?path={}", dir.path().display())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["files"],
        serde_json::json!(["intro.webm", "seg1.mp4", "outro.mp4", "seg5.webm"])
    );
}

#[tokio::test]
async fn test_ties_on_key_keep_enumeration_order() {
    let dir = create_media_dir(&["take2_b.mp4", "take2_a.mp4", "take1.mp4", "take3.mov"]);

    let enumerated_twos: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.starts_with("take2"))
        .collect();

    let scanned: Vec<String> = list_media_files(dir.path())
        .await
        .unwrap()
        .into_iter()
        .map(|file| file.name)
        .collect();

    assert_eq!(scanned.len(), 4);
    assert_eq!(scanned[0], "take1.mp4");
    assert_eq!(scanned[1..3], enumerated_twos[..]);
    assert_eq!(scanned[3], "take3.mov");
}

#[tokio::test]
async fn test_status_mapping() {
    let (status, body) = media_list("").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let dir = create_media_dir(&["seg1.mp4"]);
    let (status, body) =
        media_list(&format!("?path={}/nowhere", dir.path().display())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nowhere"));

    let file = dir.path().join("seg1.mp4");
    let (status, _) = media_list(&format!("?path={}", file.display())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_directory_lists_nothing() {
    let dir = create_media_dir(&["notes.txt"]);

    let (status, body) = media_list(&format!("?path={}", dir.path().display())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"], serde_json::json!([]));
}

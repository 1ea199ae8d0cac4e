//! Integration tests for byte-range media delivery over HTTP
//!
//! Requests go through the full router so status codes, headers, and bodies
//! are checked exactly as a media client would see them.

use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use splice_core::MediaServer;
use splice_core::config::StreamingConfig;
use splice_core::test_fixtures::{create_media_dir, patterned_bytes, write_media_file};
use splice_web::{AppState, build_router};
use tower::ServiceExt;

const FILE_SIZE: usize = 10_000;

fn router(root: &Path, read_chunk_size: usize) -> Router {
    build_router(AppState {
        media_server: MediaServer::new(
            Some(root.to_path_buf()),
            &StreamingConfig { read_chunk_size },
        ),
    })
}

async fn get(app: &Router, uri: &str, range: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(range) = range {
        request = request.header(header::RANGE, range);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn test_valid_ranges_return_exact_windows() {
    let dir = create_media_dir(&[]);
    let data = patterned_bytes(FILE_SIZE);
    write_media_file(dir.path(), "seg1.mp4", &data);
    // Small chunks so multi-chunk bodies are exercised
    let app = router(dir.path(), 1024);

    let last = FILE_SIZE as u64 - 1;
    let windows = [
        (0, 0),
        (0, 1023),
        (1, 1024),
        (4096, 8191),
        (5000, 5000),
        (9000, last),
        (0, last),
        (last, last),
    ];

    for (start, end) in windows {
        let response = get(&app, "/media/seg1.mp4", Some(&format!("bytes={start}-{end}"))).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT, "{start}-{end}");
        assert_eq!(
            response.headers()[header::CONTENT_RANGE],
            format!("bytes {start}-{end}/{FILE_SIZE}").as_str()
        );
        assert_eq!(
            response.headers()[header::CONTENT_LENGTH],
            (end - start + 1).to_string().as_str()
        );
        assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");

        let body = body_bytes(response).await;
        assert_eq!(body.len() as u64, end - start + 1);
        assert_eq!(body, &data[start as usize..=end as usize]);
    }
}

#[tokio::test]
async fn test_open_range_matches_full_download() {
    let dir = create_media_dir(&[]);
    let data = patterned_bytes(FILE_SIZE);
    write_media_file(dir.path(), "seg1.webm", &data);
    let app = router(dir.path(), 4096);

    let full = get(&app, "/media/seg1.webm", None).await;
    assert_eq!(full.status(), StatusCode::OK);
    assert_eq!(full.headers()[header::CONTENT_TYPE], "video/webm");
    assert_eq!(full.headers()[header::ACCEPT_RANGES], "bytes");
    assert_eq!(
        full.headers()[header::CONTENT_LENGTH],
        FILE_SIZE.to_string().as_str()
    );
    assert!(full.headers().get(header::CONTENT_RANGE).is_none());
    let full_body = body_bytes(full).await;

    let open = get(&app, "/media/seg1.webm", Some("bytes=0-")).await;
    assert_eq!(open.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        open.headers()[header::CONTENT_RANGE],
        format!("bytes 0-{}/{FILE_SIZE}", FILE_SIZE - 1).as_str()
    );
    let open_body = body_bytes(open).await;

    assert_eq!(full_body.len(), FILE_SIZE);
    assert_eq!(full_body, open_body);
    assert_eq!(full_body, data);

    let tail = get(&app, "/media/seg1.webm", Some("bytes=9990-")).await;
    assert_eq!(body_bytes(tail).await, &data[9990..]);
}

#[tokio::test]
async fn test_missing_file_is_not_found_with_or_without_range() {
    let dir = create_media_dir(&[]);
    let app = router(dir.path(), 1024);

    for range in [None, Some("bytes=0-10"), Some("bytes=abc-10")] {
        let response = get(&app, "/media/absent.mp4", range).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{range:?}");

        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("absent.mp4"));
    }
}

#[tokio::test]
async fn test_malformed_ranges_are_unsatisfiable() {
    let dir = create_media_dir(&[]);
    write_media_file(dir.path(), "seg1.mp4", &patterned_bytes(1000));
    let app = router(dir.path(), 1024);

    let rejected = [
        "bytes=abc-10",
        "bytes=10-abc",
        "bytes=500-100",
        "bytes=0-1000",
        "bytes=1000-",
        "bytes=-200",
        "bytes=0-1,5-9",
        "items=0-10",
        "bytes=",
    ];

    for range in rejected {
        let response = get(&app, "/media/seg1.mp4", Some(range)).await;
        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "{range}"
        );
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */1000");
    }
}

#[tokio::test]
async fn test_content_types_follow_extension() {
    let dir = create_media_dir(&["a.mp4", "b.ogg", "c.mov", "d.avi", "e.bin"]);
    let app = router(dir.path(), 1024);

    let expected = [
        ("a.mp4", "video/mp4"),
        ("b.ogg", "video/ogg"),
        ("c.mov", "video/quicktime"),
        ("d.avi", "video/x-msvideo"),
        ("e.bin", "application/octet-stream"),
    ];
    for (name, content_type) in expected {
        let response = get(&app, &format!("/media/{name}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], content_type);
    }
}

#[tokio::test]
async fn test_concurrent_overlapping_ranges() {
    let dir = create_media_dir(&[]);
    let data = patterned_bytes(FILE_SIZE);
    write_media_file(dir.path(), "seg1.mp4", &data);
    let app = router(dir.path(), 512);

    let requests = (0..16u64).map(|i| {
        let app = app.clone();
        let start = i * 300;
        let end = start + 2999;
        tokio::spawn(async move {
            let range = format!("bytes={start}-{end}");
            let response = get(&app, "/media/seg1.mp4", Some(&range)).await;
            assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
            (start, end, body_bytes(response).await)
        })
    });

    for handle in futures::future::join_all(requests).await {
        let (start, end, body) = handle.unwrap();
        assert_eq!(body, &data[start as usize..=end as usize]);
    }
}

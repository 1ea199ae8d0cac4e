//! Integration tests for segment providers against a live local server
//!
//! The Splice router is bound to an ephemeral port next to a static
//! directory index page, so remote listings are scraped and then fetched
//! over real HTTP.

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use splice_core::MediaServer;
use splice_core::config::{ListingConfig, StreamingConfig};
use splice_core::test_fixtures::{create_media_dir, patterned_bytes, write_media_file};
use splice_listing::{
    FALLBACK_SEGMENT_NAMES, ListingOrigin, LocalDirectoryProvider, RemoteListingProvider,
    SegmentListProvider,
};
use splice_web::{AppState, build_router};
use url::Url;

const INDEX_PAGE: &str = r#"<!DOCTYPE HTML>
<html><body><h1>Directory listing</h1><ul>
<li><a href="/media/seg10.mp4">seg10.mp4</a></li>
<li><a href="/media/seg2.mp4">seg2.mp4</a></li>
<li><a href="/media/seg1.mp4">seg1.mp4</a></li>
<li><a href="/media/seg1.mp4">(mirror)</a></li>
<li><a href="/media/poster.png">poster.png</a></li>
</ul></body></html>"#;

async fn spawn_server(root: &std::path::Path) -> Url {
    spawn_server_with_root(Some(root.to_path_buf())).await
}

async fn spawn_server_with_root(root: Option<std::path::PathBuf>) -> Url {
    let app = build_router(AppState {
        media_server: MediaServer::new(root, &StreamingConfig::default()),
    })
    .merge(
        Router::new()
            .route("/index/", get(|| async { Html(INDEX_PAGE) }))
            .route("/empty/", get(|| async { Html("<p>Nothing to see</p>") })),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Url::parse(&format!("http://{address}/")).unwrap()
}

#[tokio::test]
async fn test_remote_listing_segments_are_servable() {
    let dir = create_media_dir(&[]);
    for name in ["seg1.mp4", "seg2.mp4", "seg10.mp4"] {
        write_media_file(dir.path(), name, &patterned_bytes(2048));
    }
    let base = spawn_server(dir.path()).await;

    let provider =
        RemoteListingProvider::new(base.join("index/").unwrap(), &ListingConfig::default())
            .unwrap();
    let listing = provider.segments().await.unwrap();

    assert_eq!(listing.origin, ListingOrigin::Parsed);
    let paths: Vec<&str> = listing.segments.iter().map(Url::path).collect();
    assert_eq!(
        paths,
        vec!["/media/seg1.mp4", "/media/seg2.mp4", "/media/seg10.mp4"]
    );

    let client = reqwest::Client::new();
    for segment in &listing.segments {
        let response = client
            .get(segment.clone())
            .header("Range", "bytes=1024-")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers()["content-range"].to_str().unwrap(),
            "bytes 1024-2047/2048"
        );
        assert_eq!(response.bytes().await.unwrap().len(), 1024);
    }
}

#[tokio::test]
async fn test_unparseable_remote_listing_is_marked_fallback() {
    let dir = create_media_dir(&[]);
    let base = spawn_server(dir.path()).await;

    let provider =
        RemoteListingProvider::new(base.join("empty/").unwrap(), &ListingConfig::default())
            .unwrap();
    let listing = provider.segments().await.unwrap();

    assert!(listing.is_fallback());
    let names: Vec<&str> = listing
        .segments
        .iter()
        .map(|url| url.path_segments().unwrap().next_back().unwrap())
        .collect();
    assert_eq!(names, FALLBACK_SEGMENT_NAMES);
}

#[tokio::test]
async fn test_missing_remote_listing_is_network_error() {
    let dir = create_media_dir(&[]);
    let base = spawn_server(dir.path()).await;

    let provider =
        RemoteListingProvider::new(base.join("nowhere/").unwrap(), &ListingConfig::default())
            .unwrap();

    assert!(matches!(
        provider.segments().await,
        Err(splice_listing::ListingError::Network { .. })
    ));
}

#[tokio::test]
async fn test_local_provider_urls_resolve_on_server() {
    let dir = create_media_dir(&[]);
    let show = dir.path().join("my show");
    std::fs::create_dir(&show).unwrap();
    write_media_file(&show, "ep 2.webm", &patterned_bytes(64));
    write_media_file(&show, "ep 1.webm", &patterned_bytes(32));
    let base = spawn_server(dir.path()).await;

    let provider = LocalDirectoryProvider::new(&show, base).with_media_root(dir.path());
    let listing = provider.segments().await.unwrap();
    assert_eq!(listing.segments.len(), 2);
    assert!(listing.segments[0].path().ends_with("/my%20show/ep%201.webm"));

    let client = reqwest::Client::new();
    let mut sizes = Vec::new();
    for segment in &listing.segments {
        let response = client.get(segment.clone()).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "video/webm"
        );
        sizes.push(response.bytes().await.unwrap().len());
    }
    assert_eq!(sizes, vec![32, 64]);
}

#[tokio::test]
async fn test_relative_directory_segments_resolve_without_root() {
    let dir = tempfile::Builder::new()
        .prefix("relative-show")
        .tempdir_in(".")
        .unwrap();
    write_media_file(dir.path(), "seg2.mp4", &patterned_bytes(20));
    write_media_file(dir.path(), "seg1.mp4", &patterned_bytes(10));
    let relative = std::path::PathBuf::from(dir.path().file_name().unwrap());
    let base = spawn_server_with_root(None).await;

    let listing = LocalDirectoryProvider::new(&relative, base)
        .segments()
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let mut sizes = Vec::new();
    for segment in &listing.segments {
        let response = client.get(segment.clone()).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK, "{segment}");
        sizes.push(response.bytes().await.unwrap().len());
    }
    assert_eq!(sizes, vec![10, 20]);
}

//! Range-aware media file streaming

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::server::AppState;

/// Extract the Range header value from request headers
///
/// Returns None if no range header is present or it is not valid UTF-8.
pub fn extract_range_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::RANGE)
        .and_then(|range| range.to_str().ok())
}

/// Serves `/media/{*path}` whole or as a byte range.
///
/// # Errors
/// - `ApiError::Streaming` - File missing, range unsatisfiable, or I/O failure
/// - `ApiError::Internal` - Response headers could not be encoded
pub async fn stream_media(
    State(state): State<AppState>,
    Path(request_path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let resource_path = state.media_server.resolve(&request_path)?;
    let range_header = extract_range_header(&headers);

    let media = state
        .media_server
        .serve(&resource_path, range_header)
        .await?;

    let status = StatusCode::from_u16(media.status_code()).map_err(|e| ApiError::Internal {
        reason: e.to_string(),
    })?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(media.content_type),
    );
    response_headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(media.content_length),
    );
    response_headers.insert(
        header::ACCEPT_RANGES,
        HeaderValue::from_static(media.accept_ranges()),
    );
    if let Some(content_range) = media.content_range() {
        let value = HeaderValue::from_str(&content_range).map_err(|e| ApiError::Internal {
            reason: e.to_string(),
        })?;
        response_headers.insert(header::CONTENT_RANGE, value);
    }

    tracing::debug!(
        "{} {} ({} bytes, range: {:?})",
        status.as_u16(),
        resource_path.display(),
        media.content_length,
        range_header
    );

    let body = Body::from_stream(media.into_body_stream());
    Ok((status, response_headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use http_body_util::BodyExt;
    use splice_core::MediaServer;
    use splice_core::config::StreamingConfig;
    use tower::ServiceExt;

    use super::*;
    use crate::server::build_router;

    fn rooted_state(root: &std::path::Path) -> AppState {
        AppState {
            media_server: MediaServer::new(
                Some(root.to_path_buf()),
                &StreamingConfig::default(),
            ),
        }
    }

    #[test]
    fn test_extract_range_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_range_header(&headers), None);

        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-99"));
        assert_eq!(extract_range_header(&headers), Some("bytes=0-99"));
    }

    #[tokio::test]
    async fn test_partial_content_headers() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("seg1.mp4"), &data).unwrap();

        let response = build_router(rooted_state(dir.path()))
            .oneshot(
                Request::builder()
                    .uri("/media/seg1.mp4")
                    .header(header::RANGE, "bytes=100-199")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 100-199/1000");
        assert_eq!(headers[header::CONTENT_LENGTH], "100");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], &data[100..200]);
    }

    #[tokio::test]
    async fn test_parent_traversal_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.mp4"), b"hidden").unwrap();

        let response = build_router(rooted_state(&root))
            .oneshot(
                Request::builder()
                    .uri("/media/..%2Fsecret.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

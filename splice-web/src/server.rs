//! JSON API server for Splice
//!
//! Exposes the media directory listing and range-aware file streaming to
//! browser players and other HTTP clients.

use axum::Router;
use axum::routing::get;
use splice_core::{MediaServer, SpliceError};
use splice_core::config::SpliceConfig;
use tower_http::cors::CorsLayer;

use crate::handlers::{media_list, stream_media};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Resolves request paths and serves file bodies
    pub media_server: MediaServer,
}

impl AppState {
    /// Builds handler state from configuration.
    pub fn from_config(config: &SpliceConfig) -> Self {
        Self {
            media_server: MediaServer::new(config.server.media_root.clone(), &config.streaming),
        }
    }
}

/// Builds the API router with permissive CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/media-list", get(media_list))
        .route("/media/{*path}", get(stream_media))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the configured address and serves the API until the process exits.
///
/// # Errors
/// - `SpliceError::Configuration` - Settings are invalid or the media root is not a directory
/// - `SpliceError::Io` - Binding the listener or accepting connections failed
pub async fn run_server(config: SpliceConfig) -> splice_core::Result<()> {
    config.validate()?;
    if let Some(root) = &config.server.media_root {
        let is_dir = tokio::fs::metadata(root)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(SpliceError::Configuration {
                reason: format!("media root {} is not a directory", root.display()),
            });
        }
    }

    let state = AppState::from_config(&config);
    let app = build_router(state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    match &config.server.media_root {
        Some(root) => tracing::info!(
            "Splice media server running on http://{address} (media root: {})",
            root.display()
        ),
        None => tracing::info!("Splice media server running on http://{address}"),
    }

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_cors_headers_present() {
        let app = build_router(AppState::from_config(&SpliceConfig::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/media-list")
                    .header(header::ORIGIN, "http://player.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn test_run_server_rejects_missing_media_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SpliceConfig::default();
        config.server.port = 0;
        config.server.media_root = Some(dir.path().join("absent"));

        let err = run_server(config).await.unwrap_err();
        assert!(matches!(err, SpliceError::Configuration { .. }));
        assert!(err.user_message().contains("absent"));
    }

    #[tokio::test]
    async fn test_run_server_reports_bind_failure_as_io() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = SpliceConfig::default();
        config.server.port = taken.local_addr().unwrap().port();

        let err = run_server(config).await.unwrap_err();
        assert!(matches!(err, SpliceError::Io(_)));
        assert!(!err.is_user_error());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = build_router(AppState::from_config(&SpliceConfig::default()));

        let response = app
            .oneshot(Request::builder().uri("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

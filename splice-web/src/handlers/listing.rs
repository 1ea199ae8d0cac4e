//! Directory listing of playable segment files

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use splice_core::list_media_files;

use crate::error::ApiError;
use crate::server::AppState;

/// Query parameters for `/media-list`
#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    /// Directory to scan
    pub path: Option<String>,
}

/// Body returned by `/media-list`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaListResponse {
    /// Segment file names in playback order
    pub files: Vec<String>,
}

/// Lists the media files of a directory in segment order.
///
/// # Errors
/// - `ApiError::BadRequest` - `path` missing or empty
/// - `ApiError::Scan` - Directory missing or unreadable
/// - `ApiError::Streaming` - Path escapes the configured media root
pub async fn media_list(
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<MediaListResponse>, ApiError> {
    let Some(requested) = query.path.filter(|p| !p.trim().is_empty()) else {
        return Err(ApiError::BadRequest {
            reason: "Query parameter 'path' is required".to_string(),
        });
    };

    let directory = state.media_server.resolve_directory(&requested)?;
    let files = list_media_files(&directory).await?;

    tracing::info!(
        "Listed {} media files in {}",
        files.len(),
        directory.display()
    );

    Ok(Json(MediaListResponse {
        files: files.into_iter().map(|file| file.name).collect(),
    }))
}

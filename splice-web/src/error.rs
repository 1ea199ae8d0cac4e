//! Mapping of subsystem errors onto HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use splice_core::{ScanError, StreamingError};

/// Errors returned by API handlers.
///
/// Every variant renders as a JSON `{ "error": ... }` body. Server-side
/// failures are logged when rendered.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request is missing or has invalid parameters
    #[error("{reason}")]
    BadRequest {
        /// Description returned to the client
        reason: String,
    },

    /// Directory scan failed
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Media delivery failed
    #[error(transparent)]
    Streaming(#[from] StreamingError),

    /// Response could not be assembled
    #[error("Failed to build response: {reason}")]
    Internal {
        /// Description of the failure
        reason: String,
    },
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Scan(ScanError::DirectoryNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Scan(ScanError::ReadFailed { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Streaming(StreamingError::FileNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Streaming(StreamingError::RangeNotSatisfiable { .. }) => {
                StatusCode::RANGE_NOT_SATISFIABLE
            }
            ApiError::Streaming(StreamingError::Io { .. }) | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Rejected request ({status}): {self}");
        }

        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();

        if let ApiError::Streaming(StreamingError::RangeNotSatisfiable { total_size }) = self {
            response.headers_mut().insert(
                header::CONTENT_RANGE,
                HeaderValue::from_str(&format!("bytes */{total_size}"))
                    .unwrap_or_else(|_| HeaderValue::from_static("bytes */*")),
            );
        }

        response
    }
}

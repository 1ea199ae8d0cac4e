//! Splice Core - Segment discovery, range serving, and playback sequencing
//!
//! This crate provides the building blocks for delivering pre-recorded video
//! segments as one continuous stream: directory scanning, HTTP range
//! semantics over local files, and the segment playback state machine.

pub mod config;
pub mod media;
pub mod playback;
pub mod streaming;
pub mod tracing_setup;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

// Re-export main types for convenient access
pub use config::SpliceConfig;
pub use media::{MediaExtension, MediaFile, ScanError, list_media_files};
pub use playback::{
    PlaybackError, PlaybackHandle, PlaybackSnapshot, PlaybackState, PlaybackSurface,
    spawn_playback_controller,
};
pub use streaming::{ByteRange, MediaResponse, MediaServer, StreamingError};

/// Core errors that can bubble up from any Splice subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Streaming error: {0}")]
    Streaming(#[from] StreamingError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpliceError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            SpliceError::Scan(e) => match e {
                ScanError::DirectoryNotFound { path } => {
                    format!("Directory not found: {}", path.display())
                }
                ScanError::ReadFailed { .. } => "Failed to read directory".to_string(),
            },
            SpliceError::Streaming(e) => match e {
                StreamingError::FileNotFound { path } => {
                    format!("File not found: {}", path.display())
                }
                StreamingError::RangeNotSatisfiable { .. } => {
                    "Requested range not satisfiable".to_string()
                }
                StreamingError::Io { .. } => "Failed to serve media file".to_string(),
            },
            SpliceError::Playback(e) => e.to_string(),
            SpliceError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            SpliceError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SpliceError::Configuration { .. }
                | SpliceError::Scan(ScanError::DirectoryNotFound { .. })
                | SpliceError::Streaming(StreamingError::RangeNotSatisfiable { .. })
                | SpliceError::Playback(PlaybackError::EmptySegments)
        )
    }
}

pub type Result<T> = std::result::Result<T, SpliceError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_user_error_classification() {
        let missing = SpliceError::from(ScanError::DirectoryNotFound {
            path: PathBuf::from("/nope"),
        });
        assert!(missing.is_user_error());
        assert_eq!(missing.user_message(), "Directory not found: /nope");

        let io = SpliceError::from(std::io::Error::other("disk"));
        assert!(!io.is_user_error());
    }

    #[test]
    fn test_range_error_message() {
        let err = SpliceError::from(StreamingError::RangeNotSatisfiable { total_size: 10 });
        assert!(err.is_user_error());
        assert_eq!(err.user_message(), "Requested range not satisfiable");
    }
}

//! Range-aware media delivery.
//!
//! Transport-agnostic: handlers in the web crate translate [`MediaResponse`]
//! and [`StreamingError`] into HTTP responses.

pub mod range;
pub mod server;

use std::path::PathBuf;

pub use range::{ByteRange, parse_range_header};
pub use server::{MediaResponse, MediaServer, ResponseKind};

/// Errors that occur while serving media files.
#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    /// Requested file does not exist or is not a regular file
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Resolved path that was requested
        path: PathBuf,
    },

    /// Range header is malformed or outside the file
    #[error("Range not satisfiable for file of {total_size} bytes")]
    RangeNotSatisfiable {
        /// Size of the file the range was checked against
        total_size: u64,
    },

    /// Unexpected I/O failure opening or reading the file
    #[error("I/O error serving {}: {source}", path.display())]
    Io {
        /// File being served
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },
}

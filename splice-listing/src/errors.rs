//! Error types for segment list discovery.

use splice_core::ScanError;
use thiserror::Error;

/// Errors that can occur while producing a segment list.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Directory exists but holds no playable files.
    #[error("No media files found in {location}")]
    NoFilesFound {
        /// Directory or listing that was searched
        location: String,
    },

    /// Remote listing could not be fetched.
    #[error("Network error fetching {url}: {reason}")]
    Network {
        /// Listing URL that was requested
        url: String,
        /// The reason for the network error
        reason: String,
    },

    /// Base URL cannot have path segments appended.
    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl {
        /// The rejected URL
        url: String,
    },

    /// Local directory scan failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Marker attached to a listing built from the conventional fallback names
/// because the scraped HTML contained no playable links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Listing contained no playable segment links")]
pub struct ListingParseExhausted;

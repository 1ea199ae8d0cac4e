//! Splice Listing - Segment list discovery

#![deny(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Produces the ordered segment URLs a playback session consumes, either from
//! a local directory served by the Splice API or by scraping a remote HTML
//! directory index.

pub mod errors;
pub mod providers;
pub mod remote;

// Re-export main types
pub use errors::{ListingError, ListingParseExhausted};
pub use providers::{LocalDirectoryProvider, RemoteListingProvider, SegmentListProvider};
pub use remote::{FALLBACK_SEGMENT_NAMES, ListingOrigin, SegmentListing, parse_listing};

/// Convenience type alias for Results with ListingError.
pub type Result<T> = std::result::Result<T, ListingError>;

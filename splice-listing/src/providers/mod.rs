//! Provider implementations for segment list discovery.

use async_trait::async_trait;

use crate::errors::ListingError;
use crate::remote::SegmentListing;

pub mod http;
pub mod local;

pub use http::RemoteListingProvider;
pub use local::LocalDirectoryProvider;

/// Trait for segment list providers.
///
/// Implementations produce the ordered, absolute segment URLs for one
/// playback session from different backends (a local directory served by
/// the Splice API, a remote HTML directory index).
#[async_trait]
pub trait SegmentListProvider: Send + Sync + std::fmt::Debug {
    /// Produce the ordered segment list.
    ///
    /// # Errors
    /// - `ListingError::NoFilesFound` - Source holds no playable files
    /// - `ListingError::Network` - Remote listing could not be fetched
    /// - `ListingError::Scan` - Local directory missing or unreadable
    async fn segments(&self) -> Result<SegmentListing, ListingError>;
}

//! HTTP request handlers organized by functionality

pub mod listing;
pub mod media;

// Re-export handler functions
pub use listing::{MediaListQuery, MediaListResponse, media_list};
pub use media::{extract_range_header, stream_media};

//! Integration tests for Splice
//!
//! These tests drive the public surfaces of the workspace crates together:
//! the HTTP API over real files, segment providers feeding the playback
//! controller, and remote listings fetched from a live local server.

#[path = "integration/media_list.rs"]
mod media_list;
#[path = "integration/playback_sessions.rs"]
mod playback_sessions;
#[path = "integration/range_serving.rs"]
mod range_serving;
#[path = "integration/segment_listing.rs"]
mod segment_listing;

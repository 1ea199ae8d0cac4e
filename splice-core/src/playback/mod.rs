//! Segment playback sequencing.
//!
//! A [`PlaybackSession`] holds the state machine for one ordered run over a
//! segment list. The controller actor owns the session, the rendering surface,
//! and the load-timeout timer, and is driven entirely by asynchronous signals
//! through a [`PlaybackHandle`].

pub mod commands;
pub mod controller;
pub mod handle;
pub mod session;
pub mod state;
pub mod surface;

use url::Url;

pub use commands::{InternalEvent, PlaybackCommand};
pub use controller::spawn_playback_controller;
pub use handle::PlaybackHandle;
pub use session::{FailureOutcome, LoadRequest, PlaybackSession, StaleSignal, source_origin};
pub use state::{
    LoadTicket, MediaErrorKind, PlaybackSnapshot, PlaybackState, SessionId, SignalOutcome,
};
pub use surface::{PlaybackSurface, SurfaceSignals, TransitionFrame};

/// Errors surfaced by the playback controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    /// `start` was called without segments
    #[error("Cannot start playback without segments")]
    EmptySegments,

    /// Surface cannot decode the source
    #[error("Unsupported media type: {url}")]
    UnsupportedMediaType { url: Url },

    /// Network failure or other decode error
    #[error("Network error loading {url}")]
    NetworkError { url: Url },

    /// Load was aborted before completing
    #[error("Load aborted for {url}")]
    AbortError { url: Url },

    /// No ready or error signal arrived within the load window
    #[error("Timed out after {timeout_ms} ms waiting for {origin}")]
    LoadTimeout { origin: String, timeout_ms: u64 },

    /// Operation requires a running session
    #[error("No active playback session")]
    NoActiveSession,

    /// Operation is not valid in the current state
    #[error("Cannot {operation} while {from}")]
    InvalidTransition {
        from: PlaybackState,
        operation: &'static str,
    },

    /// Controller actor has stopped
    #[error("Playback controller has shut down")]
    ControllerShutdown,
}

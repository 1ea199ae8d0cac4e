//! Playback states, signal identities, and the snapshot published to
//! subscribers.

use super::PlaybackError;

/// Lifecycle state of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// No segment requested
    #[default]
    Idle,
    /// A segment load is outstanding
    Loading,
    /// Current segment is playing
    Playing,
    /// Segment ended; transition frame shown while the next load is issued
    Transitioning,
    /// Load or playback failed; waiting for a manual retry
    Error,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Transitioning => "transitioning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Failure classes reported by a playback surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaErrorKind {
    /// Source format cannot be decoded
    Unsupported,
    /// Fetch was aborted; recoverable by manual retry
    Aborted,
    /// Network failure or any other decode error
    NetworkOrOther,
}

/// Identity of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Identity of one load attempt within a session.
///
/// Surfaces receive a ticket with every load and must echo it back with
/// every signal. Signals carrying any ticket other than the session's
/// outstanding attempt are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub session: SessionId,
    pub attempt: u64,
}

impl std::fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/attempt-{}", self.session, self.attempt)
    }
}

/// Whether a surface signal was applied to the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Applied,
    /// Signal belonged to a torn-down session or a resolved attempt
    Stale,
}

/// Point-in-time view of the controller for UI layers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub session_id: Option<SessionId>,
    pub state: PlaybackState,
    pub current_index: usize,
    pub segment_count: usize,
    pub last_error: Option<PlaybackError>,
    /// `manual_retry` is currently accepted
    pub retryable: bool,
    /// Current index is playing the configured fallback source
    pub on_fallback: bool,
}

//! Messages processed by the playback controller actor.

use tokio::sync::oneshot;
use url::Url;

use super::PlaybackError;
use super::state::{LoadTicket, MediaErrorKind, SessionId, SignalOutcome};

/// Requests sent through a [`super::PlaybackHandle`].
///
/// Each command carries a response channel; the actor answers after the
/// transition and its surface side effects have been applied.
pub enum PlaybackCommand {
    /// Start a new session, superseding any active one.
    Start {
        segments: Vec<Url>,
        responder: oneshot::Sender<Result<SessionId, PlaybackError>>,
    },
    /// Deliver a surface signal and report whether it applied.
    Signal {
        event: InternalEvent,
        responder: oneshot::Sender<SignalOutcome>,
    },
    /// Re-issue the load for the current index.
    ManualRetry {
        responder: oneshot::Sender<Result<LoadTicket, PlaybackError>>,
    },
    /// Tear down the active session.
    Stop { responder: oneshot::Sender<()> },
    /// Stop the actor after tearing down any session.
    Shutdown { responder: oneshot::Sender<()> },
}

/// Fire-and-forget events from surfaces and the load timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    Ready(LoadTicket),
    Ended(LoadTicket),
    Failed(LoadTicket, MediaErrorKind),
    LoadTimeout(LoadTicket),
}

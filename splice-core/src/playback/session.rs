//! Synchronous state machine for one playback session.
//!
//! The session decides transitions and hands back the load the caller must
//! issue; it never touches the surface or timers itself.

use url::Url;

use super::PlaybackError;
use super::state::{LoadTicket, MediaErrorKind, PlaybackSnapshot, PlaybackState, SessionId};
use super::surface::TransitionFrame;

/// A load the controller must issue on the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub source: Url,
    pub index: usize,
}

/// Result of a failed load or playback attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureOutcome {
    /// Session moved to `Error`
    Failed(PlaybackError),
    /// Fallback source substituted for the failing segment
    Substituted(LoadRequest),
    /// Attempt aborted; session stays in place awaiting a manual retry
    Aborted(PlaybackError),
}

/// Signal did not match the outstanding attempt in the expected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleSignal;

/// One ordered run over a fixed segment list.
#[derive(Debug)]
pub struct PlaybackSession {
    id: SessionId,
    segments: Vec<Url>,
    current_index: usize,
    state: PlaybackState,
    last_error: Option<PlaybackError>,
    attempts: u64,
    outstanding: Option<LoadTicket>,
    aborted: bool,
    fallback: Option<Url>,
    on_fallback: bool,
    transition_frame: Option<TransitionFrame>,
}

impl PlaybackSession {
    /// Creates an idle session over `segments`.
    ///
    /// # Errors
    /// - `PlaybackError::EmptySegments` - No segments supplied
    pub fn new(
        id: SessionId,
        segments: Vec<Url>,
        fallback: Option<Url>,
    ) -> Result<Self, PlaybackError> {
        if segments.is_empty() {
            return Err(PlaybackError::EmptySegments);
        }
        Ok(Self {
            id,
            segments,
            current_index: 0,
            state: PlaybackState::Idle,
            last_error: None,
            attempts: 0,
            outstanding: None,
            aborted: false,
            fallback,
            on_fallback: false,
            transition_frame: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn segments(&self) -> &[Url] {
        &self.segments
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    pub fn transition_frame(&self) -> Option<&TransitionFrame> {
        self.transition_frame.as_ref()
    }

    /// Ticket of the attempt currently awaiting signals.
    pub fn outstanding(&self) -> Option<LoadTicket> {
        self.outstanding
    }

    /// Whether `manual_retry` is accepted right now.
    pub fn is_retryable(&self) -> bool {
        self.state == PlaybackState::Error || self.aborted
    }

    /// Issues the first load. `Idle|Error → Loading` at index 0.
    ///
    /// # Errors
    /// - `PlaybackError::InvalidTransition` - Session already running
    pub fn begin(&mut self) -> Result<LoadRequest, PlaybackError> {
        if !matches!(self.state, PlaybackState::Idle | PlaybackState::Error) {
            return Err(PlaybackError::InvalidTransition {
                from: self.state,
                operation: "start",
            });
        }
        self.current_index = 0;
        self.last_error = None;
        Ok(self.issue_load(false))
    }

    /// `Loading → Playing` for the outstanding attempt.
    ///
    /// # Errors
    /// - `StaleSignal` - Ticket is not outstanding or no load is pending
    pub fn segment_ready(&mut self, ticket: LoadTicket) -> Result<(), StaleSignal> {
        self.expect(ticket, &[PlaybackState::Loading])?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// `Playing → Transitioning` when the current segment ends.
    ///
    /// Call [`PlaybackSession::advance`] once the transition frame is captured.
    ///
    /// # Errors
    /// - `StaleSignal` - Ticket is not outstanding or nothing is playing
    pub fn segment_ended(&mut self, ticket: LoadTicket) -> Result<(), StaleSignal> {
        self.expect(ticket, &[PlaybackState::Playing])?;
        self.state = PlaybackState::Transitioning;
        self.outstanding = None;
        Ok(())
    }

    /// Stores the captured frame and loads the next index with wraparound.
    /// `Transitioning → Loading`.
    ///
    /// # Errors
    /// - `PlaybackError::InvalidTransition` - Session is not transitioning
    pub fn advance(
        &mut self,
        frame: Option<TransitionFrame>,
    ) -> Result<LoadRequest, PlaybackError> {
        if self.state != PlaybackState::Transitioning {
            return Err(PlaybackError::InvalidTransition {
                from: self.state,
                operation: "advance",
            });
        }
        if frame.is_some() {
            self.transition_frame = frame;
        }
        self.current_index = (self.current_index + 1) % self.segments.len();
        Ok(self.issue_load(false))
    }

    /// The outstanding load did not resolve within the timeout window.
    ///
    /// # Errors
    /// - `StaleSignal` - Attempt already resolved or superseded
    pub fn load_timed_out(
        &mut self,
        ticket: LoadTicket,
        timeout_ms: u64,
    ) -> Result<FailureOutcome, StaleSignal> {
        self.expect(ticket, &[PlaybackState::Loading])?;
        let error = PlaybackError::LoadTimeout {
            origin: source_origin(&self.attempted_source()),
            timeout_ms,
        };
        Ok(self.fail(error))
    }

    /// Classifies a surface failure for the outstanding attempt.
    ///
    /// # Errors
    /// - `StaleSignal` - Attempt already resolved or superseded
    pub fn playback_error(
        &mut self,
        ticket: LoadTicket,
        kind: MediaErrorKind,
    ) -> Result<FailureOutcome, StaleSignal> {
        self.expect(ticket, &[PlaybackState::Loading, PlaybackState::Playing])?;
        let url = self.attempted_source();

        match kind {
            MediaErrorKind::Aborted => {
                let error = PlaybackError::AbortError { url };
                self.outstanding = None;
                self.aborted = true;
                self.last_error = Some(error.clone());
                Ok(FailureOutcome::Aborted(error))
            }
            MediaErrorKind::Unsupported => {
                Ok(self.fail(PlaybackError::UnsupportedMediaType { url }))
            }
            MediaErrorKind::NetworkOrOther => Ok(self.fail(PlaybackError::NetworkError { url })),
        }
    }

    /// Re-issues the load for the current index from `Error` or an abort.
    ///
    /// # Errors
    /// - `PlaybackError::InvalidTransition` - Nothing to retry
    pub fn manual_retry(&mut self) -> Result<LoadRequest, PlaybackError> {
        if !self.is_retryable() {
            return Err(PlaybackError::InvalidTransition {
                from: self.state,
                operation: "manual_retry",
            });
        }
        self.last_error = None;
        Ok(self.issue_load(false))
    }

    /// Ends the session, discarding the transition frame. `→ Idle`.
    pub fn teardown(&mut self) {
        self.state = PlaybackState::Idle;
        self.outstanding = None;
        self.aborted = false;
        self.transition_frame = None;
    }

    /// Current view for subscribers.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            session_id: Some(self.id),
            state: self.state,
            current_index: self.current_index,
            segment_count: self.segments.len(),
            last_error: self.last_error.clone(),
            retryable: self.is_retryable(),
            on_fallback: self.on_fallback,
        }
    }

    fn expect(&self, ticket: LoadTicket, states: &[PlaybackState]) -> Result<(), StaleSignal> {
        if self.outstanding == Some(ticket) && states.contains(&self.state) {
            Ok(())
        } else {
            Err(StaleSignal)
        }
    }

    fn fail(&mut self, error: PlaybackError) -> FailureOutcome {
        self.outstanding = None;
        self.last_error = Some(error.clone());

        if !self.on_fallback && self.fallback.is_some() {
            return FailureOutcome::Substituted(self.issue_load(true));
        }

        self.state = PlaybackState::Error;
        FailureOutcome::Failed(error)
    }

    fn attempted_source(&self) -> Url {
        match (&self.fallback, self.on_fallback) {
            (Some(fallback), true) => fallback.clone(),
            _ => self.segments[self.current_index].clone(),
        }
    }

    fn issue_load(&mut self, use_fallback: bool) -> LoadRequest {
        self.attempts += 1;
        self.aborted = false;
        self.on_fallback = use_fallback && self.fallback.is_some();
        self.state = PlaybackState::Loading;

        let ticket = LoadTicket {
            session: self.id,
            attempt: self.attempts,
        };
        self.outstanding = Some(ticket);

        LoadRequest {
            ticket,
            source: self.attempted_source(),
            index: self.current_index,
        }
    }
}

/// `scheme://host:port` of a source, for diagnostics.
///
/// # Examples
/// ```
/// use splice_core::playback::source_origin;
/// use url::Url;
///
/// let url = Url::parse("https://cdn.example.com/show/seg1.mp4").unwrap();
/// assert_eq!(source_origin(&url), "https://cdn.example.com:443");
/// ```
pub fn source_origin(url: &Url) -> String {
    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
        (Some(host), None) => format!("{}://{}", url.scheme(), host),
        _ => format!("{}://", url.scheme()),
    }
}

//! Actor owning the active session, the surface, and the load timer.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;

use super::PlaybackError;
use super::commands::{InternalEvent, PlaybackCommand};
use super::handle::PlaybackHandle;
use super::session::{FailureOutcome, LoadRequest, PlaybackSession};
use super::state::{LoadTicket, PlaybackSnapshot, SessionId, SignalOutcome};
use super::surface::{PlaybackSurface, SurfaceSignals};
use crate::config::PlaybackConfig;

/// Spawns the playback controller actor and returns its handle.
///
/// The surface is owned by the actor from here on; it is detached when a
/// session is torn down and dropped when the actor stops. Must be called from
/// within a tokio runtime.
pub fn spawn_playback_controller<S>(config: PlaybackConfig, surface: S) -> PlaybackHandle
where
    S: PlaybackSurface,
{
    let (sender, receiver) = mpsc::channel(64);
    let (event_sender, event_receiver) = mpsc::unbounded_channel();
    let (snapshot_sender, snapshot_receiver) = watch::channel(PlaybackSnapshot::default());

    let controller = PlaybackController {
        config,
        surface,
        session: None,
        next_session_id: 1,
        load_timer: None,
        events: event_sender,
        snapshots: snapshot_sender,
    };

    tokio::spawn(async move {
        run_actor_loop(controller, receiver, event_receiver).await;
    });

    PlaybackHandle::new(sender, snapshot_receiver)
}

/// Processes commands and surface/timer events one at a time, in order.
async fn run_actor_loop<S: PlaybackSurface>(
    mut controller: PlaybackController<S>,
    mut receiver: mpsc::Receiver<PlaybackCommand>,
    mut events: mpsc::UnboundedReceiver<InternalEvent>,
) {
    tracing::debug!("Playback controller started");

    loop {
        tokio::select! {
            command = receiver.recv() => {
                let Some(command) = command else { break };
                if !controller.handle_command(command) {
                    break;
                }
            }
            Some(event) = events.recv() => {
                controller.handle_event(event);
            }
        }
    }

    controller.teardown();
    tracing::debug!("Playback controller stopped");
}

struct LoadTimer {
    ticket: LoadTicket,
    task: JoinHandle<()>,
}

struct PlaybackController<S> {
    config: PlaybackConfig,
    surface: S,
    session: Option<PlaybackSession>,
    next_session_id: u64,
    load_timer: Option<LoadTimer>,
    events: mpsc::UnboundedSender<InternalEvent>,
    snapshots: watch::Sender<PlaybackSnapshot>,
}

impl<S: PlaybackSurface> PlaybackController<S> {
    /// Returns false when the actor should stop.
    fn handle_command(&mut self, command: PlaybackCommand) -> bool {
        match command {
            PlaybackCommand::Start {
                segments,
                responder,
            } => {
                let _ = responder.send(self.start(segments));
            }
            PlaybackCommand::Signal { event, responder } => {
                let _ = responder.send(self.handle_event(event));
            }
            PlaybackCommand::ManualRetry { responder } => {
                let _ = responder.send(self.manual_retry());
            }
            PlaybackCommand::Stop { responder } => {
                self.teardown();
                let _ = responder.send(());
            }
            PlaybackCommand::Shutdown { responder } => {
                self.teardown();
                let _ = responder.send(());
                return false;
            }
        }
        true
    }

    fn start(&mut self, segments: Vec<Url>) -> Result<SessionId, PlaybackError> {
        let id = SessionId(self.next_session_id);
        let mut session =
            PlaybackSession::new(id, segments, self.config.fallback_source.clone())?;
        self.next_session_id += 1;

        self.teardown();

        self.surface.attach(SurfaceSignals::new(self.events.clone()));
        let request = session.begin()?;
        tracing::info!("Starting {} with {} segments", id, session.segments().len());
        self.session = Some(session);
        self.issue_load(request);

        Ok(id)
    }

    fn manual_retry(&mut self) -> Result<LoadTicket, PlaybackError> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        let request = session.manual_retry()?;
        let ticket = request.ticket;
        tracing::info!("Manual retry of segment {} ({})", request.index, ticket);
        self.issue_load(request);
        Ok(ticket)
    }

    fn handle_event(&mut self, event: InternalEvent) -> SignalOutcome {
        let Some(session) = self.session.as_mut() else {
            tracing::trace!("Dropping {:?}: no active session", event);
            return SignalOutcome::Stale;
        };

        match event {
            InternalEvent::Ready(ticket) => {
                if session.segment_ready(ticket).is_err() {
                    return stale(event);
                }
                let index = session.current_index();
                self.disarm_load_timer();
                self.surface.clear_frame();
                self.surface.play(ticket);
                tracing::debug!("Segment {} playing ({})", index, ticket);
                self.publish();
            }
            InternalEvent::Ended(ticket) => {
                if session.segment_ended(ticket).is_err() {
                    return stale(event);
                }
                self.publish();

                let frame = self.surface.capture_frame();
                if let Some(frame) = &frame {
                    self.surface.show_frame(frame);
                }

                let Some(session) = self.session.as_mut() else {
                    return SignalOutcome::Stale;
                };
                match session.advance(frame) {
                    Ok(request) => self.issue_load(request),
                    Err(e) => tracing::error!("Failed to advance after segment end: {e}"),
                }
            }
            InternalEvent::Failed(ticket, kind) => match session.playback_error(ticket, kind) {
                Ok(outcome) => {
                    self.disarm_load_timer();
                    self.apply_failure(outcome);
                }
                Err(_) => return stale(event),
            },
            InternalEvent::LoadTimeout(ticket) => {
                let timeout_ms = self.config.load_timeout.as_millis() as u64;
                match session.load_timed_out(ticket, timeout_ms) {
                    Ok(outcome) => {
                        if self.load_timer.as_ref().is_some_and(|t| t.ticket == ticket) {
                            self.load_timer = None;
                        }
                        self.apply_failure(outcome);
                    }
                    Err(_) => return stale(event),
                }
            }
        }

        SignalOutcome::Applied
    }

    fn apply_failure(&mut self, outcome: FailureOutcome) {
        match outcome {
            FailureOutcome::Failed(error) => {
                tracing::warn!("Playback failed: {error}");
                self.publish();
            }
            FailureOutcome::Aborted(error) => {
                tracing::info!("{error}; waiting for manual retry");
                self.publish();
            }
            FailureOutcome::Substituted(request) => {
                tracing::warn!(
                    "Substituting fallback {} for segment {}",
                    request.source,
                    request.index
                );
                self.issue_load(request);
            }
        }
    }

    fn issue_load(&mut self, request: LoadRequest) {
        self.arm_load_timer(request.ticket);
        tracing::debug!(
            "Loading segment {} from {} ({})",
            request.index,
            request.source,
            request.ticket
        );
        self.surface.load(&request.source, request.ticket);
        self.publish();
    }

    fn arm_load_timer(&mut self, ticket: LoadTicket) {
        self.disarm_load_timer();

        let events = self.events.clone();
        let window = self.config.load_timeout;
        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = events.send(InternalEvent::LoadTimeout(ticket));
        });

        self.load_timer = Some(LoadTimer { ticket, task });
    }

    fn disarm_load_timer(&mut self) {
        if let Some(timer) = self.load_timer.take() {
            timer.task.abort();
        }
    }

    /// Detaches listeners, cancels the timer, and discards the session.
    fn teardown(&mut self) {
        self.disarm_load_timer();

        if let Some(mut session) = self.session.take() {
            session.teardown();
            self.surface.clear_frame();
            self.surface.detach();
            tracing::info!("Tore down {}", session.id());
        }

        self.snapshots.send_replace(PlaybackSnapshot::default());
    }

    fn publish(&self) {
        if let Some(session) = &self.session {
            self.snapshots.send_replace(session.snapshot());
        }
    }
}

fn stale(event: InternalEvent) -> SignalOutcome {
    tracing::trace!("Ignoring stale signal {:?}", event);
    SignalOutcome::Stale
}

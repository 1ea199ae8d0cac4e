//! Handle for communicating with the playback controller actor.

use tokio::sync::{mpsc, oneshot, watch};
use url::Url;

use super::PlaybackError;
use super::commands::{InternalEvent, PlaybackCommand};
use super::state::{LoadTicket, MediaErrorKind, PlaybackSnapshot, SessionId, SignalOutcome};

/// Handle for communicating with the playback controller actor.
///
/// Cloneable; every clone drives the same controller. The UI layer issues
/// `start`, `manual_retry`, and `stop` here and watches state through
/// [`PlaybackHandle::subscribe`].
#[derive(Clone)]
pub struct PlaybackHandle {
    sender: mpsc::Sender<PlaybackCommand>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
}

impl PlaybackHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<PlaybackCommand>,
        snapshots: watch::Receiver<PlaybackSnapshot>,
    ) -> Self {
        Self { sender, snapshots }
    }

    /// Starts a session over `segments`, tearing down any active one first.
    ///
    /// The order of `segments` is final for the lifetime of the session.
    ///
    /// # Errors
    /// - `PlaybackError::EmptySegments` - No segments supplied; any active session is kept
    /// - `PlaybackError::ControllerShutdown` - Actor has stopped
    pub async fn start(&self, segments: Vec<Url>) -> Result<SessionId, PlaybackError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlaybackCommand::Start {
            segments,
            responder,
        })
        .await?;

        rx.await.map_err(|_| PlaybackError::ControllerShutdown)?
    }

    /// Reports that the attempt identified by `ticket` can begin playing.
    ///
    /// # Errors
    /// - `PlaybackError::ControllerShutdown` - Actor has stopped
    pub async fn segment_ready(&self, ticket: LoadTicket) -> Result<SignalOutcome, PlaybackError> {
        self.signal(InternalEvent::Ready(ticket)).await
    }

    /// Reports the natural end of the segment identified by `ticket`.
    ///
    /// # Errors
    /// - `PlaybackError::ControllerShutdown` - Actor has stopped
    pub async fn segment_ended(&self, ticket: LoadTicket) -> Result<SignalOutcome, PlaybackError> {
        self.signal(InternalEvent::Ended(ticket)).await
    }

    /// Reports a load or playback failure for `ticket`.
    ///
    /// # Errors
    /// - `PlaybackError::ControllerShutdown` - Actor has stopped
    pub async fn playback_error(
        &self,
        ticket: LoadTicket,
        kind: MediaErrorKind,
    ) -> Result<SignalOutcome, PlaybackError> {
        self.signal(InternalEvent::Failed(ticket, kind)).await
    }

    /// Re-issues the load for the current index without touching the segment list.
    ///
    /// # Errors
    /// - `PlaybackError::NoActiveSession` - Nothing has been started
    /// - `PlaybackError::InvalidTransition` - Session is neither failed nor aborted
    /// - `PlaybackError::ControllerShutdown` - Actor has stopped
    pub async fn manual_retry(&self) -> Result<LoadTicket, PlaybackError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlaybackCommand::ManualRetry { responder }).await?;

        rx.await.map_err(|_| PlaybackError::ControllerShutdown)?
    }

    /// Tears down the active session. Listeners and the load timer are gone
    /// by the time this returns.
    ///
    /// # Errors
    /// - `PlaybackError::ControllerShutdown` - Actor has stopped
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlaybackCommand::Stop { responder }).await?;

        rx.await.map_err(|_| PlaybackError::ControllerShutdown)
    }

    /// Stops the actor. Subsequent calls return `PlaybackError::ControllerShutdown`.
    ///
    /// # Errors
    /// - `PlaybackError::ControllerShutdown` - Actor had already stopped
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlaybackCommand::Shutdown { responder }).await?;

        rx.await.map_err(|_| PlaybackError::ControllerShutdown)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// Checks if the controller actor is still running.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    async fn signal(&self, event: InternalEvent) -> Result<SignalOutcome, PlaybackError> {
        let (responder, rx) = oneshot::channel();
        self.send(PlaybackCommand::Signal { event, responder }).await?;

        rx.await.map_err(|_| PlaybackError::ControllerShutdown)
    }

    async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| PlaybackError::ControllerShutdown)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::PlaybackConfig;
    use crate::playback::{PlaybackState, spawn_playback_controller};
    use crate::test_fixtures::{RecordingSurface, SurfaceCall, SurfaceProbe, segment_urls};

    fn controller(config: PlaybackConfig) -> (PlaybackHandle, SurfaceProbe) {
        let (surface, probe) = RecordingSurface::new();
        (spawn_playback_controller(config, surface), probe)
    }

    async fn play_current(handle: &PlaybackHandle, ticket: LoadTicket) {
        assert_eq!(handle.segment_ready(ticket).await.unwrap(), SignalOutcome::Applied);
        assert_eq!(handle.segment_ended(ticket).await.unwrap(), SignalOutcome::Applied);
    }

    #[tokio::test]
    async fn test_start_requires_segments() {
        let (handle, _probe) = controller(PlaybackConfig::default());
        assert_eq!(
            handle.start(Vec::new()).await,
            Err(PlaybackError::EmptySegments)
        );
        assert_eq!(handle.snapshot().state, PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_three_ends_wrap_to_first_segment() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4", "b.mp4", "c.mp4"])).await.unwrap();

        for _ in 0..3 {
            let ticket = probe.last_ticket().unwrap();
            play_current(&handle, ticket).await;
        }

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.segment_count, 3);
        assert_eq!(snapshot.state, PlaybackState::Loading);

        let loaded: Vec<String> = probe
            .loads()
            .iter()
            .map(|(url, _)| url.path().to_string())
            .collect();
        assert_eq!(loaded, vec!["/a.mp4", "/b.mp4", "/c.mp4", "/a.mp4"]);
        assert_eq!(probe.count(SurfaceCall::Capture), 3);
        assert_eq!(probe.count(SurfaceCall::ShowFrame), 3);
    }

    #[tokio::test]
    async fn test_next_segment_not_requested_before_end() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();

        let ticket = probe.last_ticket().unwrap();
        handle.segment_ready(ticket).await.unwrap();
        assert_eq!(probe.loads().len(), 1);
        assert_eq!(handle.snapshot().state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_stale_signal_after_restart_is_ignored() {
        let (handle, probe) = controller(PlaybackConfig::default());
        let first = handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();
        let old_ticket = probe.last_ticket().unwrap();

        let second = handle.start(segment_urls(&["x.mp4", "y.mp4", "z.mp4"])).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(probe.count(SurfaceCall::Detach), 1);

        let before = handle.snapshot();
        assert_eq!(
            handle.segment_ready(old_ticket).await.unwrap(),
            SignalOutcome::Stale
        );
        assert_eq!(
            handle.segment_ended(old_ticket).await.unwrap(),
            SignalOutcome::Stale
        );

        let after = handle.snapshot();
        assert_eq!(before, after);
        assert_eq!(after.session_id, Some(second));
        assert_eq!(after.state, PlaybackState::Loading);
        assert_eq!(after.current_index, 0);
    }

    #[tokio::test]
    async fn test_stop_detaches_and_rejects_late_signals() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4"])).await.unwrap();
        let ticket = probe.last_ticket().unwrap();

        handle.stop().await.unwrap();
        assert_eq!(probe.count(SurfaceCall::Detach), 1);
        assert_eq!(handle.snapshot(), PlaybackSnapshot::default());

        // Surface callbacks registered for the old session land nowhere
        probe.signals().unwrap().segment_ready(ticket);
        assert_eq!(
            handle.segment_ready(ticket).await.unwrap(),
            SignalOutcome::Stale
        );
        assert_eq!(probe.count(SurfaceCall::Play), 0);
    }

    #[tokio::test]
    async fn test_surface_signals_drive_playback() {
        let (handle, probe) = controller(PlaybackConfig::default());
        let mut updates = handle.subscribe();
        handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();

        let ticket = probe.last_ticket().unwrap();
        probe.signals().unwrap().segment_ready(ticket);

        while updates.borrow_and_update().state != PlaybackState::Playing {
            updates.changed().await.unwrap();
        }
        assert_eq!(probe.count(SurfaceCall::Play), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout_fires_once() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle
            .start(segment_urls(&["a.mp4", "b.mp4"]))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(9_999)).await;
        assert_eq!(handle.snapshot().state, PlaybackState::Loading);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Error);
        assert_eq!(
            snapshot.last_error,
            Some(PlaybackError::LoadTimeout {
                origin: "http://media.test:8080".to_string(),
                timeout_ms: 10_000,
            })
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(handle.snapshot(), snapshot);
        assert_eq!(probe.loads().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_never_fires_after_ready() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4"])).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        handle.segment_ready(probe.last_ticket().unwrap()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.snapshot().state, PlaybackState::Playing);
        assert!(handle.snapshot().last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancelled_by_stop() {
        let (handle, _probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4"])).await.unwrap();
        handle.stop().await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.snapshot(), PlaybackSnapshot::default());
    }

    #[tokio::test]
    async fn test_abort_then_manual_retry() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();
        let ticket = probe.last_ticket().unwrap();

        handle
            .playback_error(ticket, MediaErrorKind::Aborted)
            .await
            .unwrap();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Loading);
        assert!(snapshot.retryable);
        assert!(matches!(
            snapshot.last_error,
            Some(PlaybackError::AbortError { .. })
        ));

        let retry = handle.manual_retry().await.unwrap();
        assert_ne!(retry, ticket);
        assert_eq!(probe.loads().len(), 2);
        assert_eq!(probe.loads()[1].0.path(), "/a.mp4");
    }

    #[tokio::test]
    async fn test_network_error_then_retry_recovers() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();
        let ticket = probe.last_ticket().unwrap();

        handle
            .playback_error(ticket, MediaErrorKind::NetworkOrOther)
            .await
            .unwrap();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Error);
        assert!(matches!(
            snapshot.last_error,
            Some(PlaybackError::NetworkError { ref url }) if url.path() == "/a.mp4"
        ));

        let retry = handle.manual_retry().await.unwrap();
        handle.segment_ready(retry).await.unwrap();
        assert_eq!(handle.snapshot().state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_retry_without_session() {
        let (handle, _probe) = controller(PlaybackConfig::default());
        assert_eq!(
            handle.manual_retry().await,
            Err(PlaybackError::NoActiveSession)
        );
    }

    #[tokio::test]
    async fn test_fallback_source_substituted() {
        let fallback = Url::parse("http://backup.test/filler.mp4").unwrap();
        let config = PlaybackConfig {
            fallback_source: Some(fallback.clone()),
            ..PlaybackConfig::default()
        };
        let (handle, probe) = controller(config);
        handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();

        let ticket = probe.last_ticket().unwrap();
        handle
            .playback_error(ticket, MediaErrorKind::Unsupported)
            .await
            .unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Loading);
        assert!(snapshot.on_fallback);
        assert_eq!(probe.loads().last().unwrap().0, fallback);
    }

    #[tokio::test]
    async fn test_shutdown_stops_actor() {
        let (handle, probe) = controller(PlaybackConfig::default());
        handle.start(segment_urls(&["a.mp4"])).await.unwrap();

        handle.shutdown().await.unwrap();
        assert_eq!(probe.count(SurfaceCall::Detach), 1);
        assert_eq!(
            handle.start(segment_urls(&["a.mp4"])).await,
            Err(PlaybackError::ControllerShutdown)
        );
    }
}

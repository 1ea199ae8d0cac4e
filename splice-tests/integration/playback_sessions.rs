//! Integration tests for segment playback sessions
//!
//! Segment lists come from real providers and progress is reported through
//! the signals a surface receives on attach, the same path a renderer uses.

use std::time::Duration;

use async_trait::async_trait;
use splice_core::config::PlaybackConfig;
use splice_core::playback::{
    LoadTicket, MediaErrorKind, PlaybackError, PlaybackHandle, PlaybackSnapshot, PlaybackState,
    SignalOutcome, spawn_playback_controller,
};
use splice_core::test_fixtures::{
    RecordingSurface, SurfaceCall, SurfaceProbe, create_media_dir, segment_urls,
};
use splice_listing::{
    LocalDirectoryProvider, ListingError, SegmentListProvider, SegmentListing,
};
use tokio::sync::watch;
use url::Url;

#[derive(Debug)]
struct FixedProvider {
    segments: Vec<Url>,
}

#[async_trait]
impl SegmentListProvider for FixedProvider {
    async fn segments(&self) -> Result<SegmentListing, ListingError> {
        Ok(SegmentListing::parsed(self.segments.clone()))
    }
}

fn spawn(config: PlaybackConfig) -> (PlaybackHandle, SurfaceProbe) {
    let (surface, probe) = RecordingSurface::new();
    (spawn_playback_controller(config, surface), probe)
}

async fn wait_for(
    updates: &mut watch::Receiver<PlaybackSnapshot>,
    condition: impl Fn(&PlaybackSnapshot) -> bool,
) -> PlaybackSnapshot {
    loop {
        {
            let snapshot = updates.borrow_and_update();
            if condition(&snapshot) {
                return snapshot.clone();
            }
        }
        updates.changed().await.unwrap();
    }
}

/// Reports ready then ended for the outstanding load through surface signals.
async fn finish_segment(
    probe: &SurfaceProbe,
    updates: &mut watch::Receiver<PlaybackSnapshot>,
) -> LoadTicket {
    let ticket = probe.last_ticket().unwrap();
    let signals = probe.signals().unwrap();

    signals.segment_ready(ticket);
    wait_for(updates, |s| s.state == PlaybackState::Playing).await;

    let loads_before = probe.loads().len();
    signals.segment_ended(ticket);
    wait_for(updates, |s| s.state == PlaybackState::Loading).await;
    assert_eq!(probe.loads().len(), loads_before + 1);

    ticket
}

#[tokio::test]
async fn test_local_directory_loops_in_order() {
    let dir = create_media_dir(&["part3.mp4", "part1.mp4", "part2.mp4"]);
    let base = Url::parse("http://127.0.0.1:3000").unwrap();
    let provider = LocalDirectoryProvider::new(dir.path(), base).with_media_root(dir.path());
    let listing = provider.segments().await.unwrap();

    let (handle, probe) = spawn(PlaybackConfig::default());
    let mut updates = handle.subscribe();
    handle.start(listing.into_segments()).await.unwrap();

    let mut indices = vec![handle.snapshot().current_index];
    for _ in 0..3 {
        finish_segment(&probe, &mut updates).await;
        indices.push(handle.snapshot().current_index);
    }
    assert_eq!(indices, vec![0, 1, 2, 0]);

    let loaded: Vec<String> = probe
        .loads()
        .iter()
        .map(|(url, _)| url.path().to_string())
        .collect();
    assert_eq!(
        loaded,
        vec![
            "/media/part1.mp4",
            "/media/part2.mp4",
            "/media/part3.mp4",
            "/media/part1.mp4",
        ]
    );

    // Each end freezes the last frame; each ready clears it
    assert_eq!(probe.shown_frames().len(), 3);
    assert!(probe.count(SurfaceCall::ClearFrame) >= 3);
}

#[tokio::test]
async fn test_one_load_outstanding_at_a_time() {
    let provider = FixedProvider {
        segments: segment_urls(&["a.mp4", "b.mp4"]),
    };
    let (handle, probe) = spawn(PlaybackConfig::default());
    handle
        .start(provider.segments().await.unwrap().into_segments())
        .await
        .unwrap();

    let ticket = probe.last_ticket().unwrap();
    assert_eq!(handle.segment_ready(ticket).await.unwrap(), SignalOutcome::Applied);
    // A repeated ready for the same attempt changes nothing
    assert_eq!(handle.segment_ready(ticket).await.unwrap(), SignalOutcome::Stale);
    assert_eq!(probe.loads().len(), 1);

    handle.segment_ended(ticket).await.unwrap();
    // A repeated end cannot skip a segment
    assert_eq!(handle.segment_ended(ticket).await.unwrap(), SignalOutcome::Stale);
    assert_eq!(probe.loads().len(), 2);
    assert_eq!(handle.snapshot().current_index, 1);
}

#[tokio::test]
async fn test_old_session_signals_cannot_touch_new_session() {
    let (handle, probe) = spawn(PlaybackConfig::default());
    let mut updates = handle.subscribe();

    handle
        .start(segment_urls(&["old1.mp4", "old2.mp4"]))
        .await
        .unwrap();
    let old_ticket = probe.last_ticket().unwrap();
    let old_signals = probe.signals().unwrap();

    let new_id = handle
        .start(segment_urls(&["new1.mp4", "new2.mp4", "new3.mp4"]))
        .await
        .unwrap();
    let new_ticket = probe.last_ticket().unwrap();
    let before = handle.snapshot();

    old_signals.segment_ready(old_ticket);
    old_signals.segment_ended(old_ticket);
    old_signals.playback_error(old_ticket, MediaErrorKind::NetworkOrOther);

    // A signal queued after the stale ones proves they were all processed
    probe.signals().unwrap().segment_ready(new_ticket);
    let after = wait_for(&mut updates, |s| s.state == PlaybackState::Playing).await;

    assert_eq!(after.session_id, Some(new_id));
    assert_eq!(after.current_index, before.current_index);
    assert_eq!(after.current_index, 0);
    assert!(after.last_error.is_none());
    assert_eq!(probe.count(SurfaceCall::Play), 1);
}

#[tokio::test]
async fn test_stop_then_late_signal_is_ignored() {
    let (handle, probe) = spawn(PlaybackConfig::default());
    handle.start(segment_urls(&["a.mp4"])).await.unwrap();
    let ticket = probe.last_ticket().unwrap();

    handle.stop().await.unwrap();
    handle.stop().await.unwrap();
    assert_eq!(probe.count(SurfaceCall::Detach), 1);

    assert_eq!(handle.segment_ready(ticket).await.unwrap(), SignalOutcome::Stale);
    assert_eq!(handle.snapshot(), PlaybackSnapshot::default());
    assert_eq!(handle.manual_retry().await, Err(PlaybackError::NoActiveSession));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fires_once_per_attempt() {
    let config = PlaybackConfig {
        load_timeout: Duration::from_millis(2_000),
        ..PlaybackConfig::default()
    };
    let (handle, probe) = spawn(config);
    let mut updates = handle.subscribe();
    handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();

    let first = wait_for(&mut updates, |s| s.state == PlaybackState::Error).await;
    assert!(matches!(
        first.last_error,
        Some(PlaybackError::LoadTimeout { ref origin, timeout_ms: 2_000 })
            if origin == "http://media.test:8080"
    ));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(handle.snapshot(), first);

    // Retrying arms a fresh window for the new attempt only
    let retry = handle.manual_retry().await.unwrap();
    assert_eq!(handle.snapshot().state, PlaybackState::Loading);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    handle.segment_ready(retry).await.unwrap();

    tokio::time::sleep(Duration::from_secs(20)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert!(snapshot.last_error.is_none());
    assert_eq!(probe.loads().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_not_carried_across_sessions() {
    let (handle, _probe) = spawn(PlaybackConfig::default());
    handle.start(segment_urls(&["a.mp4"])).await.unwrap();

    tokio::time::sleep(Duration::from_millis(6_000)).await;
    handle.start(segment_urls(&["b.mp4"])).await.unwrap();

    // Past the first session's deadline but inside the second's
    tokio::time::sleep(Duration::from_millis(6_000)).await;
    assert_eq!(handle.snapshot().state, PlaybackState::Loading);

    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(handle.snapshot().state, PlaybackState::Error);
}

#[tokio::test]
async fn test_fallback_keeps_session_running() {
    let fallback = Url::parse("http://backup.test:9000/slate.mp4").unwrap();
    let config = PlaybackConfig {
        fallback_source: Some(fallback.clone()),
        ..PlaybackConfig::default()
    };
    let (handle, probe) = spawn(config);
    let mut updates = handle.subscribe();
    handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();

    let signals = probe.signals().unwrap();
    signals.playback_error(probe.last_ticket().unwrap(), MediaErrorKind::NetworkOrOther);
    let substituted = wait_for(&mut updates, |s| s.on_fallback).await;
    assert_eq!(substituted.state, PlaybackState::Loading);
    assert_eq!(probe.loads().last().unwrap().0, fallback);

    // The substitute plays in place of segment 0, then b.mp4 follows
    finish_segment(&probe, &mut updates).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.current_index, 1);
    assert!(!snapshot.on_fallback);
    assert_eq!(probe.loads().last().unwrap().0.path(), "/b.mp4");

    // A failing fallback ends in Error naming its origin
    signals.playback_error(probe.last_ticket().unwrap(), MediaErrorKind::Unsupported);
    wait_for(&mut updates, |s| s.on_fallback).await;
    signals.playback_error(probe.last_ticket().unwrap(), MediaErrorKind::Unsupported);
    let failed = wait_for(&mut updates, |s| s.state == PlaybackState::Error).await;
    assert!(matches!(
        failed.last_error,
        Some(PlaybackError::UnsupportedMediaType { ref url }) if *url == fallback
    ));
}

#[tokio::test]
async fn test_abort_waits_for_manual_retry() {
    let (handle, probe) = spawn(PlaybackConfig::default());
    handle.start(segment_urls(&["a.mp4", "b.mp4"])).await.unwrap();

    let ticket = probe.last_ticket().unwrap();
    handle.segment_ready(ticket).await.unwrap();
    handle
        .playback_error(ticket, MediaErrorKind::Aborted)
        .await
        .unwrap();

    let snapshot = handle.snapshot();
    assert_ne!(snapshot.state, PlaybackState::Error);
    assert!(snapshot.retryable);
    assert_eq!(probe.loads().len(), 1);

    let retry = handle.manual_retry().await.unwrap();
    assert_eq!(probe.loads().len(), 2);
    assert_eq!(probe.loads()[1].0.path(), "/a.mp4");
    handle.segment_ready(retry).await.unwrap();
    assert_eq!(handle.snapshot().state, PlaybackState::Playing);
    assert!(!handle.snapshot().retryable);
}

//! Test fixtures for media directories and playback surfaces.
//!
//! Shared by unit tests in this crate and by the integration test crate
//! through the `test-utils` feature.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use url::Url;

use crate::playback::{LoadTicket, PlaybackSurface, SurfaceSignals, TransitionFrame};

/// Base URL used by [`segment_urls`].
pub const SEGMENT_BASE_URL: &str = "http://media.test:8080";

/// Creates a temporary directory containing one small file per name.
///
/// # Panics
///
/// Panics if the directory or any file cannot be created.
pub fn create_media_dir(names: &[&str]) -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    for name in names {
        write_media_file(temp_dir.path(), name, name.as_bytes());
    }
    temp_dir
}

/// Writes `data` to `dir/name` and returns the full path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_media_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Deterministic non-repeating-looking content so misplaced slices are caught.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 251) % 256) as u8).collect()
}

/// Absolute segment URLs under [`SEGMENT_BASE_URL`].
///
/// # Panics
///
/// Panics if a name does not form a valid URL path.
pub fn segment_urls(names: &[&str]) -> Vec<Url> {
    names
        .iter()
        .map(|name| Url::parse(&format!("{SEGMENT_BASE_URL}/{name}")).unwrap())
        .collect()
}

/// Kinds of surface calls recorded by [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    Attach,
    Load,
    Play,
    Capture,
    ShowFrame,
    ClearFrame,
    Detach,
}

#[derive(Debug, Default)]
struct SurfaceLog {
    calls: Vec<SurfaceCall>,
    loads: Vec<(Url, LoadTicket)>,
    shown: Vec<TransitionFrame>,
    signals: Option<SurfaceSignals>,
}

/// Surface that records every call and never reports on its own.
///
/// Tests drive progress either through the controller handle or through the
/// attached [`SurfaceSignals`] exposed by the paired [`SurfaceProbe`].
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

/// Read side of a [`RecordingSurface`] that stays with the test.
#[derive(Clone)]
pub struct SurfaceProbe {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (RecordingSurface, SurfaceProbe) {
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        (
            RecordingSurface { log: log.clone() },
            SurfaceProbe { log },
        )
    }

    fn record(&self, call: SurfaceCall) {
        self.log.lock().unwrap().calls.push(call);
    }
}

impl PlaybackSurface for RecordingSurface {
    fn attach(&mut self, signals: SurfaceSignals) {
        self.record(SurfaceCall::Attach);
        self.log.lock().unwrap().signals = Some(signals);
    }

    fn load(&mut self, source: &Url, ticket: LoadTicket) {
        self.record(SurfaceCall::Load);
        self.log.lock().unwrap().loads.push((source.clone(), ticket));
    }

    fn play(&mut self, _ticket: LoadTicket) {
        self.record(SurfaceCall::Play);
    }

    fn capture_frame(&mut self) -> Option<TransitionFrame> {
        self.record(SurfaceCall::Capture);
        TransitionFrame::from_rgba(1, 1, vec![0x10, 0x20, 0x30, 0xff])
    }

    fn show_frame(&mut self, frame: &TransitionFrame) {
        self.record(SurfaceCall::ShowFrame);
        self.log.lock().unwrap().shown.push(frame.clone());
    }

    fn clear_frame(&mut self) {
        self.record(SurfaceCall::ClearFrame);
    }

    fn detach(&mut self) {
        self.record(SurfaceCall::Detach);
    }
}

impl SurfaceProbe {
    /// Every call in order.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: SurfaceCall) -> usize {
        self.log
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    /// Sources and tickets passed to `load`, in order.
    pub fn loads(&self) -> Vec<(Url, LoadTicket)> {
        self.log.lock().unwrap().loads.clone()
    }

    /// Ticket of the most recent load.
    pub fn last_ticket(&self) -> Option<LoadTicket> {
        self.log.lock().unwrap().loads.last().map(|(_, t)| *t)
    }

    /// Frames passed to `show_frame`.
    pub fn shown_frames(&self) -> Vec<TransitionFrame> {
        self.log.lock().unwrap().shown.clone()
    }

    /// Listeners from the most recent `attach`, kept after detach so tests
    /// can fire late signals.
    pub fn signals(&self) -> Option<SurfaceSignals> {
        self.log.lock().unwrap().signals.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_dir_contains_requested_files() {
        let dir = create_media_dir(&["seg1.mp4", "notes.txt"]);
        assert!(dir.path().join("seg1.mp4").is_file());
        assert!(dir.path().join("notes.txt").is_file());
    }

    #[test]
    fn test_patterned_bytes_length() {
        let data = patterned_bytes(1024);
        assert_eq!(data.len(), 1024);
        assert_ne!(data[1], data[2]);
    }
}

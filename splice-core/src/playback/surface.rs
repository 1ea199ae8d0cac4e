//! Rendering surface abstraction driven by the playback controller.

use bytes::Bytes;
use tokio::sync::mpsc;
use url::Url;

use super::commands::InternalEvent;
use super::state::{LoadTicket, MediaErrorKind};

/// Raster snapshot of the last rendered frame of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels
    pub pixels: Bytes,
}

impl TransitionFrame {
    /// Builds a frame, checking that the pixel buffer matches the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: impl Into<Bytes>) -> Option<Self> {
        let pixels = pixels.into();
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Externally owned video output and snapshot canvas.
///
/// The controller takes ownership at construction, attaches signal listeners
/// when a session starts, and detaches them when the session is torn down.
/// Every method is called from the controller task and must not block.
pub trait PlaybackSurface: Send + 'static {
    /// Registers the listeners through which the surface reports progress.
    fn attach(&mut self, signals: SurfaceSignals);

    /// Begins loading `source`. Progress must be reported with `ticket`.
    fn load(&mut self, source: &Url, ticket: LoadTicket);

    /// Starts playback of the loaded segment.
    fn play(&mut self, ticket: LoadTicket);

    /// Snapshots the currently rendered output.
    fn capture_frame(&mut self) -> Option<TransitionFrame>;

    /// Displays a frozen frame over the output until cleared.
    fn show_frame(&mut self, frame: &TransitionFrame);

    /// Removes any frozen frame.
    fn clear_frame(&mut self);

    /// Drops the listeners registered by [`PlaybackSurface::attach`] and stops output.
    fn detach(&mut self);
}

/// Listener handle a surface uses to report ready/ended/error signals.
///
/// Sending never blocks, so surfaces can report from synchronous callbacks.
#[derive(Debug, Clone)]
pub struct SurfaceSignals {
    sender: mpsc::UnboundedSender<InternalEvent>,
}

impl SurfaceSignals {
    pub(crate) fn new(sender: mpsc::UnboundedSender<InternalEvent>) -> Self {
        Self { sender }
    }

    /// Enough data is buffered to begin playback.
    pub fn segment_ready(&self, ticket: LoadTicket) {
        self.send(InternalEvent::Ready(ticket));
    }

    /// Playback reached the natural end of the segment.
    pub fn segment_ended(&self, ticket: LoadTicket) {
        self.send(InternalEvent::Ended(ticket));
    }

    /// Loading or playback failed.
    pub fn playback_error(&self, ticket: LoadTicket, kind: MediaErrorKind) {
        self.send(InternalEvent::Failed(ticket, kind));
    }

    fn send(&self, event: InternalEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Playback controller gone; dropping surface signal");
        }
    }
}

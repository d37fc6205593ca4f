use std::sync::mpsc;
use std::time::Instant;

use crate::foundation::core::Tick;
use crate::render::image::FrameImage;

/// Completion reported back to a session by an external service.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A requested thumbnail frame finished decoding; `None` when the decoder could not serve it.
    FrameDecoded {
        /// Requested tick.
        tick: Tick,
        /// Decoded frame.
        image: Option<FrameImage>,
    },
    /// An external seek finished.
    SeekCompleted {
        /// Tick the seek was started toward.
        target: Tick,
    },
    /// The player's playhead moved (periodic time observation or seek landing).
    PlayheadMoved {
        /// New playhead position.
        tick: Tick,
    },
    /// The scrub timer fired.
    TimerFired {
        /// Clock reading when the timer fired.
        at: Instant,
    },
}

/// Cloneable handle services use to deliver [`SessionEvent`]s.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::Sender<SessionEvent>,
}

impl EventSender {
    /// Deliver an event. Returns `false` once the session is gone.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Deliver a decode completion.
    pub fn frame_decoded(&self, tick: Tick, image: Option<FrameImage>) -> bool {
        self.send(SessionEvent::FrameDecoded { tick, image })
    }

    /// Deliver a playhead observation.
    pub fn playhead_moved(&self, tick: Tick) -> bool {
        self.send(SessionEvent::PlayheadMoved { tick })
    }

    /// Deliver a timer tick stamped with the current clock.
    pub fn timer_fired(&self) -> bool {
        self.send(SessionEvent::TimerFired { at: Instant::now() })
    }
}

/// Receiving end of a session's event channel.
#[derive(Debug)]
pub struct EventQueue {
    tx: mpsc::Sender<SessionEvent>,
    rx: mpsc::Receiver<SessionEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// New sender feeding this queue.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Next queued event without blocking.
    pub fn try_next(&self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }

    /// Block up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: std::time::Duration) -> Option<SessionEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// One-shot handle a [`Playback`](crate::playback::seek::Playback) completes when a seek lands.
#[derive(Debug)]
pub struct SeekCompletion {
    target: Tick,
    events: EventSender,
}

impl SeekCompletion {
    pub(crate) fn new(target: Tick, events: EventSender) -> Self {
        Self { target, events }
    }

    /// Tick the seek was started toward.
    pub fn target(&self) -> Tick {
        self.target
    }

    /// Report that the seek finished.
    pub fn complete(self) -> bool {
        self.events.send(SessionEvent::SeekCompleted {
            target: self.target,
        })
    }
}

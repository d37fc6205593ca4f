use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::session::events::EventSender;

/// Fixed-rate timer delivering [`SessionEvent::TimerFired`](crate::session::events::SessionEvent).
pub trait Ticker {
    /// Start firing at `hz`, replacing any running timer.
    fn start(&mut self, hz: f64, events: EventSender);
    /// Stop firing. Already queued events stay queued.
    fn stop(&mut self);
    /// Return `true` while firing.
    fn is_running(&self) -> bool;
}

/// [`Ticker`] backed by a worker thread waiting on a stop channel between fires.
///
/// [`Ticker::stop`] wakes the worker at once, so stopping never waits out a period.
#[derive(Debug, Default)]
pub struct ThreadTicker {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadTicker {
    /// Idle ticker.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ticker for ThreadTicker {
    fn start(&mut self, hz: f64, events: EventSender) {
        self.stop();
        let period = if hz.is_finite() && hz > 0.0 {
            Duration::from_secs_f64(1.0 / hz)
        } else {
            tracing::warn!(hz, "invalid timer rate, using 60 Hz");
            Duration::from_secs_f64(1.0 / 60.0)
        };

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let spawned = std::thread::Builder::new()
            .name("inkframe-ticker".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !events.timer_fired() {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });
        match spawned {
            Ok(handle) => {
                self.stop = Some(stop_tx);
                self.handle = Some(handle);
            }
            Err(e) => tracing::warn!(error = %e, "failed to spawn timer thread"),
        }
    }

    fn stop(&mut self) {
        // Disconnecting wakes the worker.
        self.stop = None;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("timer thread panicked");
        }
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ThreadTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

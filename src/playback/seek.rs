use crate::foundation::core::Tick;
use crate::session::events::{EventSender, SeekCompletion};

/// Player service driven by a session.
pub trait Playback {
    /// Current playhead position.
    fn current_tick(&self) -> Tick;
    /// Set the playback rate; `0.0` pauses.
    fn set_rate(&mut self, rate: f32);
    /// Start seeking toward `target`; call [`SeekCompletion::complete`] when it lands.
    fn seek(&mut self, target: Tick, completion: SeekCompletion);
}

/// Last rate set by the user.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackRate {
    /// Speed multiplier while playing.
    pub rate: f32,
    /// Paused playback runs at zero regardless of `rate`.
    pub paused: bool,
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self {
            rate: 1.0,
            paused: true,
        }
    }
}

impl PlaybackRate {
    /// Playing at `rate`.
    pub fn playing(rate: f32) -> Self {
        Self {
            rate,
            paused: false,
        }
    }

    /// Rate handed to the player.
    pub fn effective(self) -> f32 {
        if self.paused { 0.0 } else { self.rate }
    }
}

/// Controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekState {
    /// No seek in flight.
    Idle,
    /// One external seek toward the given tick is in flight.
    Seeking(Tick),
}

/// Result of a seek completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekStep {
    /// The completed seek matched the desired time; playback resumed.
    Settled(Tick),
    /// The desired time moved while seeking; a new seek toward it was started.
    Retargeted(Tick),
    /// No seek was in flight; the completion was ignored.
    Ignored,
}

/// Collapses bursts of seek requests into at most one in-flight external seek that always
/// converges on the most recent request.
///
/// A seek that never completes leaves the controller seeking; there is no timeout.
#[derive(Clone, Debug, Default)]
pub struct SeekController {
    state: Option<Tick>,
    desired: Option<Tick>,
    rate: PlaybackRate,
    seeks_started: u64,
}

impl SeekController {
    /// Idle controller that restores `rate` after seeking.
    pub fn new(rate: PlaybackRate) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    /// Current state.
    pub fn state(&self) -> SeekState {
        match self.state {
            Some(t) => SeekState::Seeking(t),
            None => SeekState::Idle,
        }
    }

    /// Return `true` while a seek is in flight.
    pub fn is_seeking(&self) -> bool {
        self.state.is_some()
    }

    /// Last requested target.
    pub fn desired(&self) -> Option<Tick> {
        self.desired
    }

    /// Rate restored when the controller settles.
    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }

    /// External seeks started so far.
    pub fn seeks_started(&self) -> u64 {
        self.seeks_started
    }

    /// Record `target` as the desired time and start a seek if none is in flight.
    pub fn request_seek(&mut self, target: Tick, playback: &mut dyn Playback, events: &EventSender) {
        self.desired = Some(target);
        if self.state.is_some() {
            tracing::trace!(target = target.value, "seek in flight; desired time updated");
            return;
        }
        playback.set_rate(0.0);
        self.start(target, playback, events);
    }

    /// Handle the completion of the in-flight seek toward `completed`.
    pub fn on_seek_completed(
        &mut self,
        completed: Tick,
        playback: &mut dyn Playback,
        events: &EventSender,
    ) -> SeekStep {
        if self.state.is_none() {
            tracing::debug!(target = completed.value, "seek completion while idle ignored");
            return SeekStep::Ignored;
        }
        match self.desired {
            Some(desired) if desired != completed => {
                tracing::debug!(
                    completed = completed.value,
                    desired = desired.value,
                    "retargeting seek"
                );
                self.start(desired, playback, events);
                SeekStep::Retargeted(desired)
            }
            _ => {
                self.state = None;
                playback.set_rate(self.rate.effective());
                tracing::debug!(target = completed.value, "seek settled");
                SeekStep::Settled(completed)
            }
        }
    }

    /// Change the user rate. Applied immediately when idle, deferred until settled otherwise.
    pub fn set_rate(&mut self, rate: PlaybackRate, playback: &mut dyn Playback) {
        self.rate = rate;
        if self.state.is_none() {
            playback.set_rate(rate.effective());
        }
    }

    fn start(&mut self, target: Tick, playback: &mut dyn Playback, events: &EventSender) {
        self.state = Some(target);
        self.seeks_started += 1;
        playback.seek(target, SeekCompletion::new(target, events.clone()));
    }
}

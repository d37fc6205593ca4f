use std::time::{Duration, Instant};

use crate::animation::ease::Ease;
use crate::foundation::core::Tick;
use crate::foundation::error::InkResult;

/// One animator output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrubStep {
    /// Intermediate desired time; the animation continues.
    Moving(Tick),
    /// Final desired time, exactly the target; the animation has stopped.
    Arrived(Tick),
}

impl ScrubStep {
    /// Desired time carried by the step.
    pub fn tick(self) -> Tick {
        match self {
            Self::Moving(t) | Self::Arrived(t) => t,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ScrubRun {
    from: Tick,
    to: Tick,
    delta: i64,
    started: Instant,
    duration: Duration,
}

/// Eased animation of the desired time toward a target.
///
/// Pure in the clock: every output is a function of the `now` passed in, so timer jitter or
/// coalesced ticks only change how many intermediate steps are seen.
#[derive(Clone, Debug, Default)]
pub struct ScrubAnimator {
    ease: Ease,
    run: Option<ScrubRun>,
}

impl ScrubAnimator {
    /// Animator using `ease` for intermediate steps.
    pub fn new(ease: Ease) -> Self {
        Self { ease, run: None }
    }

    /// Return `true` while an animation is running.
    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// Target of the running animation.
    pub fn target(&self) -> Option<Tick> {
        self.run.map(|r| r.to)
    }

    /// Start animating from `from` to `to` over `duration`, replacing any running animation.
    pub fn scrub(&mut self, from: Tick, to: Tick, duration: Duration, now: Instant) -> InkResult<()> {
        let delta = from.delta_to(to)?;
        if let Some(prev) = self.run {
            tracing::debug!(
                previous = prev.to.value,
                target = to.value,
                "scrub superseded"
            );
        }
        self.run = Some(ScrubRun {
            from,
            to,
            delta,
            started: now,
            duration,
        });
        Ok(())
    }

    /// Stop without reaching the target.
    pub fn cancel(&mut self) {
        self.run = None;
    }

    /// Desired time at `now`; `None` when idle.
    ///
    /// `from + trunc(ease(progress) * (to - from))` while progress is below 1, then exactly `to`
    /// after which the animator is idle.
    pub fn on_timer(&mut self, now: Instant) -> Option<ScrubStep> {
        let run = self.run?;
        let elapsed = now.saturating_duration_since(run.started);
        let progress = if run.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / run.duration.as_secs_f64()
        };
        if progress >= 1.0 {
            self.run = None;
            return Some(ScrubStep::Arrived(run.to));
        }
        let eased = self.ease.apply(progress);
        let moved = (eased * run.delta as f64).trunc() as i64;
        Some(ScrubStep::Moving(run.from.offset(moved)))
    }
}

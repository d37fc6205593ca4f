use std::cmp::Ordering;

use crate::foundation::error::{InkError, InkResult};

pub use kurbo::{Affine, Point, Size};

/// Fixed tick rate (ticks per second). Ticks are only comparable within one rate.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TickRate {
    /// Ticks per second, must be non-zero.
    pub per_second: u32,
}

impl TickRate {
    /// Create a validated rate.
    pub fn new(per_second: u32) -> InkResult<Self> {
        if per_second == 0 {
            return Err(InkError::validation("TickRate per_second must be > 0"));
        }
        Ok(Self { per_second })
    }

    /// Build a tick in this rate.
    pub fn tick(self, value: i64) -> Tick {
        Tick { value, rate: self }
    }

    /// Convert seconds to a tick, rounding half away from zero.
    pub fn secs_to_tick(self, secs: f64) -> Tick {
        self.tick((secs * f64::from(self.per_second)).round() as i64)
    }

    /// Convert a tick count to seconds.
    pub fn ticks_to_secs(self, ticks: i64) -> f64 {
        (ticks as f64) / f64::from(self.per_second)
    }

    /// Reject a tick that was produced in another rate.
    pub fn check(self, tick: Tick) -> InkResult<i64> {
        if tick.rate != self {
            return Err(InkError::validation(format!(
                "tick rate mismatch: expected {}/s, got {}/s",
                self.per_second, tick.rate.per_second
            )));
        }
        Ok(tick.value)
    }
}

/// Exact time position: an integer count in a fixed [`TickRate`].
///
/// Equality and hashing cover both the value and the rate. Ordering is only defined between ticks
/// of the same rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Tick {
    /// Tick count.
    pub value: i64,
    /// Rate the count is expressed in.
    pub rate: TickRate,
}

impl PartialOrd for Tick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.rate != other.rate {
            return None;
        }
        Some(self.value.cmp(&other.value))
    }
}

impl Tick {
    /// Move by `delta` ticks in the same rate (saturating).
    pub fn offset(self, delta: i64) -> Self {
        Self {
            value: self.value.saturating_add(delta),
            rate: self.rate,
        }
    }

    /// Signed distance `other - self` in ticks.
    pub fn delta_to(self, other: Tick) -> InkResult<i64> {
        let o = self.rate.check(other)?;
        Ok(o.saturating_sub(self.value))
    }

    /// Position in seconds.
    pub fn as_secs(self) -> f64 {
        self.rate.ticks_to_secs(self.value)
    }
}

/// Half-open tick range `[start, end)` within one rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TickRange {
    /// Inclusive start.
    pub start: Tick,
    /// Exclusive end.
    pub end: Tick,
}

impl TickRange {
    /// Create a validated range with matching rates and `start <= end`.
    pub fn new(start: Tick, end: Tick) -> InkResult<Self> {
        let end_v = start.rate.check(end)?;
        if start.value > end_v {
            return Err(InkError::validation("TickRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Rate both bounds share.
    pub fn rate(self) -> TickRate {
        self.start.rate
    }

    /// Return `true` when the range holds no ticks.
    pub fn is_empty(self) -> bool {
        self.start.value == self.end.value
    }

    /// Return `true` when `t` is inside `[start, end)`. Ticks of another rate are never contained.
    pub fn contains(self, t: Tick) -> bool {
        t.rate == self.rate() && self.start.value <= t.value && t.value < self.end.value
    }

    /// Clamp into the range. Empty ranges clamp to `start`.
    pub fn clamp(self, t: Tick) -> InkResult<Tick> {
        let v = self.rate().check(t)?;
        if self.is_empty() {
            return Ok(self.start);
        }
        let max_inclusive = self.end.value.saturating_sub(1);
        Ok(self.rate().tick(v.clamp(self.start.value, max_inclusive)))
    }
}

/// Pixel size of an off-screen surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Scale a point size by a device pixel ratio, rounding to whole pixels.
    pub fn from_points(size: Size, scale: f64) -> Self {
        Self {
            width: (size.width * scale).round().max(0.0) as u32,
            height: (size.height * scale).round().max(0.0) as u32,
        }
    }

    /// Return `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Point;
use crate::foundation::error::{InkError, InkResult};

/// Lower bound applied to force when deriving a stroke width, so feather-light touches stay visible.
pub const MIN_FORCE: f64 = 0.025;

/// One stylus sample. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Input-system sequence number; draw order follows it.
    pub sequence_number: i64,
    /// Input timestamp in seconds.
    pub timestamp: f64,
    /// Normalized pressure.
    pub force: f64,
    /// Location x in display points.
    pub x: f64,
    /// Location y in display points.
    pub y: f64,
    /// Stylus altitude in radians.
    pub altitude_angle: f64,
    /// Stylus azimuth in radians.
    pub azimuth_angle: f64,
}

impl Sample {
    /// Location in display points.
    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Stroke width at this sample for a given base width.
    pub fn pressure_width(&self, base_width: f64) -> f64 {
        base_width * self.force.max(MIN_FORCE)
    }
}

/// Process-unique stroke identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrokeId(pub u64);

impl StrokeId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StrokeState {
    Active,
    Committed,
}

/// A drawn stroke: committed samples plus, while active, pending ones.
///
/// The stroke moves from active to committed exactly once and is never revived.
#[derive(Clone, Debug)]
pub struct Stroke {
    id: StrokeId,
    committed: Vec<Sample>,
    pending: Vec<Sample>,
    state: StrokeState,
}

impl Default for Stroke {
    fn default() -> Self {
        Self::new()
    }
}

impl Stroke {
    /// Start a new active stroke with no samples.
    pub fn new() -> Self {
        Self {
            id: StrokeId::next(),
            committed: Vec::new(),
            pending: Vec::new(),
            state: StrokeState::Active,
        }
    }

    /// Build an already-committed stroke, e.g. from persisted data.
    pub fn from_committed(samples: Vec<Sample>) -> InkResult<Self> {
        if let Some(pos) = samples
            .windows(2)
            .position(|w| w[0].sequence_number >= w[1].sequence_number)
        {
            return Err(InkError::validation(format!(
                "stroke samples must have strictly increasing sequence numbers (index {})",
                pos + 1
            )));
        }
        Ok(Self {
            id: StrokeId::next(),
            committed: samples,
            pending: Vec::new(),
            state: StrokeState::Committed,
        })
    }

    /// Identity of this stroke.
    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Return `true` once [`Stroke::commit`] succeeded.
    pub fn is_committed(&self) -> bool {
        self.state == StrokeState::Committed
    }

    /// Append a live sample. Only valid while active; sequence numbers must increase.
    pub fn append_pending(&mut self, sample: Sample) -> InkResult<()> {
        if self.is_committed() {
            return Err(InkError::validation(format!(
                "stroke {} is committed and accepts no samples",
                self.id.0
            )));
        }
        if let Some(last) = self.last_sample()
            && last.sequence_number >= sample.sequence_number
        {
            return Err(InkError::validation(format!(
                "sample sequence number {} does not follow {}",
                sample.sequence_number, last.sequence_number
            )));
        }
        self.pending.push(sample);
        Ok(())
    }

    /// Finalize: move every pending sample into the committed sequence.
    pub fn commit(&mut self) -> InkResult<()> {
        if self.is_committed() {
            return Err(InkError::validation(format!(
                "stroke {} is already committed",
                self.id.0
            )));
        }
        self.committed.append(&mut self.pending);
        self.state = StrokeState::Committed;
        Ok(())
    }

    /// Most recent sample, pending or committed.
    pub fn last_sample(&self) -> Option<&Sample> {
        self.pending.last().or_else(|| self.committed.last())
    }

    /// Committed samples in draw order.
    pub fn committed_samples(&self) -> &[Sample] {
        &self.committed
    }

    /// Samples not yet committed.
    pub fn pending_samples(&self) -> &[Sample] {
        &self.pending
    }

    /// Total number of samples held.
    pub fn len(&self) -> usize {
        self.committed.len() + self.pending.len()
    }

    /// Return `true` when the stroke holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) fn sample_at(seq: i64, x: f64, y: f64) -> Sample {
    Sample {
        sequence_number: seq,
        timestamp: seq as f64 / 240.0,
        force: 1.0,
        x,
        y,
        altitude_angle: std::f64::consts::FRAC_PI_2,
        azimuth_angle: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_moves_pending_and_freezes() {
        let mut s = Stroke::new();
        s.append_pending(sample_at(1, 0.0, 0.0)).unwrap();
        s.append_pending(sample_at(2, 1.0, 1.0)).unwrap();
        assert_eq!(s.pending_samples().len(), 2);
        assert!(s.committed_samples().is_empty());

        s.commit().unwrap();
        assert!(s.is_committed());
        assert_eq!(s.committed_samples().len(), 2);
        assert!(s.pending_samples().is_empty());

        assert!(s.commit().is_err());
        assert!(s.append_pending(sample_at(3, 2.0, 2.0)).is_err());
    }

    #[test]
    fn last_sample_prefers_pending() {
        let mut s = Stroke::new();
        assert!(s.last_sample().is_none());
        s.append_pending(sample_at(4, 0.0, 0.0)).unwrap();
        assert_eq!(s.last_sample().unwrap().sequence_number, 4);
        s.commit().unwrap();
        assert_eq!(s.last_sample().unwrap().sequence_number, 4);
    }

    #[test]
    fn sequence_numbers_must_increase() {
        let mut s = Stroke::new();
        s.append_pending(sample_at(5, 0.0, 0.0)).unwrap();
        assert!(s.append_pending(sample_at(5, 1.0, 0.0)).is_err());
        assert!(s.append_pending(sample_at(3, 1.0, 0.0)).is_err());
        assert_eq!(s.len(), 1);

        assert!(Stroke::from_committed(vec![sample_at(2, 0.0, 0.0), sample_at(1, 0.0, 0.0)]).is_err());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Stroke::new().id(), Stroke::new().id());
    }

    #[test]
    fn pressure_width_has_floor() {
        let mut s = sample_at(1, 0.0, 0.0);
        s.force = 0.0;
        assert!((s.pressure_width(10.0) - 0.25).abs() < 1e-12);
        s.force = 2.0;
        assert!((s.pressure_width(10.0) - 20.0).abs() < 1e-12);
    }
}

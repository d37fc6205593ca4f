use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{Tick, TickRange, TickRate};
use crate::foundation::error::{InkError, InkResult};
use crate::media::decoder::FrameDecoder;
use crate::render::image::FrameImage;

/// Strip geometry in display points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StripLayout {
    /// Half the visible strip width.
    pub half_width: f64,
    /// Width of one thumbnail cell.
    pub cell_width: f64,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            half_width: 512.0,
            cell_width: 78.0,
        }
    }
}

impl StripLayout {
    /// Cells kept on each side of the anchor: `ceil(half_width / cell_width) + 1`.
    pub fn count_outwards(&self) -> u32 {
        if !(self.cell_width > 0.0) || !self.half_width.is_finite() {
            return 1;
        }
        let cells = (self.half_width.max(0.0) / self.cell_width).ceil();
        (cells as u32).saturating_add(1)
    }
}

/// State of one windowed tick.
#[derive(Clone, Debug, PartialEq)]
pub enum ThumbnailSlot {
    /// Requested (or out of media range) and not decoded.
    Pending,
    /// Decoded image.
    Resolved(FrameImage),
}

/// What happened to a decode completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Stored; a redraw is due.
    Resolved,
    /// The tick had left the window; result dropped.
    Discarded,
    /// The decoder produced nothing; the slot stays pending.
    Failed,
}

/// Key-set changes made by one [`ThumbnailCache::update_window`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowUpdate {
    /// Ticks that entered the window.
    pub added: Vec<Tick>,
    /// Ticks that left the window.
    pub removed: Vec<Tick>,
    /// Entered ticks inside the media range, sent to the decoder.
    pub requested: Vec<Tick>,
}

/// One positioned cell of the strip.
#[derive(Clone, Debug, PartialEq)]
pub struct StripCell<'a> {
    /// Tick shown by the cell.
    pub tick: Tick,
    /// Left edge in display points relative to the strip origin.
    pub x: f64,
    /// Decoded image, or `None` to draw a placeholder.
    pub image: Option<&'a FrameImage>,
}

/// Counters for decode traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThumbnailStats {
    /// Ticks sent to the decoder.
    pub requested: u64,
    /// Completions stored.
    pub resolved: u64,
    /// Completions dropped because the tick had been evicted.
    pub discarded_late: u64,
    /// Completions without an image.
    pub failed: u64,
    /// Keys evicted by window moves.
    pub evicted: u64,
}

/// Sliding window of decoded video-frame thumbnails around the playhead.
///
/// Eviction cancels nothing: a decode still in flight for an evicted tick completes and is
/// discarded, and a tick that re-enters the window is requested again.
#[derive(Debug)]
pub struct ThumbnailCache {
    rate: TickRate,
    media_range: TickRange,
    period: i64,
    active: BTreeSet<i64>,
    entries: BTreeMap<i64, ThumbnailSlot>,
    needs_redraw: bool,
    stats: ThumbnailStats,
}

impl ThumbnailCache {
    /// Empty cache for media spanning `media_range`.
    pub fn new(media_range: TickRange) -> Self {
        Self {
            rate: media_range.rate(),
            media_range,
            period: i64::from(media_range.rate().per_second),
            active: BTreeSet::new(),
            entries: BTreeMap::new(),
            needs_redraw: false,
            stats: ThumbnailStats::default(),
        }
    }

    /// Spacing between windowed ticks used by the last update.
    pub fn period(&self) -> i64 {
        self.period
    }

    /// Decode counters.
    pub fn stats(&self) -> ThumbnailStats {
        self.stats
    }

    /// Active window, ascending.
    pub fn active_ticks(&self) -> Vec<Tick> {
        self.active.iter().map(|&v| self.rate.tick(v)).collect()
    }

    /// Slot for `tick`, if it is in the window.
    pub fn slot(&self, tick: Tick) -> Option<&ThumbnailSlot> {
        if tick.rate != self.rate {
            return None;
        }
        self.entries.get(&tick.value)
    }

    /// Return and clear the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Move the window to `current`, evicting keys that left it and requesting the ones that
    /// entered it.
    ///
    /// The window anchors at `floor(current / period) * period` and spans `2 * count_outwards`
    /// ticks starting `count_outwards` periods before the anchor. Only ticks inside the media
    /// range are sent to the decoder; the rest stay pending.
    #[tracing::instrument(skip(self, decoder, current), fields(current = current.value))]
    pub fn update_window(
        &mut self,
        current: Tick,
        period: i64,
        count_outwards: u32,
        decoder: &mut dyn FrameDecoder,
    ) -> InkResult<WindowUpdate> {
        let current = self.rate.check(current)?;
        if period <= 0 {
            return Err(InkError::validation("thumbnail period must be > 0"));
        }
        self.period = period;

        let anchor = current.div_euclid(period).saturating_mul(period);
        let count = i64::from(count_outwards);
        let first = anchor.saturating_sub(count.saturating_mul(period));
        let new_set = (0..count.saturating_mul(2))
            .map(|i| first.saturating_add(i.saturating_mul(period)))
            .collect::<BTreeSet<_>>();

        let mut update = WindowUpdate::default();

        for &t in self.active.difference(&new_set) {
            self.entries.remove(&t);
            update.removed.push(self.rate.tick(t));
        }
        for &t in new_set.difference(&self.active) {
            self.entries.insert(t, ThumbnailSlot::Pending);
            let tick = self.rate.tick(t);
            update.added.push(tick);
            if self.media_range.contains(tick) {
                update.requested.push(tick);
            }
        }
        self.active = new_set;

        self.stats.evicted += update.removed.len() as u64;
        if !update.requested.is_empty() {
            self.stats.requested += update.requested.len() as u64;
            decoder.request_images(&update.requested);
        }
        if !update.added.is_empty() || !update.removed.is_empty() {
            self.needs_redraw = true;
            tracing::debug!(
                added = update.added.len(),
                removed = update.removed.len(),
                requested = update.requested.len(),
                "thumbnail window moved"
            );
        }
        Ok(update)
    }

    /// Apply a decode completion. Results for ticks no longer in the window are discarded.
    pub fn on_decoded(&mut self, tick: Tick, image: Option<FrameImage>) -> DecodeOutcome {
        if tick.rate != self.rate || !self.active.contains(&tick.value) {
            self.stats.discarded_late += 1;
            tracing::debug!(tick = tick.value, "discarding decode for evicted tick");
            return DecodeOutcome::Discarded;
        }
        let Some(image) = image else {
            self.stats.failed += 1;
            tracing::warn!(tick = tick.value, "frame decode produced no image");
            return DecodeOutcome::Failed;
        };
        self.entries.insert(tick.value, ThumbnailSlot::Resolved(image));
        self.stats.resolved += 1;
        self.needs_redraw = true;
        DecodeOutcome::Resolved
    }

    /// Lay the window out as strip cells for playhead `current`.
    ///
    /// Cells are in ascending tick order at `i * cell_width`, shifted left by the playhead's
    /// fractional position within its period.
    pub fn cells(&self, current: Tick, cell_width: f64) -> InkResult<Vec<StripCell<'_>>> {
        let current = self.rate.check(current)?;
        let frac = (current.rem_euclid(self.period) as f64) / (self.period as f64);
        let offset = frac * cell_width;
        Ok(self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (&t, slot))| StripCell {
                tick: self.rate.tick(t),
                x: -offset + (i as f64) * cell_width,
                image: match slot {
                    ThumbnailSlot::Resolved(img) => Some(img),
                    ThumbnailSlot::Pending => None,
                },
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingDecoder {
        batches: Vec<Vec<Tick>>,
    }

    impl FrameDecoder for RecordingDecoder {
        fn request_images(&mut self, ticks: &[Tick]) {
            self.batches.push(ticks.to_vec());
        }
    }

    fn rate() -> TickRate {
        TickRate::new(600).unwrap()
    }

    fn cache() -> ThumbnailCache {
        ThumbnailCache::new(TickRange::new(rate().tick(-600), rate().tick(60_000)).unwrap())
    }

    fn values(ticks: &[Tick]) -> Vec<i64> {
        ticks.iter().map(|t| t.value).collect()
    }

    fn img() -> FrameImage {
        FrameImage::solid(2, 2, [1, 2, 3, 255])
    }

    #[test]
    fn count_outwards_from_layout() {
        let l = StripLayout {
            half_width: 200.0,
            cell_width: 100.0,
        };
        assert_eq!(l.count_outwards(), 3);
        let l = StripLayout {
            half_width: 250.0,
            cell_width: 100.0,
        };
        assert_eq!(l.count_outwards(), 4);
        let l = StripLayout {
            half_width: 250.0,
            cell_width: 0.0,
        };
        assert_eq!(l.count_outwards(), 1);
    }

    #[test]
    fn window_is_exact_and_slides() {
        let mut c = cache();
        let mut dec = RecordingDecoder::default();

        let up = c.update_window(rate().tick(1200), 600, 3, &mut dec).unwrap();
        assert_eq!(
            values(&c.active_ticks()),
            vec![-600, 0, 600, 1200, 1800, 2400]
        );
        assert_eq!(up.added.len(), 6);
        assert!(up.removed.is_empty());

        let up = c.update_window(rate().tick(1800), 600, 3, &mut dec).unwrap();
        assert_eq!(values(&up.removed), vec![-600]);
        assert_eq!(values(&up.added), vec![3000]);
        assert_eq!(values(&c.active_ticks()), vec![0, 600, 1200, 1800, 2400, 3000]);
        assert!(c.slot(rate().tick(-600)).is_none());
        assert_eq!(dec.batches.len(), 2);
        assert_eq!(values(&dec.batches[1]), vec![3000]);
    }

    #[test]
    fn anchor_floors_within_period() {
        let mut c = cache();
        let mut dec = RecordingDecoder::default();
        c.update_window(rate().tick(1799), 600, 1, &mut dec).unwrap();
        assert_eq!(values(&c.active_ticks()), vec![600, 1200]);
        c.update_window(rate().tick(-1), 600, 1, &mut dec).unwrap();
        assert_eq!(values(&c.active_ticks()), vec![-1200, -600]);
    }

    #[test]
    fn out_of_range_ticks_stay_pending_without_request() {
        let mut c = cache();
        let mut dec = RecordingDecoder::default();
        let up = c.update_window(rate().tick(0), 600, 2, &mut dec).unwrap();
        assert_eq!(values(&up.added), vec![-1200, -600, 0, 600]);
        assert_eq!(values(&up.requested), vec![-600, 0, 600]);
        assert_eq!(c.slot(rate().tick(-1200)), Some(&ThumbnailSlot::Pending));
    }

    #[test]
    fn late_decode_for_evicted_tick_is_discarded() {
        let mut c = cache();
        let mut dec = RecordingDecoder::default();
        c.update_window(rate().tick(1200), 600, 3, &mut dec).unwrap();
        c.update_window(rate().tick(1800), 600, 3, &mut dec).unwrap();

        assert_eq!(c.on_decoded(rate().tick(-600), Some(img())), DecodeOutcome::Discarded);
        assert!(c.slot(rate().tick(-600)).is_none());
        assert_eq!(c.stats().discarded_late, 1);

        // Re-entering asks the decoder again instead of reusing anything.
        c.update_window(rate().tick(1200), 600, 3, &mut dec).unwrap();
        assert_eq!(c.slot(rate().tick(-600)), Some(&ThumbnailSlot::Pending));
        assert_eq!(values(dec.batches.last().unwrap()), vec![-600]);
    }

    #[test]
    fn decode_resolves_and_flags_redraw() {
        let mut c = cache();
        let mut dec = RecordingDecoder::default();
        c.update_window(rate().tick(600), 600, 1, &mut dec).unwrap();
        assert!(c.take_redraw());
        assert!(!c.take_redraw());

        assert_eq!(c.on_decoded(rate().tick(0), Some(img())), DecodeOutcome::Resolved);
        assert!(c.take_redraw());
        assert_eq!(c.slot(rate().tick(0)), Some(&ThumbnailSlot::Resolved(img())));

        assert_eq!(c.on_decoded(rate().tick(600), None), DecodeOutcome::Failed);
        assert_eq!(c.slot(rate().tick(600)), Some(&ThumbnailSlot::Pending));
    }

    #[test]
    fn cells_shift_by_playhead_fraction() {
        let mut c = cache();
        let mut dec = RecordingDecoder::default();
        c.update_window(rate().tick(1500), 600, 1, &mut dec).unwrap();
        c.on_decoded(rate().tick(1200), Some(img()));

        let cells = c.cells(rate().tick(1500), 100.0).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].tick.value, 600);
        assert!((cells[0].x + 50.0).abs() < 1e-9);
        assert!((cells[1].x - 50.0).abs() < 1e-9);
        assert!(cells[0].image.is_none());
        assert!(cells[1].image.is_some());
    }

    #[test]
    fn rejects_bad_period_and_rate() {
        let mut c = cache();
        let mut dec = RecordingDecoder::default();
        assert!(c.update_window(rate().tick(0), 0, 3, &mut dec).is_err());
        let other = TickRate::new(30).unwrap().tick(0);
        assert!(c.update_window(other, 30, 3, &mut dec).is_err());
        assert_eq!(c.on_decoded(other, Some(img())), DecodeOutcome::Discarded);
    }
}

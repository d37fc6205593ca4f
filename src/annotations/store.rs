use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use crate::foundation::core::{Point, Size, Tick, TickRate};
use crate::foundation::error::{InkError, InkResult};
use crate::foundation::fingerprint::{Fingerprint, fingerprint_strokes};
use crate::render::cpu::CpuSurface;
use crate::render::image::FrameImage;
use crate::render::surface::{StrokeStyle, StrokeSurface};
use crate::stroke::model::{Sample, Stroke, StrokeId};

/// Render targets and paint for annotation images.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotationOpts {
    /// Full-frame drawing area in display points.
    pub full_frame_size: Size,
    /// Thumbnail drawing area in display points.
    pub thumbnail_size: Size,
    /// Device pixel ratio applied to both surfaces.
    pub pixel_ratio: f64,
    /// Stroke paint.
    pub style: StrokeStyle,
}

impl Default for AnnotationOpts {
    fn default() -> Self {
        Self {
            full_frame_size: Size::new(1024.0, 576.0),
            thumbnail_size: Size::new(128.0, 72.0),
            pixel_ratio: 2.0,
            style: StrokeStyle::default(),
        }
    }
}

impl AnnotationOpts {
    /// Factor mapping full-frame points onto the thumbnail.
    pub fn thumbnail_scale(&self) -> f64 {
        if self.full_frame_size.width > 0.0 {
            self.thumbnail_size.width / self.full_frame_size.width
        } else {
            1.0
        }
    }
}

/// A still-active stroke's sample, recorded at the tick it was live on.
///
/// The stroke is referenced by identity only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynamicSample {
    /// Stroke the sample belongs to.
    pub stroke: StrokeId,
    /// The sample itself.
    pub sample: Sample,
}

/// One weighted location produced by [`AnnotationStore::focus_weights_at`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusPoint {
    /// Tick the dynamic sample was recorded at.
    pub tick: Tick,
    /// `1` at the queried tick, falling linearly towards `0` at the span boundary.
    pub weight: f64,
    /// Sample location.
    pub point: Point,
}

/// Strokes of one tick and their rendered images.
#[derive(Clone, Debug)]
pub struct RenderedAnnotation {
    /// Strokes completed at the tick.
    pub strokes: Vec<Arc<Stroke>>,
    /// Full-resolution image.
    pub full: FrameImage,
    /// Thumbnail image.
    pub thumb: FrameImage,
}

#[derive(Clone, Debug)]
struct CachedImage {
    image: FrameImage,
    source: Fingerprint,
}

/// Counters for rendering work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Successful surface renders (full and thumbnail counted separately).
    pub renders: u64,
    /// Snapshots that produced no image.
    pub snapshot_failures: u64,
}

/// Tick-indexed annotation data plus the lazily rendered image cache derived from it.
///
/// Image invalidation is explicit: recording strokes does not drop cached images on its own.
pub struct AnnotationStore {
    rate: TickRate,
    opts: AnnotationOpts,
    static_entries: BTreeMap<i64, Vec<Arc<Stroke>>>,
    dynamic_entries: BTreeMap<i64, Vec<DynamicSample>>,
    full_images: HashMap<i64, CachedImage>,
    thumb_images: HashMap<i64, CachedImage>,
    full_surface: Box<dyn StrokeSurface>,
    thumb_surface: Box<dyn StrokeSurface>,
    stats: StoreStats,
}

impl std::fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("rate", &self.rate)
            .field("static_ticks", &self.static_entries.len())
            .field("dynamic_ticks", &self.dynamic_entries.len())
            .field("cached_full", &self.full_images.len())
            .field("cached_thumb", &self.thumb_images.len())
            .finish()
    }
}

impl AnnotationStore {
    /// Store rendering through CPU surfaces.
    pub fn new(rate: TickRate, opts: AnnotationOpts) -> Self {
        let full = CpuSurface::new(opts.pixel_ratio, opts.style);
        let thumb = CpuSurface::scaled(opts.pixel_ratio, opts.thumbnail_scale(), opts.style);
        Self::with_surfaces(rate, opts, Box::new(full), Box::new(thumb))
    }

    /// Store rendering through caller-provided surfaces.
    pub fn with_surfaces(
        rate: TickRate,
        opts: AnnotationOpts,
        full_surface: Box<dyn StrokeSurface>,
        thumb_surface: Box<dyn StrokeSurface>,
    ) -> Self {
        Self {
            rate,
            opts,
            static_entries: BTreeMap::new(),
            dynamic_entries: BTreeMap::new(),
            full_images: HashMap::new(),
            thumb_images: HashMap::new(),
            full_surface,
            thumb_surface,
            stats: StoreStats::default(),
        }
    }

    /// Rate every key of this store is expressed in.
    pub fn rate(&self) -> TickRate {
        self.rate
    }

    /// Current render options.
    pub fn opts(&self) -> &AnnotationOpts {
        &self.opts
    }

    /// Rendering counters.
    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Append a committed stroke to the static entry at `tick`.
    ///
    /// Returns `true` when images are cached for `tick`; they no longer match the strokes until
    /// the caller invalidates them.
    #[must_use = "cached images for the tick must be invalidated by the caller"]
    pub fn record_stroke(&mut self, tick: Tick, stroke: Stroke) -> InkResult<bool> {
        let key = self.rate.check(tick)?;
        if !stroke.is_committed() {
            return Err(InkError::validation(format!(
                "stroke {} must be committed before it is recorded",
                stroke.id().0
            )));
        }
        self.static_entries
            .entry(key)
            .or_default()
            .push(Arc::new(stroke));
        Ok(self.has_cached_images(tick))
    }

    /// Replace the whole static entry at `tick` and drop its cached images.
    ///
    /// An empty list removes the entry.
    pub fn replace_strokes(&mut self, tick: Tick, strokes: Vec<Arc<Stroke>>) -> InkResult<()> {
        let key = self.rate.check(tick)?;
        if let Some(s) = strokes.iter().find(|s| !s.is_committed()) {
            return Err(InkError::validation(format!(
                "stroke {} must be committed before it is recorded",
                s.id().0
            )));
        }
        if strokes.is_empty() {
            self.static_entries.remove(&key);
        } else {
            self.static_entries.insert(key, strokes);
        }
        self.drop_images(key);
        Ok(())
    }

    /// Remove the static entry at `tick`, returning its strokes.
    pub fn remove_strokes(&mut self, tick: Tick) -> InkResult<Vec<Arc<Stroke>>> {
        let key = self.rate.check(tick)?;
        self.drop_images(key);
        Ok(self.static_entries.remove(&key).unwrap_or_default())
    }

    /// Append a live sample of a still-active stroke at `tick`.
    pub fn record_dynamic_sample(
        &mut self,
        tick: Tick,
        stroke: StrokeId,
        sample: Sample,
    ) -> InkResult<()> {
        let key = self.rate.check(tick)?;
        self.dynamic_entries
            .entry(key)
            .or_default()
            .push(DynamicSample { stroke, sample });
        Ok(())
    }

    /// Strokes completed at `tick` (empty when none).
    pub fn strokes_at(&self, tick: Tick) -> InkResult<&[Arc<Stroke>]> {
        let key = self.rate.check(tick)?;
        Ok(self
            .static_entries
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Dynamic samples recorded at `tick` (empty when none).
    pub fn dynamic_at(&self, tick: Tick) -> InkResult<&[DynamicSample]> {
        let key = self.rate.check(tick)?;
        Ok(self
            .dynamic_entries
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Static entries in tick order.
    pub fn static_entries(&self) -> impl Iterator<Item = (Tick, &[Arc<Stroke>])> {
        self.static_entries
            .iter()
            .map(|(&k, v)| (self.rate.tick(k), v.as_slice()))
    }

    /// Dynamic entries in tick order.
    pub fn dynamic_entries(&self) -> impl Iterator<Item = (Tick, &[DynamicSample])> {
        self.dynamic_entries
            .iter()
            .map(|(&k, v)| (self.rate.tick(k), v.as_slice()))
    }

    /// Return `true` when either image is cached for `tick`.
    pub fn has_cached_images(&self, tick: Tick) -> bool {
        tick.rate == self.rate
            && (self.full_images.contains_key(&tick.value)
                || self.thumb_images.contains_key(&tick.value))
    }

    /// Drop cached images for `tick` so the next read renders again.
    pub fn invalidate_images(&mut self, tick: Tick) -> InkResult<()> {
        let key = self.rate.check(tick)?;
        self.drop_images(key);
        Ok(())
    }

    /// Drop cached images for `tick` whose source strokes no longer match the entry.
    ///
    /// Compares stroke content, not stroke counts. Returns `true` when anything was dropped.
    pub fn refresh_images(&mut self, tick: Tick) -> InkResult<bool> {
        let key = self.rate.check(tick)?;
        let current = self.static_entries.get(&key).map(|s| fingerprint_strokes(s));
        let mut dropped = false;
        for cache in [&mut self.full_images, &mut self.thumb_images] {
            if cache
                .get(&key)
                .is_some_and(|c| Some(c.source) != current)
            {
                cache.remove(&key);
                dropped = true;
            }
        }
        Ok(dropped)
    }

    /// Strokes at `tick` with their full and thumbnail images, rendering whatever is not cached.
    ///
    /// `None` when no strokes were completed at `tick`, or when a surface failed to produce an
    /// image; in the latter case nothing is cached for that surface and the next call retries.
    #[tracing::instrument(skip(self, tick), fields(tick = tick.value))]
    pub fn rendered_images_at(&mut self, tick: Tick) -> InkResult<Option<RenderedAnnotation>> {
        let key = self.rate.check(tick)?;
        let Some(strokes) = self.static_entries.get(&key) else {
            return Ok(None);
        };

        if !self.full_images.contains_key(&key) {
            let Some(img) = render_strokes(
                self.full_surface.as_mut(),
                self.opts.full_frame_size,
                strokes,
            ) else {
                tracing::warn!(tick = key, "failed to make a full-frame annotation image");
                self.stats.snapshot_failures += 1;
                return Ok(None);
            };
            self.stats.renders += 1;
            self.full_images.insert(
                key,
                CachedImage {
                    image: img,
                    source: fingerprint_strokes(strokes),
                },
            );
        }

        if !self.thumb_images.contains_key(&key) {
            let Some(img) = render_strokes(
                self.thumb_surface.as_mut(),
                self.opts.thumbnail_size,
                strokes,
            ) else {
                tracing::warn!(tick = key, "failed to make a thumbnail annotation image");
                self.stats.snapshot_failures += 1;
                return Ok(None);
            };
            self.stats.renders += 1;
            self.thumb_images.insert(
                key,
                CachedImage {
                    image: img,
                    source: fingerprint_strokes(strokes),
                },
            );
        }

        match (self.full_images.get(&key), self.thumb_images.get(&key)) {
            (Some(full), Some(thumb)) => Ok(Some(RenderedAnnotation {
                strokes: strokes.clone(),
                full: full.image.clone(),
                thumb: thumb.image.clone(),
            })),
            _ => Ok(None),
        }
    }

    /// Weighted locations of dynamic samples strictly within `half_span` ticks of `tick`.
    ///
    /// Entries exactly `half_span` away are excluded; a non-positive span yields nothing.
    pub fn focus_weights_at(&self, tick: Tick, half_span: i64) -> InkResult<Vec<FocusPoint>> {
        let center = self.rate.check(tick)?;
        if half_span <= 0 {
            return Ok(Vec::new());
        }
        let lo = center.saturating_sub(half_span);
        let hi = center.saturating_add(half_span);
        if lo >= hi {
            return Ok(Vec::new());
        }

        let span = half_span as f64;
        let mut out = Vec::new();
        for (&k, entries) in self
            .dynamic_entries
            .range((Bound::Excluded(lo), Bound::Excluded(hi)))
        {
            let weight = 1.0 - (k.abs_diff(center) as f64) / span;
            for d in entries {
                out.push(FocusPoint {
                    tick: self.rate.tick(k),
                    weight: weight.clamp(0.0, 1.0),
                    point: d.sample.location(),
                });
            }
        }
        Ok(out)
    }

    fn drop_images(&mut self, key: i64) {
        self.full_images.remove(&key);
        self.thumb_images.remove(&key);
    }
}

fn render_strokes(
    surface: &mut dyn StrokeSurface,
    size: Size,
    strokes: &[Arc<Stroke>],
) -> Option<FrameImage> {
    surface.clear(size);
    for stroke in strokes {
        surface.draw_polyline(stroke.committed_samples(), true);
    }
    surface.snapshot_image()
}

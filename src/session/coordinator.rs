use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::annotations::store::{AnnotationStore, FocusPoint};
use crate::foundation::core::Tick;
use crate::foundation::error::{InkError, InkResult};
use crate::media::decoder::FrameDecoder;
use crate::media::source::MediaInfo;
use crate::playback::scrub::{ScrubAnimator, ScrubStep};
use crate::playback::seek::{Playback, PlaybackRate, SeekController, SeekStep};
use crate::playback::ticker::Ticker;
use crate::render::image::FrameImage;
use crate::session::events::{EventQueue, EventSender, SessionEvent};
use crate::session::opts::SessionOpts;
use crate::stroke::model::{Sample, Stroke, StrokeId};
use crate::timeline::thumbnails::{DecodeOutcome, StripCell, ThumbnailCache};

/// External services owned by a session.
#[derive(Debug)]
pub struct Services<P, D, T> {
    /// Player.
    pub playback: P,
    /// Thumbnail frame decoder.
    pub decoder: D,
    /// Scrub timer.
    pub ticker: T,
}

/// What to draw for the playhead tick.
#[derive(Clone, Debug)]
pub struct FrameView {
    /// Playhead tick.
    pub tick: Tick,
    /// Strokes completed at the tick.
    pub strokes: Vec<Arc<Stroke>>,
    /// Full-frame annotation image, when there are strokes and rendering succeeded.
    pub full: Option<FrameImage>,
    /// Thumbnail annotation image.
    pub thumb: Option<FrameImage>,
    /// Weighted dynamic samples around the tick.
    pub focus: Vec<FocusPoint>,
}

/// Result of draining the event queue.
#[derive(Clone, Debug, Default)]
pub struct PumpReport {
    /// Events handled.
    pub handled: usize,
    /// View for the latest playhead change, if the playhead moved.
    pub view: Option<FrameView>,
    /// The thumbnail strip changed and should be redrawn.
    pub redraw_strip: bool,
}

/// Single owner of annotation state and its collaborators.
///
/// All mutation happens on the caller's thread. Services report back through the session's
/// event queue, and [`AnnotationSession::pump`] applies their events in arrival order.
pub struct AnnotationSession<P: Playback, D: FrameDecoder, T: Ticker> {
    opts: SessionOpts,
    media: MediaInfo,
    services: Services<P, D, T>,
    queue: EventQueue,
    events: EventSender,
    store: AnnotationStore,
    thumbnails: ThumbnailCache,
    seek: SeekController,
    scrub: ScrubAnimator,
    current: Option<Tick>,
    active_stroke: Option<Stroke>,
}

impl<P: Playback, D: FrameDecoder, T: Ticker> std::fmt::Debug for AnnotationSession<P, D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("media", &self.media)
            .field("current", &self.current)
            .field("seek", &self.seek.state())
            .field("scrubbing", &self.scrub.is_active())
            .field("store", &self.store)
            .finish()
    }
}

impl<P: Playback, D: FrameDecoder, T: Ticker> AnnotationSession<P, D, T> {
    /// Assemble a session. `store` must use the media's rate and `opts.annotation`; `queue` is
    /// the queue the services were given senders for.
    pub fn new(
        opts: SessionOpts,
        media: MediaInfo,
        store: AnnotationStore,
        queue: EventQueue,
        services: Services<P, D, T>,
    ) -> InkResult<Self> {
        if store.rate() != media.rate {
            return Err(InkError::validation(format!(
                "store rate {}/s does not match media rate {}/s",
                store.rate().per_second,
                media.rate.per_second
            )));
        }
        if *store.opts() != opts.annotation {
            return Err(InkError::validation(
                "store render options do not match the session's annotation options",
            ));
        }
        let events = queue.sender();
        Ok(Self {
            thumbnails: ThumbnailCache::new(media.range),
            scrub: ScrubAnimator::new(opts.scrub_ease),
            seek: SeekController::new(PlaybackRate::default()),
            opts,
            media,
            services,
            queue,
            events,
            store,
            current: None,
            active_stroke: None,
        })
    }

    /// Options the session was built with.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Media being annotated.
    pub fn media(&self) -> &MediaInfo {
        &self.media
    }

    /// Sender for additional services.
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Annotation data.
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Mutable annotation data.
    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    /// Thumbnail strip cache.
    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Seek controller.
    pub fn seek(&self) -> &SeekController {
        &self.seek
    }

    /// Owned services.
    pub fn services(&self) -> &Services<P, D, T> {
        &self.services
    }

    /// Mutable access to the owned services.
    pub fn services_mut(&mut self) -> &mut Services<P, D, T> {
        &mut self.services
    }

    /// Tick the session last adopted.
    pub fn current_tick(&self) -> Option<Tick> {
        self.current
    }

    /// Id of the stroke being drawn.
    pub fn active_stroke(&self) -> Option<StrokeId> {
        self.active_stroke.as_ref().map(Stroke::id)
    }

    /// Consume the session, returning its store.
    pub fn into_store(self) -> AnnotationStore {
        self.store
    }

    /// Adopt a new playhead tick.
    ///
    /// Returns `None` when the tick is unchanged. Otherwise records the active stroke's last
    /// sample at the previous tick, moves the thumbnail window and returns the new view.
    #[tracing::instrument(skip(self, tick), fields(tick = tick.value))]
    pub fn set_time(&mut self, tick: Tick) -> InkResult<Option<FrameView>> {
        self.media.rate.check(tick)?;
        if self.current == Some(tick) {
            return Ok(None);
        }

        if let (Some(old), Some(stroke)) = (self.current, self.active_stroke.as_ref())
            && let Some(last) = stroke.last_sample()
        {
            self.store.record_dynamic_sample(old, stroke.id(), *last)?;
        }
        self.current = Some(tick);

        let period = self.opts.thumbnail_period_in(self.media.rate);
        self.thumbnails.update_window(
            tick,
            period,
            self.opts.strip.count_outwards(),
            &mut self.services.decoder,
        )?;

        self.view_at(tick).map(Some)
    }

    /// Build the view for `tick` without moving the playhead.
    pub fn view_at(&mut self, tick: Tick) -> InkResult<FrameView> {
        let strokes = self.store.strokes_at(tick)?.to_vec();
        let (full, thumb) = match self.store.rendered_images_at(tick)? {
            Some(r) => (Some(r.full), Some(r.thumb)),
            None => (None, None),
        };
        let half_span = self.opts.focus_half_span_in(self.media.rate);
        let focus = self.store.focus_weights_at(tick, half_span)?;
        Ok(FrameView {
            tick,
            strokes,
            full,
            thumb,
            focus,
        })
    }

    /// Lay out the thumbnail strip around the current tick.
    pub fn strip_cells(&self) -> InkResult<Vec<StripCell<'_>>> {
        let Some(current) = self.current else {
            return Ok(Vec::new());
        };
        self.thumbnails.cells(current, self.opts.strip.cell_width)
    }

    /// Start a new stroke. Fails while another stroke is active.
    pub fn begin_stroke(&mut self) -> InkResult<StrokeId> {
        if let Some(active) = &self.active_stroke {
            return Err(InkError::validation(format!(
                "stroke {} is still active",
                active.id().0
            )));
        }
        let stroke = Stroke::new();
        let id = stroke.id();
        self.active_stroke = Some(stroke);
        Ok(id)
    }

    /// Append a live sample to the active stroke.
    pub fn extend_stroke(&mut self, sample: Sample) -> InkResult<()> {
        let stroke = self
            .active_stroke
            .as_mut()
            .ok_or_else(|| InkError::validation("no active stroke"))?;
        stroke.append_pending(sample)
    }

    /// Commit the active stroke at the current tick and invalidate that tick's images.
    ///
    /// Returns the tick it was recorded at; strokes without samples are dropped and yield `None`.
    pub fn end_stroke(&mut self) -> InkResult<Option<Tick>> {
        let mut stroke = self
            .active_stroke
            .take()
            .ok_or_else(|| InkError::validation("no active stroke"))?;
        if stroke.is_empty() {
            return Ok(None);
        }
        let Some(tick) = self.current else {
            return Err(InkError::validation(
                "cannot record a stroke before the playhead time is known",
            ));
        };
        stroke.commit()?;
        if self.store.record_stroke(tick, stroke)? {
            self.store.invalidate_images(tick)?;
        }
        Ok(Some(tick))
    }

    /// Drop the active stroke without recording it.
    pub fn cancel_stroke(&mut self) -> Option<Stroke> {
        self.active_stroke.take()
    }

    /// Clamp `target` to the media range and make it the desired time, cancelling any scrub.
    pub fn request_time(&mut self, target: Tick) -> InkResult<Tick> {
        if self.scrub.is_active() {
            self.scrub.cancel();
            self.services.ticker.stop();
        }
        self.chase(target)
    }

    fn chase(&mut self, target: Tick) -> InkResult<Tick> {
        let clamped = self.media.range.clamp(target)?;
        self.seek
            .request_seek(clamped, &mut self.services.playback, &self.events);
        Ok(clamped)
    }

    /// Animate the desired time to `target` over the default scrub duration.
    pub fn scrub_to(&mut self, target: Tick) -> InkResult<()> {
        self.scrub_to_over(target, self.opts.scrub_duration)
    }

    /// Animate the desired time to `target` over `duration`, superseding any running scrub.
    pub fn scrub_to_over(&mut self, target: Tick, duration: Duration) -> InkResult<()> {
        let target = self.media.range.clamp(target)?;
        let from = self
            .seek
            .desired()
            .or(self.current)
            .unwrap_or_else(|| self.services.playback.current_tick());
        self.scrub.scrub(from, target, duration, Instant::now())?;
        self.services.ticker.stop();
        self.services
            .ticker
            .start(self.opts.scrub_hz, self.events.clone());
        Ok(())
    }

    /// Change the user playback rate; deferred while a seek is in flight.
    pub fn set_rate(&mut self, rate: PlaybackRate) {
        self.seek.set_rate(rate, &mut self.services.playback);
    }

    /// Apply one event.
    pub fn handle(&mut self, event: SessionEvent) -> InkResult<Option<FrameView>> {
        match event {
            SessionEvent::FrameDecoded { tick, image } => {
                if self.thumbnails.on_decoded(tick, image) == DecodeOutcome::Resolved {
                    tracing::trace!(tick = tick.value, "thumbnail resolved");
                }
                Ok(None)
            }
            SessionEvent::SeekCompleted { target } => {
                let step = self.seek.on_seek_completed(
                    target,
                    &mut self.services.playback,
                    &self.events,
                );
                if let SeekStep::Settled(t) = step {
                    return self.set_time(t);
                }
                Ok(None)
            }
            SessionEvent::PlayheadMoved { tick } => self.set_time(tick),
            SessionEvent::TimerFired { at } => {
                match self.scrub.on_timer(at) {
                    Some(ScrubStep::Moving(t)) => {
                        self.chase(t)?;
                    }
                    Some(ScrubStep::Arrived(t)) => {
                        self.chase(t)?;
                        self.services.ticker.stop();
                    }
                    None => self.services.ticker.stop(),
                }
                Ok(None)
            }
        }
    }

    /// Drain queued events in arrival order.
    pub fn pump(&mut self) -> InkResult<PumpReport> {
        self.drain(None)
    }

    /// Wait up to `timeout` for the first event, then drain like [`Self::pump`].
    pub fn pump_timeout(&mut self, timeout: Duration) -> InkResult<PumpReport> {
        let first = self.queue.next_timeout(timeout);
        self.drain(first)
    }

    fn drain(&mut self, first: Option<SessionEvent>) -> InkResult<PumpReport> {
        let mut report = PumpReport::default();
        let mut next = first.or_else(|| self.queue.try_next());
        while let Some(event) = next {
            report.handled += 1;
            if let Some(view) = self.handle(event)? {
                report.view = Some(view);
            }
            next = self.queue.try_next();
        }
        report.redraw_strip = self.thumbnails.take_redraw();
        Ok(report)
    }
}

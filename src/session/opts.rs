use std::time::Duration;

use crate::animation::ease::Ease;
use crate::annotations::store::AnnotationOpts;
use crate::foundation::core::TickRate;
use crate::timeline::thumbnails::StripLayout;

/// Options for an [`AnnotationSession`](crate::session::coordinator::AnnotationSession).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionOpts {
    /// Annotation render targets.
    pub annotation: AnnotationOpts,
    /// Thumbnail strip geometry.
    pub strip: StripLayout,
    /// Spacing of strip thumbnails in seconds.
    pub thumbnail_period_secs: f64,
    /// Focus half span in ticks; `None` means half a second in the media rate.
    pub focus_half_span: Option<i64>,
    /// Scrub timer rate in Hz.
    pub scrub_hz: f64,
    /// Default scrub animation length.
    pub scrub_duration: Duration,
    /// Scrub easing.
    pub scrub_ease: Ease,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            annotation: AnnotationOpts::default(),
            strip: StripLayout::default(),
            thumbnail_period_secs: 1.0,
            focus_half_span: None,
            scrub_hz: 60.0,
            scrub_duration: Duration::from_millis(300),
            scrub_ease: Ease::OutSine,
        }
    }
}

impl SessionOpts {
    /// Apply `INKFRAME_SCREEN_SCALE`, `INKFRAME_SCRUB_HZ`, `INKFRAME_SCRUB_EASE` and
    /// `INKFRAME_FOCUS_HALF_SPAN`.
    ///
    /// Unparseable or non-positive values are ignored. Ease names are snake_case
    /// (`out_sine`, `in_out_sine`, `linear`, ...).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(scale) = var("INKFRAME_SCREEN_SCALE")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&s| s.is_finite() && s > 0.0)
        {
            self.annotation.pixel_ratio = scale;
        }
        if let Some(hz) = var("INKFRAME_SCRUB_HZ")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&hz| hz.is_finite() && hz > 0.0)
        {
            self.scrub_hz = hz;
        }
        if let Some(ease) = var("INKFRAME_SCRUB_EASE").and_then(|v| Ease::from_name(v.trim())) {
            self.scrub_ease = ease;
        }
        if let Some(span) = var("INKFRAME_FOCUS_HALF_SPAN")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&n| n > 0)
        {
            self.focus_half_span = Some(span);
        }
        self
    }

    /// Focus half span in `rate`.
    pub fn focus_half_span_in(&self, rate: TickRate) -> i64 {
        self.focus_half_span
            .unwrap_or(i64::from(rate.per_second) / 2)
    }

    /// Strip thumbnail spacing in `rate`, at least one tick.
    pub fn thumbnail_period_in(&self, rate: TickRate) -> i64 {
        rate.secs_to_tick(self.thumbnail_period_secs).value.max(1)
    }
}

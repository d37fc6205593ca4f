//! Inkframe records pressure-sensitive strokes drawn over a playing video and recalls them
//! exactly when the playhead revisits the same instant.
//!
//! - Strokes are keyed by an integer [`Tick`] in the media's [`TickRate`]
//! - An [`AnnotationStore`] renders and caches each tick's annotation images
//! - A [`ThumbnailCache`] keeps decoded frames resident around the playhead
//! - A [`SeekController`] collapses seek bursts into one convergent seek
//! - An [`AnnotationSession`] owns all of the above and applies service events in order
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Easing curves.
pub mod animation;
/// Annotation store.
pub mod annotations;
/// Bundle persistence.
pub mod document;
/// Shared vocabulary.
pub mod foundation;
/// Video metadata and decoding.
pub mod media;
/// Seek, scrub and timers.
pub mod playback;
/// Stroke rasterization.
pub mod render;
/// Session coordinator.
pub mod session;
/// Strokes and their codec.
pub mod stroke;
/// Thumbnail strip.
pub mod timeline;

pub use crate::animation::ease::Ease;
pub use crate::annotations::store::{
    AnnotationOpts, AnnotationStore, DynamicSample, FocusPoint, RenderedAnnotation, StoreStats,
};
pub use crate::document::bundle::{Document, DocumentSummary, MovieRef};
pub use crate::foundation::core::{Affine, PixelSize, Point, Size, Tick, TickRange, TickRate};
pub use crate::foundation::error::{DocumentErrorKind, InkError, InkResult};
pub use crate::foundation::fingerprint::{Fingerprint, fingerprint_image, fingerprint_strokes};
pub use crate::media::decoder::{FfmpegFrameDecoder, FrameDecoder};
pub use crate::media::source::{MediaInfo, probe_video};
pub use crate::playback::scrub::{ScrubAnimator, ScrubStep};
pub use crate::playback::seek::{Playback, PlaybackRate, SeekController, SeekState, SeekStep};
pub use crate::playback::ticker::{ThreadTicker, Ticker};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::image::FrameImage;
pub use crate::render::surface::{StrokeStyle, StrokeSurface};
pub use crate::session::coordinator::{AnnotationSession, FrameView, PumpReport, Services};
pub use crate::session::events::{EventQueue, EventSender, SeekCompletion, SessionEvent};
pub use crate::session::opts::SessionOpts;
pub use crate::stroke::codec::{ColumnarRecord, SampleRecord};
pub use crate::stroke::model::{MIN_FORCE, Sample, Stroke, StrokeId};
pub use crate::timeline::thumbnails::{
    DecodeOutcome, StripCell, StripLayout, ThumbnailCache, ThumbnailSlot, ThumbnailStats,
    WindowUpdate,
};

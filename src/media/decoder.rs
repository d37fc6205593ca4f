use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use crate::foundation::core::{PixelSize, Tick};
use crate::foundation::error::{InkError, InkResult};
use crate::media::source::{MediaInfo, decode_frame_rgba8};
use crate::render::image::FrameImage;
use crate::session::events::EventSender;

/// Asynchronous frame-decode service.
///
/// Requests are best-effort: completions arrive as
/// [`SessionEvent::FrameDecoded`](crate::session::events::SessionEvent) in any order, and a tick
/// that cannot be served may be dropped or reported with no image.
pub trait FrameDecoder {
    /// Queue decodes for `ticks`. Never blocks on decoding.
    fn request_images(&mut self, ticks: &[Tick]);
}

/// [`FrameDecoder`] that runs `ffmpeg` on a worker thread.
///
/// Dropping the decoder stops the worker before its next queued tick without waiting for it;
/// a decode already running finishes in the background and its result is not delivered.
#[derive(Debug)]
pub struct FfmpegFrameDecoder {
    jobs: Option<mpsc::Sender<Vec<Tick>>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FfmpegFrameDecoder {
    /// Start the worker. Frames are scaled to fit `max_width` pixels at the media's aspect and
    /// delivered through `events`.
    pub fn spawn(info: MediaInfo, max_width: u32, events: EventSender) -> InkResult<Self> {
        if !cfg!(feature = "media-ffmpeg") {
            return Err(InkError::media(
                "video decoding requires the 'media-ffmpeg' feature",
            ));
        }
        let size = info.thumbnail_pixels(max_width);
        if size.is_empty() {
            return Err(InkError::media("thumbnail size is zero"));
        }
        tracing::debug!(
            width = size.width,
            height = size.height,
            "starting frame decoder"
        );
        Self::start(move |tick| decode_thumbnail(&info, tick, size), events)
    }

    fn start<F>(mut decode: F, events: EventSender) -> InkResult<Self>
    where
        F: FnMut(Tick) -> Option<FrameImage> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Vec<Tick>>();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let worker = std::thread::Builder::new()
            .name("inkframe-decode".to_string())
            .spawn(move || {
                for batch in rx {
                    for tick in batch {
                        if flag.load(Ordering::Relaxed) {
                            return;
                        }
                        let image = decode(tick);
                        if flag.load(Ordering::Relaxed) || !events.frame_decoded(tick, image) {
                            return;
                        }
                    }
                }
            })
            .map_err(|e| InkError::media(format!("failed to spawn decode worker: {e}")))?;

        Ok(Self {
            jobs: Some(tx),
            stop,
            worker: Some(worker),
        })
    }
}

impl FrameDecoder for FfmpegFrameDecoder {
    fn request_images(&mut self, ticks: &[Tick]) {
        let Some(jobs) = self.jobs.as_ref() else {
            return;
        };
        if jobs.send(ticks.to_vec()).is_err() {
            tracing::warn!(count = ticks.len(), "decode worker gone; dropping requests");
        }
    }
}

impl Drop for FfmpegFrameDecoder {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.jobs = None;
        // Detached: the worker exits on its own once the running decode returns.
        drop(self.worker.take());
    }
}

fn decode_thumbnail(info: &MediaInfo, tick: Tick, size: PixelSize) -> Option<FrameImage> {
    let decoded = decode_frame_rgba8(info, tick, size)
        .and_then(|rgba| FrameImage::from_straight_rgba8(size.width, size.height, rgba));
    match decoded {
        Ok(img) => Some(img),
        Err(e) => {
            tracing::warn!(tick = tick.value, error = %e, "frame decode failed");
            None
        }
    }
}

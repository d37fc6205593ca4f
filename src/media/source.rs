use std::path::{Path, PathBuf};

use crate::foundation::core::{PixelSize, Tick, TickRange, TickRate};
#[cfg(feature = "media-ffmpeg")]
use crate::foundation::error::InkError;
use crate::foundation::error::InkResult;

/// Basic metadata about the annotated video.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    /// Source path used for probing and decoding.
    pub source_path: PathBuf,
    /// Rate every tick of this media is expressed in.
    pub rate: TickRate,
    /// Valid playhead range.
    pub range: TickRange,
    /// Frame width in pixels.
    pub frame_width: u32,
    /// Frame height in pixels.
    pub frame_height: u32,
}

impl MediaInfo {
    /// Media spanning `duration_secs` from tick zero.
    pub fn new(
        source_path: impl Into<PathBuf>,
        rate: TickRate,
        duration_secs: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> InkResult<Self> {
        let end = rate.secs_to_tick(duration_secs.max(0.0));
        Ok(Self {
            source_path: source_path.into(),
            rate,
            range: TickRange::new(rate.tick(0), end)?,
            frame_width,
            frame_height,
        })
    }

    /// Thumbnail pixel size fitting `max_width` while keeping the frame aspect.
    pub fn thumbnail_pixels(&self, max_width: u32) -> PixelSize {
        if self.frame_width == 0 || self.frame_height == 0 {
            return PixelSize {
                width: 0,
                height: 0,
            };
        }
        let width = max_width.min(self.frame_width).max(1);
        let height = ((u64::from(self.frame_height) * u64::from(width))
            / u64::from(self.frame_width))
        .max(1);
        PixelSize {
            width,
            height: u32::try_from(height).unwrap_or(u32::MAX),
        }
    }
}

/// Probe video metadata through `ffprobe`, expressing its duration in `rate`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path, rate: TickRate) -> InkResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| InkError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(InkError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| InkError::media(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| InkError::media("no video stream found"))?;
    let width = video
        .width
        .ok_or_else(|| InkError::media("missing video width from ffprobe"))?;
    let height = video
        .height
        .ok_or_else(|| InkError::media("missing video height from ffprobe"))?;
    let duration = video
        .duration
        .as_deref()
        .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| InkError::media("missing video duration from ffprobe"))?;

    MediaInfo::new(source_path, rate, duration, width, height)
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe video metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_video(_source_path: &Path, _rate: TickRate) -> InkResult<MediaInfo> {
    Err(crate::foundation::error::InkError::media(
        "video decoding requires the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode the frame at `tick` as straight RGBA8 scaled to `size`.
pub fn decode_frame_rgba8(info: &MediaInfo, tick: Tick, size: PixelSize) -> InkResult<Vec<u8>> {
    if size.is_empty() {
        return Err(InkError::media("thumbnail size is zero"));
    }
    let secs = info.rate.check(tick)? as f64 / f64::from(info.rate.per_second);
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{secs:.9}")])
        .arg("-i")
        .arg(&info.source_path)
        .args([
            "-frames:v",
            "1",
            "-vf",
            &format!("scale={}:{}", size.width, size.height),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| InkError::media(format!("failed to run ffmpeg for frame decode: {e}")))?;

    if !out.status.success() {
        return Err(InkError::media(format!(
            "ffmpeg frame decode failed for '{}': {}",
            info.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected = size.width as usize * size.height as usize * 4;
    if out.stdout.len() < expected {
        return Err(InkError::media(format!(
            "decoded frame has invalid size: got {} bytes, expected {expected}",
            out.stdout.len()
        )));
    }
    let mut rgba = out.stdout;
    rgba.truncate(expected);
    Ok(rgba)
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Decode the frame at `tick` as straight RGBA8 scaled to `size`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn decode_frame_rgba8(_info: &MediaInfo, _tick: Tick, _size: PixelSize) -> InkResult<Vec<u8>> {
    Err(crate::foundation::error::InkError::media(
        "video decoding requires the 'media-ffmpeg' feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_maps_to_half_open_range() {
        let rate = TickRate::new(600).unwrap();
        let info = MediaInfo::new("clip.mov", rate, 10.0, 1920, 1080).unwrap();
        assert_eq!(info.range.start, rate.tick(0));
        assert_eq!(info.range.end, rate.tick(6000));
        assert!(!info.range.contains(rate.tick(6000)));
    }

    #[test]
    fn thumbnail_keeps_aspect() {
        let rate = TickRate::new(600).unwrap();
        let info = MediaInfo::new("clip.mov", rate, 1.0, 1920, 1080).unwrap();
        assert_eq!(
            info.thumbnail_pixels(256),
            PixelSize {
                width: 256,
                height: 144
            }
        );
        let tiny = MediaInfo::new("clip.mov", rate, 1.0, 64, 32).unwrap();
        assert_eq!(tiny.thumbnail_pixels(256).width, 64);
    }

    #[cfg(not(feature = "media-ffmpeg"))]
    #[test]
    fn probe_without_feature_is_media_error() {
        let rate = TickRate::new(600).unwrap();
        let err = probe_video(Path::new("clip.mov"), rate).unwrap_err();
        assert!(err.to_string().starts_with("media error: "));
    }
}

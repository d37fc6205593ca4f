use crate::foundation::core::Size;
use crate::render::image::FrameImage;
use crate::stroke::model::Sample;

/// Paint settings for drawn strokes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Straight-alpha RGBA8 colour.
    pub color: [u8; 4],
    /// Width in display points at force 1.0.
    pub base_width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            base_width: 4.0,
        }
    }
}

/// Off-screen drawing target used to rasterize annotations.
///
/// Coordinates passed in are display points; implementations apply their own pixel scale.
pub trait StrokeSurface {
    /// Resize if needed and clear to transparent. `size` is in display points.
    fn clear(&mut self, size: Size);
    /// Draw samples as a connected polyline with round joins and caps.
    fn draw_polyline(&mut self, samples: &[Sample], with_pressure_width: bool);
    /// Produce the current pixels, or `None` when no image can be made.
    fn snapshot_image(&mut self) -> Option<FrameImage>;
}

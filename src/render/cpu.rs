use vello_cpu::kurbo::{BezPath, Cap, Circle, Join, Shape, Stroke};

use crate::foundation::core::{PixelSize, Point, Size};
use crate::render::image::FrameImage;
use crate::render::surface::{StrokeStyle, StrokeSurface};
use crate::stroke::model::Sample;

/// `vello_cpu`-backed [`StrokeSurface`].
///
/// Points are mapped to pixels by `pixel_ratio * content_scale`: the device pixel ratio, and an
/// extra factor for surfaces that show the same drawing at a smaller size (thumbnails).
pub struct CpuSurface {
    pixel_ratio: f64,
    content_scale: f64,
    style: StrokeStyle,
    px: Option<(u16, u16)>,
    ctx: Option<vello_cpu::RenderContext>,
    pixmap: Option<vello_cpu::Pixmap>,
}

impl CpuSurface {
    /// Surface drawing at `pixel_ratio` pixels per display point.
    pub fn new(pixel_ratio: f64, style: StrokeStyle) -> Self {
        Self::scaled(pixel_ratio, 1.0, style)
    }

    /// Surface that additionally scales drawn content by `content_scale`.
    pub fn scaled(pixel_ratio: f64, content_scale: f64, style: StrokeStyle) -> Self {
        Self {
            pixel_ratio,
            content_scale,
            style,
            px: None,
            ctx: None,
            pixmap: None,
        }
    }

    fn transform(&self) -> vello_cpu::kurbo::Affine {
        vello_cpu::kurbo::Affine::scale(self.pixel_ratio * self.content_scale)
    }
}

impl StrokeSurface for CpuSurface {
    fn clear(&mut self, size: Size) {
        let px = PixelSize::from_points(size, self.pixel_ratio);
        let dims = match (u16::try_from(px.width), u16::try_from(px.height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                tracing::warn!(?px, "surface size is empty or exceeds u16");
                self.px = None;
                self.ctx = None;
                self.pixmap = None;
                return;
            }
        };

        let mut ctx = match self.ctx.take() {
            Some(ctx) if self.px == Some(dims) => ctx,
            _ => vello_cpu::RenderContext::new(dims.0, dims.1),
        };
        ctx.reset();
        ctx.set_transform(self.transform());
        let [r, g, b, a] = self.style.color;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));

        if self.px == Some(dims)
            && let Some(pm) = self.pixmap.as_mut()
        {
            pm.data_as_u8_slice_mut().fill(0);
        } else {
            self.pixmap = Some(vello_cpu::Pixmap::new(dims.0, dims.1));
        }
        self.px = Some(dims);
        self.ctx = Some(ctx);
    }

    fn draw_polyline(&mut self, samples: &[Sample], with_pressure_width: bool) {
        let base = self.style.base_width;
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        let width_at = |s: &Sample| {
            if with_pressure_width {
                s.pressure_width(base)
            } else {
                base
            }
        };

        match samples {
            [] => {}
            [only] => {
                let dot = Circle::new(point_to_cpu(only.location()), width_at(only) * 0.5);
                ctx.fill_path(&dot.to_path(0.1));
            }
            _ if with_pressure_width => {
                for pair in samples.windows(2) {
                    let mut seg = BezPath::new();
                    seg.move_to(point_to_cpu(pair[0].location()));
                    seg.line_to(point_to_cpu(pair[1].location()));
                    let w = (width_at(&pair[0]) + width_at(&pair[1])) * 0.5;
                    ctx.set_stroke(round_stroke(w));
                    ctx.stroke_path(&seg);
                }
            }
            [first, rest @ ..] => {
                let mut path = BezPath::new();
                path.move_to(point_to_cpu(first.location()));
                for s in rest {
                    path.line_to(point_to_cpu(s.location()));
                }
                ctx.set_stroke(round_stroke(base));
                ctx.stroke_path(&path);
            }
        }
    }

    fn snapshot_image(&mut self) -> Option<FrameImage> {
        let (Some(ctx), Some(pixmap)) = (self.ctx.as_mut(), self.pixmap.as_mut()) else {
            return None;
        };
        ctx.flush();
        ctx.render_to_pixmap(pixmap);
        let (w, h) = self.px?;
        FrameImage::new(
            u32::from(w),
            u32::from(h),
            pixmap.data_as_u8_slice().to_vec(),
        )
        .ok()
    }
}

fn round_stroke(width: f64) -> Stroke {
    Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

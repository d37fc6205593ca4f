//! Off-screen stroke rasterization.

/// `vello_cpu` surface.
pub mod cpu;
/// Premultiplied RGBA8 images.
pub mod image;
/// Surface interface and stroke paint.
pub mod surface;

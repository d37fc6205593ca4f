//! Stroke samples and their persisted columnar form.

/// Columnar stroke codec.
pub mod codec;
/// Samples, strokes and stroke identity.
pub mod model;

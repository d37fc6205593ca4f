//! Video metadata and frame decoding (`ffmpeg`-backed behind `media-ffmpeg`).

/// Asynchronous frame decoders.
pub mod decoder;
/// Media metadata and probing.
pub mod source;

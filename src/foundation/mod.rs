//! Shared time, error and hashing vocabulary.

/// Ticks, tick ranges and geometry re-exports.
pub mod core;
/// Crate error type.
pub mod error;
/// Content fingerprints for strokes and images.
pub mod fingerprint;

//! Seek debouncing, scrub animation and the timer that drives it.

/// Eased desired-time animation.
pub mod scrub;
/// Seek controller and the player interface.
pub mod seek;
/// Fixed-rate timers.
pub mod ticker;

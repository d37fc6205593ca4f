//! Session coordinator and the event channel its services report through.

/// The owning coordinator.
pub mod coordinator;
/// Service completion events.
pub mod events;
/// Session options.
pub mod opts;

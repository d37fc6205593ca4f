/// Tick-indexed annotation store with its rendered image cache.
pub mod store;

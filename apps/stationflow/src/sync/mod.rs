//! # Override Sync
//!
//! The async half of override handling. The cache rules (latest fetch
//! wins, change-aware republish, stale on failure) live in
//! `stationflow_core::OverrideCache`; this module drives it.
//!
//! ```text
//! InvalidationBus ──► forwarder ──► Debouncer ──► refresh() ──► watch
//!   (broadcast)        (filter)      (2s window)   (OverrideSource)
//! ```

mod bus;
mod controller;
mod debounce;

pub use bus::{Invalidation, InvalidationBus, ROADMAP_UPDATED};
pub use controller::{OverrideSource, OverrideSyncController};
pub use debounce::Debouncer;

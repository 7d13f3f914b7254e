//! # Pipeline Module
//!
//! Station topology and status gating.
//!
//! Both halves are pure lookups over compile-time data plus a snapshot of
//! externally owned inputs. Nothing here stores a status.

mod gating;
mod topology;

pub use gating::*;
pub use topology::*;

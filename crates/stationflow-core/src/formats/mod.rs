//! # Formats Module
//!
//! Binary encoding of local progress snapshots.
//! File and database I/O live in `storage`.

mod persistence;

pub use persistence::*;

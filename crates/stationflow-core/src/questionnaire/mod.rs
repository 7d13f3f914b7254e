//! # Questionnaire Module
//!
//! The branching questionnaire that seeds the first station:
//! - `schema`: validated section/question structure
//! - `progression`: navigation, gating, completion and submission
//! - `snapshot`: persistable state and remote/local reconciliation

mod progression;
mod schema;
mod snapshot;

pub use progression::*;
pub use schema::*;
pub use snapshot::*;

//! # stationflow
//!
//! The async client around `stationflow-core`: REST access to the
//! incubator backend, override syncing, questionnaire persistence and the
//! CLI.
//!
//! ## Modules
//!
//! - `client` - reqwest wrapper; validates every payload into core types
//! - `gating` - gathers gating inputs, dispatches station entry
//! - `sync` - debounced, change-aware override refresh
//! - `progress` - remote autosave + local fallback for questionnaire progress
//! - `session` - a progression wired to its persistence
//! - `config`, `error`, `cli`

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gating;
pub mod progress;
pub mod session;
pub mod sync;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use config::Config;
pub use error::{AppError, ClientError};

//! # Application Errors
//!
//! `ClientError` covers everything that can go wrong talking to the
//! backend; `AppError` is what the CLI exits with.

use stationflow_core::StationflowError;
use thiserror::Error;

/// Errors from the HTTP client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Cannot reach the backend.
    #[error("cannot connect to backend at {0}")]
    ConnectionFailed(String),

    /// 401/403 - invalid or missing API key.
    #[error("unauthorized: invalid or missing API key")]
    Unauthorized,

    /// 404 on an endpoint where absence is an error.
    #[error("not found: {0}")]
    NotFound(String),

    /// 429 Too Many Requests.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Any other non-success status.
    #[error("server error ({0}): {1}")]
    ServerError(u16, String),

    /// Body did not match the expected shape.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Body parsed but failed validation.
    #[error("invalid payload: {0}")]
    Invalid(#[from] StationflowError),
}

/// Top-level error for CLI commands.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] StationflowError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

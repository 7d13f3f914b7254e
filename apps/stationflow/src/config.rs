//! # Configuration
//!
//! Resolution order, lowest to highest precedence:
//! built-in defaults, `stationflow.toml`, `STATIONFLOW_*` environment
//! variables, then CLI flags (applied by the caller).

use crate::error::AppError;
use serde::Deserialize;
use stationflow_core::{SnapshotKey, TeamId, UserId};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "stationflow.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_STORE: &str = "stationflow.db";
pub const DEFAULT_USER: &str = "anonymous";
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Team context; `None` means the pre-team, per-user path.
    pub team: Option<TeamId>,
    pub user: String,
    pub store_path: PathBuf,
    pub debounce_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            team: None,
            user: DEFAULT_USER.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// On-disk shape; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    api_key: Option<String>,
    team: Option<u64>,
    user: Option<String>,
    store: Option<PathBuf>,
    debounce_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
}

impl Config {
    /// Load defaults, then the config file, then the process environment.
    ///
    /// An explicitly given `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = Self::default();
        match path {
            Some(p) => config.merge_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    config.merge_file(default)?;
                }
            }
        }
        config.merge_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Overlay values from a TOML file.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        self.merge_toml(&text)
            .map_err(|e| AppError::Config(format!("'{}': {e}", path.display())))
    }

    fn merge_toml(&mut self, text: &str) -> Result<(), String> {
        let file: FileConfig = toml::from_str(text).map_err(|e| e.to_string())?;
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if let Some(v) = file.team {
            self.team = Some(TeamId(v));
        }
        if let Some(v) = file.user {
            self.user = v;
        }
        if let Some(v) = file.store {
            self.store_path = v;
        }
        if let Some(v) = file.debounce_ms {
            self.debounce_ms = v;
        }
        if let Some(v) = file.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        Ok(())
    }

    /// Overlay `STATIONFLOW_*` variables from `lookup`.
    pub fn merge_env<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STATIONFLOW_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("STATIONFLOW_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("STATIONFLOW_TEAM") {
            self.team = Some(TeamId(parse_number("STATIONFLOW_TEAM", &v)?));
        }
        if let Some(v) = lookup("STATIONFLOW_USER") {
            self.user = v;
        }
        if let Some(v) = lookup("STATIONFLOW_STORE") {
            self.store_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("STATIONFLOW_DEBOUNCE_MS") {
            self.debounce_ms = parse_number("STATIONFLOW_DEBOUNCE_MS", &v)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Key of the local progress record for this user and team.
    #[must_use]
    pub fn snapshot_key(&self) -> SnapshotKey {
        SnapshotKey::new(UserId::new(self.user.clone()), self.team)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::Config(format!(
            "{name} must be a non-negative integer, got '{value}'"
        ))
    })
}

//! # Stationflow CLI Module
//!
//! ## Available Commands
//!
//! - `board` - Show the status of every station
//! - `enter` - Open a station (review mode if completed)
//! - `watch` - Keep the board current as overrides change
//! - `questionnaire` - Fill in the seeding questionnaire
//! - `progress` - Show saved questionnaire progress

mod commands;

use crate::config::Config;
use crate::error::AppError;
use clap::{Parser, Subcommand};
use stationflow_core::TeamId;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stationflow - incubator station board and seeding questionnaire
#[derive(Parser, Debug)]
#[command(name = "stationflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./stationflow.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Team id; omit for the pre-team path
    #[arg(short, long, global = true)]
    pub team: Option<u64>,

    /// User name for local progress records
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Path to the local progress store
    #[arg(short = 'S', long, global = true)]
    pub store: Option<PathBuf>,

    /// Override refresh coalescing window in milliseconds
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Output in JSON format (for programmatic access)
    #[arg(long = "json", global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the status of every station
    Board,

    /// Open a station
    Enter {
        /// Station id (1-15)
        station: u8,
    },

    /// Reprint the board whenever overrides change; Enter signals an update
    Watch,

    /// Answer the seeding questionnaire interactively
    Questionnaire,

    /// Show saved questionnaire progress
    Progress,
}

impl Cli {
    /// Overlay command-line flags onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url.clone_from(url);
        }
        if let Some(team) = self.team {
            config.team = Some(TeamId(team));
        }
        if let Some(user) = &self.user {
            config.user.clone_from(user);
        }
        if let Some(store) = &self.store {
            config.store_path.clone_from(store);
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    tracing::debug!(api_url = %config.api_url, team = ?config.team, "Configuration resolved");

    let json_mode = cli.json_mode;
    match cli.command.unwrap_or(Commands::Board) {
        Commands::Board => cmd_board(&config, json_mode).await,
        Commands::Enter { station } => cmd_enter(&config, station).await,
        Commands::Watch => cmd_watch(&config, json_mode).await,
        Commands::Questionnaire => cmd_questionnaire(&config).await,
        Commands::Progress => cmd_progress(&config, json_mode).await,
    }
}

//! # Stationflow
//!
//! Command-line client for the incubator station board and the seeding
//! questionnaire.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                   apps/stationflow (THE BINARY)               │
//! │                                                               │
//! │  ┌─────────────┐   ┌──────────────────┐   ┌───────────────┐   │
//! │  │    CLI      │   │  Override sync   │   │ Progress sync │   │
//! │  │   (clap)    │   │ (debounce/watch) │   │ (redb + REST) │   │
//! │  └──────┬──────┘   └────────┬─────────┘   └───────┬───────┘   │
//! │         │                   │                     │           │
//! │         └───────────────────┼─────────────────────┘           │
//! │                             ▼                                 │
//! │                   ┌──────────────────┐                        │
//! │                   │ stationflow-core │                        │
//! │                   │   (THE LOGIC)    │                        │
//! │                   └──────────────────┘                        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! stationflow --team 12 board
//! stationflow --team 12 enter 6
//! stationflow --team 12 watch
//! stationflow questionnaire
//! ```

use clap::Parser;
use stationflow::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // STATIONFLOW_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("STATIONFLOW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stationflow=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!("stationflow v{}", env!("CARGO_PKG_VERSION"));
    println!();
}

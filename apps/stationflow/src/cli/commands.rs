//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{AppError, ClientError};
use crate::gating::{GatingSnapshotSource, StationEntryHandler, enter_station};
use crate::progress::{ProgressSync, RemoteProgress};
use crate::session::{CompletionHandler, QuestionnaireSession};
use crate::sync::{Invalidation, InvalidationBus, OverrideSyncController};
use serde_json::json;
use stationflow_core::{
    Anchor, GatingEngine, GatingInputs, PipelineTopology, ProgressPort, QuestionnaireSchema,
    RedbProgressStore, Station, StationBoard, Step, Submission,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

fn client(config: &Config) -> Result<ApiClient, AppError> {
    Ok(ApiClient::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.request_timeout(),
    )?)
}

fn open_store(config: &Config) -> Result<RedbProgressStore, AppError> {
    Ok(RedbProgressStore::open(&config.store_path)?)
}

// =============================================================================
// BOARD RENDERING
// =============================================================================

fn print_board(board: &StationBoard, json_mode: bool) {
    let topology = PipelineTopology::new();
    let nodes = board.node_statuses(&topology);

    if json_mode {
        let stations: Vec<_> = nodes
            .iter()
            .map(|(node, status)| {
                json!({
                    "id": node.station.id(),
                    "key": topology.section_key_of(node.station),
                    "name": topology.display_name(node.station),
                    "anchor": match node.anchor {
                        Anchor::Inline => "inline",
                        Anchor::Standalone => "standalone",
                    },
                    "status": status.as_str(),
                })
            })
            .collect();
        let output = json!({
            "progress_percent": board.progress_percent(),
            "stations": stations,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return;
    }

    println!("Incubator Progress: {}%", board.progress_percent());
    println!();
    let mut workshops_header = false;
    for (node, status) in &nodes {
        if node.anchor == Anchor::Standalone && !workshops_header {
            println!();
            println!("Workshops:");
            workshops_header = true;
        }
        println!(
            "  {:>2}. {:<28} {}",
            node.station.id(),
            topology.display_name(node.station),
            status.as_str()
        );
    }
}

async fn load_board(
    config: &Config,
    client: &ApiClient,
) -> Result<(GatingInputs, StationBoard), AppError> {
    let controller = OverrideSyncController::new(client.clone(), config.team, config.debounce());
    controller.refresh().await;
    let source = GatingSnapshotSource::new(client.clone());
    Ok(source.board(config.team, &controller.current()).await?)
}

// =============================================================================
// BOARD COMMAND
// =============================================================================

/// Fetch everything once and print the board.
pub async fn cmd_board(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let client = client(config)?;
    let (_, board) = load_board(config, &client).await?;
    print_board(&board, json_mode);
    Ok(())
}

// =============================================================================
// ENTER COMMAND
// =============================================================================

struct PrintEntry;

impl StationEntryHandler for PrintEntry {
    fn on_enter_station(&mut self, station: Station, review_mode: bool) {
        let name = PipelineTopology::new().display_name(station);
        if review_mode {
            println!("Opening {name} in review mode (completed)");
        } else {
            println!("Opening {name}");
        }
    }
}

/// Resolve an entry request for one station.
pub async fn cmd_enter(config: &Config, station: u8) -> Result<(), AppError> {
    let station = Station::from_id(station)?;
    let client = client(config)?;
    let (inputs, _) = load_board(config, &client).await?;
    let engine = GatingEngine::new();
    enter_station(&engine, &inputs, station, &mut PrintEntry)?;
    Ok(())
}

// =============================================================================
// WATCH COMMAND
// =============================================================================

/// Print the board now and again on every override change.
///
/// Each line on stdin publishes a `roadmap-updated` invalidation; Ctrl+C
/// or end of input stops.
pub async fn cmd_watch(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let client = client(config)?;
    let source = GatingSnapshotSource::new(client.clone());
    let controller = Arc::new(OverrideSyncController::new(
        client,
        config.team,
        config.debounce(),
    ));
    let bus = InvalidationBus::default();
    let mut snapshots = controller.subscribe();

    controller.refresh().await;
    snapshots.borrow_and_update();
    let (_, board) = source.board(config.team, &controller.current()).await?;
    print_board(&board, json_mode);

    let listener = tokio::spawn(Arc::clone(&controller).listen(bus.subscribe()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Watching for roadmap updates. Press Enter to signal one, Ctrl+C to stop.");

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let overrides = snapshots.borrow_and_update().clone();
                match source.board(config.team, &overrides).await {
                    Ok((_, board)) => print_board(&board, json_mode),
                    Err(e) => tracing::warn!(error = %e, "Could not rebuild board"),
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(_)) => {
                    bus.publish(Invalidation::roadmap_updated(config.team));
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(bus);
    let refreshes = listener.await.unwrap_or(0);
    tracing::info!(refreshes, "Watch stopped");
    Ok(())
}

// =============================================================================
// QUESTIONNAIRE COMMAND
// =============================================================================

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Back,
    Sections,
    Jump(usize),
    Submit,
    /// Empty line or `:next`: keep the current answer and move on.
    Continue,
    Answer(String),
    Unknown(String),
}

/// Commands start with `:`; anything else is an answer.
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return if trimmed.is_empty() {
            Input::Continue
        } else {
            Input::Answer(trimmed.to_string())
        };
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "q"), None) => Input::Quit,
        (Some("back" | "b"), None) => Input::Back,
        (Some("sections" | "s"), None) => Input::Sections,
        (Some("submit"), None) => Input::Submit,
        (Some("next" | "n"), None) => Input::Continue,
        (Some("jump" | "j"), Some(n)) => n
            .parse()
            .map(Input::Jump)
            .unwrap_or_else(|_| Input::Unknown(trimmed.to_string())),
        _ => Input::Unknown(trimmed.to_string()),
    }
}

struct PrintCompletion;

impl CompletionHandler for PrintCompletion {
    fn on_complete(&mut self, submission: &Submission) {
        println!();
        println!("Questionnaire submitted.");
        for section in &submission.sections {
            println!(
                "  {}. {} ({} answers)",
                section.section,
                section.title,
                section.answers.len()
            );
        }
    }
}

fn print_question<R, P>(session: &QuestionnaireSession<R, P>)
where
    R: RemoteProgress,
    P: ProgressPort + 'static,
{
    let progression = session.progression();
    let pointer = progression.pointer();
    let Ok(question) = progression.current_question() else {
        return;
    };
    let title = progression
        .schema()
        .section(pointer.section)
        .map(|s| s.title.as_str())
        .unwrap_or_default();

    println!();
    println!(
        "[{}/{} · {}%] Section {}: {}",
        progression.global_number(),
        progression.total_questions(),
        progression.progress_percent(),
        pointer.section,
        title
    );
    let marker = if question.required { " *" } else { "" };
    println!("{}{}", question.text, marker);
    if let Some(answer) = progression.answers().get(&question.id) {
        println!("  (current: {answer})");
    }
}

fn print_sections<R, P>(session: &QuestionnaireSession<R, P>)
where
    R: RemoteProgress,
    P: ProgressPort + 'static,
{
    for state in session.progression().section_states() {
        let mark = match (state.current, state.complete, state.accessible) {
            (true, _, _) => ">",
            (false, true, _) => "✓",
            (false, false, true) => " ",
            (false, false, false) => "·",
        };
        println!("  {mark} {}. {}", state.section, state.title);
    }
}

/// Answer to a `Retry? [Y/n]` prompt. Anything but "n"/"no" retries.
pub fn parse_retry(line: &str) -> bool {
    !matches!(line.trim().to_ascii_lowercase().as_str(), "n" | "no")
}

/// Load the questionnaire structure, offering a retry after each failure.
///
/// Nothing is returned until a complete, validated schema arrives. If the
/// user declines or input ends, the last error is returned.
pub async fn load_schema<R>(
    client: &ApiClient,
    lines: &mut Lines<R>,
) -> Result<QuestionnaireSchema, ClientError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let err = match client.questionnaire_schema().await {
            Ok(schema) => return Ok(schema),
            Err(e) => e,
        };
        tracing::warn!(error = %err, "Questionnaire structure unavailable");
        println!("Could not load the questionnaire: {err}");
        println!("Retry? [Y/n]");
        match lines.next_line().await {
            Ok(Some(answer)) if parse_retry(&answer) => {}
            _ => return Err(err),
        }
    }
}

/// Interactive, line-based questionnaire.
pub async fn cmd_questionnaire(config: &Config) -> Result<(), AppError> {
    let client = client(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let schema = load_schema(&client, &mut lines).await?;
    let store = open_store(config)?;
    let sync = ProgressSync::new(Arc::new(client), Arc::new(store), config.snapshot_key());
    let mut session = QuestionnaireSession::open(schema, sync).await;

    if session.progression().is_submitted() {
        println!("This questionnaire was already submitted. Use :submit to send it again.");
    }
    println!("Type an answer and press Enter. Commands: :back :jump N :sections :submit :quit");

    print_question(&session);
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Quit => break,
            Input::Sections => {
                print_sections(&session);
                continue;
            }
            Input::Back => {
                if !session.previous() {
                    println!("  Already at the first question.");
                }
            }
            Input::Jump(section) => {
                if let Err(e) = session.jump_to(section) {
                    println!("  ! {e}");
                }
            }
            Input::Submit => match session.submit(&mut PrintCompletion).await {
                Ok(_) => break,
                Err(e) => println!("  ! {e}"),
            },
            Input::Continue => advance(&mut session),
            Input::Answer(text) => {
                let id = session.progression().current_question()?.id.clone();
                match session.answer(&id, text) {
                    Ok(_) => advance(&mut session),
                    Err(e) => println!("  ! {e}"),
                }
            }
            Input::Unknown(cmd) => println!("  Unknown command: {cmd}"),
        }
        print_question(&session);
    }

    let failures = session.flush().await;
    if !failures.is_empty() {
        tracing::warn!(
            count = failures.len(),
            "Some progress writes did not reach the server; they are kept locally"
        );
    }
    Ok(())
}

fn advance<R, P>(session: &mut QuestionnaireSession<R, P>)
where
    R: RemoteProgress,
    P: ProgressPort + 'static,
{
    match session.next() {
        Ok(Step::Moved(_)) => {}
        Ok(Step::ReadyToSubmit) => {
            println!("  All sections complete. Type :submit to send your answers.");
        }
        Err(e) => println!("  ! {e}"),
    }
}

// =============================================================================
// PROGRESS COMMAND
// =============================================================================

/// Print the snapshot a questionnaire session would resume from.
pub async fn cmd_progress(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let client = client(config)?;
    let store = open_store(config)?;
    let sync = ProgressSync::new(Arc::new(client), Arc::new(store), config.snapshot_key());

    let Some((snapshot, source)) = sync.load().await else {
        if json_mode {
            println!("null");
        } else {
            println!("No saved progress.");
        }
        return Ok(());
    };

    if json_mode {
        let output = json!({
            "source": format!("{source:?}").to_lowercase(),
            "snapshot": snapshot,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Saved progress ({source:?}):");
    println!(
        "  Position:  section {}, question {}",
        snapshot.current_section,
        snapshot.current_question + 1
    );
    println!("  Answers:   {}", snapshot.answers.len());
    println!("  Updated:   {} ms", snapshot.updated_at_ms);
    match snapshot.completed_at_ms {
        Some(at) => println!("  Submitted: {at} ms"),
        None => println!("  Submitted: no"),
    }
    Ok(())
}

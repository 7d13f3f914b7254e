//! # Gating Inputs
//!
//! Gathers the remote signals the gating engine needs and hands entry
//! intents to the consumer.

use crate::client::CompletionReport;
use crate::error::ClientError;
use stationflow_core::{
    EntryIntent, GatingEngine, GatingInputs, OverrideSnapshot, Station, StationBoard,
    StationflowError, TeamId,
};
use std::future::Future;

/// Remote completion data and the idea artifact check.
pub trait CompletionSource: Send + Sync + 'static {
    fn fetch_completion(
        &self,
        team: Option<TeamId>,
    ) -> impl Future<Output = Result<CompletionReport, ClientError>> + Send;

    fn idea_artifact_exists(
        &self,
        team: Option<TeamId>,
    ) -> impl Future<Output = Result<bool, ClientError>> + Send;
}

/// Receives `onEnterStation` when a user acts on a non-locked station.
pub trait StationEntryHandler {
    fn on_enter_station(&mut self, station: Station, review_mode: bool);
}

/// Combines the current override snapshot with completion data.
#[derive(Debug)]
pub struct GatingSnapshotSource<C> {
    source: C,
    engine: GatingEngine,
}

impl<C: CompletionSource> GatingSnapshotSource<C> {
    pub fn new(source: C) -> Self {
        Self {
            source,
            engine: GatingEngine::new(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &GatingEngine {
        &self.engine
    }

    /// Fetch completion and the artifact check concurrently.
    ///
    /// A failed artifact check counts as "no artifact". A failed completion
    /// fetch is returned, since no board can be built without it.
    pub async fn inputs(
        &self,
        team: Option<TeamId>,
        overrides: &OverrideSnapshot,
    ) -> Result<GatingInputs, ClientError> {
        let (completion, artifact) = tokio::join!(
            self.source.fetch_completion(team),
            self.source.idea_artifact_exists(team)
        );
        let report = completion?;
        let idea_artifact_complete = artifact.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Idea artifact check failed; treating as absent");
            false
        });

        Ok(overrides.gating_inputs(report.completed, report.current, idea_artifact_complete))
    }

    /// Inputs plus the evaluated board.
    pub async fn board(
        &self,
        team: Option<TeamId>,
        overrides: &OverrideSnapshot,
    ) -> Result<(GatingInputs, StationBoard), ClientError> {
        let inputs = self.inputs(team, overrides).await?;
        let board = self.engine.board(&inputs);
        Ok((inputs, board))
    }
}

/// Resolve an entry request and notify `handler` if it is allowed.
///
/// The handler is not called for a locked station.
pub fn enter_station<H: StationEntryHandler + ?Sized>(
    engine: &GatingEngine,
    inputs: &GatingInputs,
    station: Station,
    handler: &mut H,
) -> Result<EntryIntent, StationflowError> {
    let intent = engine.request_entry(station, inputs)?;
    tracing::debug!(%station, review_mode = intent.review_mode, "Entering station");
    handler.on_enter_station(intent.station, intent.review_mode);
    Ok(intent)
}

// =============================================================================
// TESTS
// =============================================================================

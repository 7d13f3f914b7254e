//! # Progress Sync
//!
//! Keeps questionnaire progress in two places: the backend (scoped to the
//! team, or to the user before a team exists) and a local store used as
//! an offline fallback.
//!
//! Writes go local first, synchronously, then remote in a spawned task.
//! Remote write failures are logged and dropped; the next edit or move
//! writes again. Only the final submit reports remote failure.

use crate::client::AutosaveRequest;
use crate::error::ClientError;
use stationflow_core::{
    ProgressPort, ProgressSnapshot, QuestionId, SnapshotKey, SnapshotSource, Submission, TeamId,
    reconcile,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// Owner of remote progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressScope {
    Team(TeamId),
    /// The authenticated user, before joining a team.
    User,
}

impl ProgressScope {
    pub fn for_team(team: Option<TeamId>) -> Self {
        team.map_or(Self::User, Self::Team)
    }

    /// URL prefix of the scope's endpoints.
    pub fn path_prefix(&self) -> String {
        match self {
            Self::Team(team) => format!("/teams/{team}"),
            Self::User => "/me".to_string(),
        }
    }
}

/// Remote answer persistence.
pub trait RemoteProgress: Send + Sync + 'static {
    fn load(
        &self,
        scope: &ProgressScope,
    ) -> impl Future<Output = Result<Option<ProgressSnapshot>, ClientError>> + Send;

    fn save(
        &self,
        scope: &ProgressScope,
        snapshot: &ProgressSnapshot,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn autosave(
        &self,
        scope: &ProgressScope,
        body: &AutosaveRequest,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn submit(
        &self,
        scope: &ProgressScope,
        submission: &Submission,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Background write handle. Awaiting it is optional.
pub type PendingWrite = JoinHandle<Result<(), ClientError>>;

/// Remote + local persistence for one (user, team-or-none).
pub struct ProgressSync<R, P> {
    remote: Arc<R>,
    local: Arc<P>,
    key: SnapshotKey,
    scope: ProgressScope,
}

impl<R, P> ProgressSync<R, P>
where
    R: RemoteProgress,
    P: ProgressPort + 'static,
{
    pub fn new(remote: Arc<R>, local: Arc<P>, key: SnapshotKey) -> Self {
        let scope = ProgressScope::for_team(key.team);
        Self {
            remote,
            local,
            key,
            scope,
        }
    }

    pub fn scope(&self) -> ProgressScope {
        self.scope
    }

    pub fn key(&self) -> &SnapshotKey {
        &self.key
    }

    /// Remote and local snapshots, reconciled.
    ///
    /// Failure on either side counts as "no snapshot there".
    pub async fn load(&self) -> Option<(ProgressSnapshot, SnapshotSource)> {
        let remote = self.remote.load(&self.scope).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, scope = ?self.scope, "Remote progress unavailable");
            None
        });
        let local = self.local.load(&self.key).unwrap_or_else(|e| {
            tracing::warn!(error = %e, key = %self.key.storage_key(), "Local progress unreadable");
            None
        });

        let chosen = reconcile(remote, local);
        match &chosen {
            Some((snapshot, source)) => tracing::info!(
                ?source,
                section = snapshot.current_section,
                question = snapshot.current_question,
                "Resuming questionnaire"
            ),
            None => tracing::info!("No saved questionnaire progress"),
        }
        chosen
    }

    fn save_local(&self, snapshot: &ProgressSnapshot) {
        if let Err(e) = self.local.save(&self.key, snapshot) {
            tracing::warn!(error = %e, "Local progress write failed");
        }
    }

    /// An answer changed: local write, then a remote autosave of that answer.
    pub fn record_edit(&self, question: QuestionId, snapshot: &ProgressSnapshot) -> PendingWrite {
        self.save_local(snapshot);
        let body = AutosaveRequest::from_snapshot(question, snapshot);
        let remote = Arc::clone(&self.remote);
        let scope = self.scope;
        tokio::spawn(async move {
            let result = remote.autosave(&scope, &body).await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, question = %body.question_id, "Autosave failed");
            }
            result
        })
    }

    /// The pointer moved: local write, then a full remote save.
    pub fn record_position(&self, snapshot: &ProgressSnapshot) -> PendingWrite {
        self.save_local(snapshot);
        let remote = Arc::clone(&self.remote);
        let scope = self.scope;
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            let result = remote.save(&scope, &snapshot).await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, "Progress save failed");
            }
            result
        })
    }

    /// Submit the grouped answers. Unlike other writes this one must succeed.
    pub async fn submit(&self, submission: &Submission) -> Result<(), ClientError> {
        self.remote.submit(&self.scope, submission).await?;
        tracing::info!(scope = ?self.scope, "Questionnaire submitted");
        Ok(())
    }

    /// Write the final snapshot locally and stamp it completed. The record
    /// is kept for re-submission.
    pub fn finish(&self, snapshot: &ProgressSnapshot, now_ms: u64) {
        self.save_local(snapshot);
        if let Err(e) = self.local.mark_completed(&self.key, now_ms) {
            tracing::warn!(error = %e, "Could not mark local progress completed");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

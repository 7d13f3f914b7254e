//! # Questionnaire Session
//!
//! A [`Progression`] wired to [`ProgressSync`]: every edit and move is
//! persisted, and a successful submit is handed to the consumer.

use crate::error::{AppError, ClientError};
use crate::progress::{PendingWrite, ProgressSync, RemoteProgress, now_ms};
use stationflow_core::{
    AnswerEdit, ProgressPointer, ProgressPort, Progression, QuestionId, QuestionnaireSchema, Step,
    StationflowError, Submission,
};

/// Receives `onComplete` with the grouped answers after a successful submit.
pub trait CompletionHandler {
    fn on_complete(&mut self, submission: &Submission);
}

pub struct QuestionnaireSession<R, P> {
    progression: Progression,
    sync: ProgressSync<R, P>,
    pending: Vec<PendingWrite>,
}

impl<R, P> QuestionnaireSession<R, P>
where
    R: RemoteProgress,
    P: ProgressPort + 'static,
{
    /// Resume saved progress, or start at the first question.
    pub async fn open(schema: QuestionnaireSchema, sync: ProgressSync<R, P>) -> Self {
        let saved = sync.load().await.map(|(snapshot, _)| snapshot);
        Self {
            progression: Progression::resume(schema, saved),
            sync,
            pending: Vec::new(),
        }
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Record an answer. Unchanged text is not persisted again.
    pub fn answer(
        &mut self,
        id: &QuestionId,
        text: impl Into<String>,
    ) -> Result<AnswerEdit, StationflowError> {
        let edit = self.progression.set_answer(id, text)?;
        if edit.changed {
            let snapshot = self.progression.snapshot(now_ms());
            let write = self.sync.record_edit(edit.question.clone(), &snapshot);
            self.track(write);
        }
        Ok(edit)
    }

    /// Advance. A blocked transition persists nothing.
    pub fn next(&mut self) -> Result<Step, StationflowError> {
        let step = self.progression.next()?;
        if matches!(step, Step::Moved(_)) {
            self.persist_position();
        }
        Ok(step)
    }

    pub fn previous(&mut self) -> bool {
        let moved = self.progression.previous();
        if moved {
            self.persist_position();
        }
        moved
    }

    pub fn jump_to(&mut self, section: usize) -> Result<ProgressPointer, StationflowError> {
        let before = self.progression.pointer();
        let pointer = self.progression.jump_to(section)?;
        if pointer != before {
            self.persist_position();
        }
        Ok(pointer)
    }

    /// Submit remotely, then mark local progress completed and notify
    /// `handler`.
    ///
    /// Nothing is marked and the handler is not called if the remote
    /// submit fails; the call can be retried.
    pub async fn submit<H>(&mut self, handler: &mut H) -> Result<Submission, AppError>
    where
        H: CompletionHandler + ?Sized,
    {
        let submission = self.progression.submission()?;
        self.sync.submit(&submission).await?;

        let now = now_ms();
        self.progression.mark_submitted(now);
        self.sync.finish(&self.progression.snapshot(now), now);
        handler.on_complete(&submission);
        Ok(submission)
    }

    /// Wait for outstanding background writes. Returns the failures among
    /// writes that were still pending.
    pub async fn flush(&mut self) -> Vec<ClientError> {
        let mut failures = Vec::new();
        for write in self.pending.drain(..) {
            match write.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(e),
                Err(e) => tracing::warn!(error = %e, "Background write task failed"),
            }
        }
        failures
    }

    fn persist_position(&mut self) {
        let snapshot = self.progression.snapshot(now_ms());
        let write = self.sync.record_position(&snapshot);
        self.track(write);
    }

    fn track(&mut self, write: PendingWrite) {
        self.pending.retain(|w| !w.is_finished());
        self.pending.push(write);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRemote;
    use stationflow_core::{
        MemoryProgressStore, ProgressSnapshot, Question, Section, SnapshotKey, TeamId, UserId,
    };
    use std::sync::Arc;

    fn schema() -> QuestionnaireSchema {
        let sections = (1..=8)
            .map(|n| {
                Section::new(
                    format!("Section {n}"),
                    vec![Question::new(format!("q{n}"), format!("Question {n}"), true)],
                )
            })
            .collect();
        QuestionnaireSchema::new(sections).expect("schema")
    }

    #[derive(Default)]
    struct Collector(Vec<Submission>);

    impl CompletionHandler for Collector {
        fn on_complete(&mut self, submission: &Submission) {
            self.0.push(submission.clone());
        }
    }

    async fn open(
        remote: Arc<FakeRemote>,
        local: Arc<MemoryProgressStore>,
    ) -> QuestionnaireSession<FakeRemote, MemoryProgressStore> {
        let key = SnapshotKey::new(UserId::new("ada"), Some(TeamId(1)));
        QuestionnaireSession::open(schema(), ProgressSync::new(remote, local, key)).await
    }

    #[tokio::test]
    async fn blocked_continue_persists_nothing() {
        let remote = Arc::new(FakeRemote::default());
        let local = Arc::new(MemoryProgressStore::new());
        let mut session = open(Arc::clone(&remote), Arc::clone(&local)).await;

        assert!(session.next().is_err());
        session.flush().await;
        assert!(remote.saves.lock().expect("lock").is_empty());
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn edits_autosave_and_moves_save() {
        let remote = Arc::new(FakeRemote::default());
        let local = Arc::new(MemoryProgressStore::new());
        let mut session = open(Arc::clone(&remote), Arc::clone(&local)).await;

        session.answer(&QuestionId::new("q1"), "An idea").expect("answer");
        session.answer(&QuestionId::new("q1"), "An idea").expect("same");
        session.next().expect("move");
        assert!(session.flush().await.is_empty());

        assert_eq!(remote.autosaves.lock().expect("lock").len(), 1);
        let saves = remote.saves.lock().expect("lock");
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].current_section, 2);
        assert_eq!(local.len(), 1);
    }

    #[tokio::test]
    async fn resume_from_remote_snapshot() {
        let remote = Arc::new(FakeRemote::default());
        *remote.stored.lock().expect("lock") = Some(ProgressSnapshot {
            current_section: 3,
            updated_at_ms: 10,
            ..ProgressSnapshot::default()
        });
        let session = open(remote, Arc::new(MemoryProgressStore::new())).await;
        assert_eq!(session.progression().pointer().section, 3);
    }

    #[tokio::test]
    async fn submit_notifies_handler_once_remote_accepts() {
        let remote = Arc::new(FakeRemote::default());
        let local = Arc::new(MemoryProgressStore::new());
        let mut session = open(Arc::clone(&remote), Arc::clone(&local)).await;
        let mut collector = Collector::default();

        for n in 1..=8 {
            session
                .answer(&QuestionId::new(format!("q{n}")), format!("answer {n}"))
                .expect("answer");
            let step = session.next().expect("advance");
            assert_eq!(step == Step::ReadyToSubmit, n == 8);
        }

        let first = session.submit(&mut collector).await.expect("submit");
        let second = session.submit(&mut collector).await.expect("resubmit");
        assert_eq!(first, second);
        assert_eq!(first.sections.len(), 8);
        assert_eq!(collector.0.len(), 2);
        assert!(session.progression().is_submitted());

        let key = SnapshotKey::new(UserId::new("ada"), Some(TeamId(1)));
        let stored = local.load(&key).expect("load").expect("kept");
        assert!(stored.is_completed());
    }

    #[tokio::test]
    async fn failed_submit_leaves_session_open() {
        let mut session = open(
            Arc::new(FakeRemote::offline()),
            Arc::new(MemoryProgressStore::new()),
        )
        .await;
        for n in 1..=8 {
            session
                .answer(&QuestionId::new(format!("q{n}")), "x")
                .expect("answer");
            session.next().expect("advance");
        }

        let mut collector = Collector::default();
        let result = session.submit(&mut collector).await;
        assert!(matches!(result, Err(AppError::Client(_))));
        assert!(collector.0.is_empty());
        assert!(!session.progression().is_submitted());
    }
}

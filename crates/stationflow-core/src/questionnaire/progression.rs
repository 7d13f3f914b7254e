//! # Questionnaire Progression
//!
//! State machine over `(section, question)` positions.
//!
//! - `next` moves one question forward, crossing section boundaries; at the
//!   final question it reports [`Step::ReadyToSubmit`].
//! - `previous` mirrors `next`; at `(1, 0)` it does nothing.
//! - An empty required answer blocks `next`. Optional questions never block.
//! - `jump_to(S)` is allowed iff `S` is current, complete, or behind the
//!   current section.
//!
//! Every operation is synchronous and pure with respect to I/O; callers
//! persist the result of [`Progression::snapshot`] themselves.

use super::{ProgressSnapshot, Question, QuestionId, QuestionnaireSchema};
use crate::StationflowError;
use crate::primitives::{ANSWER_ENTRY_OVERHEAD, MAX_ANSWERS_TOTAL, MAX_ANSWER_LENGTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// POINTER & ANSWERS
// =============================================================================

/// The user's position. `section` is 1-based, `question` 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgressPointer {
    pub section: usize,
    pub question: usize,
}

impl ProgressPointer {
    pub const START: ProgressPointer = ProgressPointer {
        section: 1,
        question: 0,
    };
}

impl Default for ProgressPointer {
    fn default() -> Self {
        Self::START
    }
}

/// Answer text by question id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<QuestionId, String>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// A question counts as answered when its trimmed text is non-empty.
    #[must_use]
    pub fn is_answered(&self, id: &QuestionId) -> bool {
        self.get(id).is_some_and(|a| !a.trim().is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, id: QuestionId, text: String) -> bool {
        match self.0.get(&id) {
            Some(existing) if *existing == text => false,
            _ => {
                self.0.insert(id, text);
                true
            }
        }
    }

    /// Budgeted size of the map if `id` held an answer of `len` bytes.
    fn budget_with(&self, id: &QuestionId, len: usize) -> usize {
        let others: usize = self
            .0
            .iter()
            .filter(|(k, _)| *k != id)
            .map(|(k, v)| k.as_str().len() + v.len() + ANSWER_ENTRY_OVERHEAD)
            .sum();
        others + id.as_str().len() + len + ANSWER_ENTRY_OVERHEAD
    }

    fn as_map(&self) -> &BTreeMap<QuestionId, String> {
        &self.0
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Outcome of a successful `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(ProgressPointer),
    /// The final question passed its gate; call [`Progression::submit`].
    ReadyToSubmit,
}

/// Result of an answer edit, for the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEdit {
    pub question: QuestionId,
    pub section: usize,
    /// `false` when the text was identical to the stored answer.
    pub changed: bool,
}

/// Per-section navigation view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionState {
    pub section: usize,
    pub title: String,
    pub complete: bool,
    pub accessible: bool,
    pub current: bool,
}

/// One answered question in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub question: String,
    pub answer: String,
}

/// Answers of one section in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAnswers {
    pub section: usize,
    pub title: String,
    pub answers: Vec<SubmittedAnswer>,
}

/// Answers grouped by section, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub sections: Vec<SectionAnswers>,
}

// =============================================================================
// PROGRESSION
// =============================================================================

#[derive(Debug, Clone)]
pub struct Progression {
    schema: QuestionnaireSchema,
    answers: AnswerMap,
    pointer: ProgressPointer,
    completed_at_ms: Option<u64>,
}

impl Progression {
    /// Fresh session at `(1, 0)` with no answers.
    #[must_use]
    pub fn new(schema: QuestionnaireSchema) -> Self {
        Self {
            schema,
            answers: AnswerMap::new(),
            pointer: ProgressPointer::START,
            completed_at_ms: None,
        }
    }

    /// Resume from a saved snapshot, or start fresh if there is none.
    ///
    /// An out-of-range pointer is clamped to the nearest valid position and
    /// answers to questions no longer in the schema are dropped.
    #[must_use]
    pub fn resume(schema: QuestionnaireSchema, snapshot: Option<ProgressSnapshot>) -> Self {
        let Some(snapshot) = snapshot else {
            return Self::new(schema);
        };

        let section = snapshot.current_section.clamp(1, schema.section_count());
        let last_question = schema
            .section(section)
            .map(|s| s.questions.len().saturating_sub(1))
            .unwrap_or(0);
        let pointer = ProgressPointer {
            section,
            question: snapshot.current_question.min(last_question),
        };

        let answers = AnswerMap(
            snapshot
                .answers
                .into_iter()
                .filter(|(id, _)| schema.locate(id).is_some())
                .collect(),
        );

        Self {
            schema,
            answers,
            pointer,
            completed_at_ms: snapshot.completed_at_ms,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &QuestionnaireSchema {
        &self.schema
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn pointer(&self) -> ProgressPointer {
        self.pointer
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.completed_at_ms.is_some()
    }

    /// The question under the pointer.
    pub fn current_question(&self) -> Result<&Question, StationflowError> {
        let section = self.schema.section(self.pointer.section)?;
        section
            .questions
            .get(self.pointer.question)
            .ok_or(StationflowError::UnknownSection(self.pointer.section))
    }

    // -------------------------------------------------------------------------
    // Linear numbering
    // -------------------------------------------------------------------------

    /// 1-based number of the current question across all sections.
    #[must_use]
    pub fn global_number(&self) -> usize {
        self.schema
            .questions_before(self.pointer.section)
            .saturating_add(self.pointer.question)
            .saturating_add(1)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.schema.total_questions()
    }

    /// `global_number / total_questions` as a whole percentage.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let total = self.total_questions() as u64;
        if total == 0 {
            return 0;
        }
        ((self.global_number() as u64).saturating_mul(100) / total).min(100) as u8
    }

    // -------------------------------------------------------------------------
    // Answers
    // -------------------------------------------------------------------------

    /// Record an answer. Navigation state is untouched.
    pub fn set_answer(
        &mut self,
        id: &QuestionId,
        text: impl Into<String>,
    ) -> Result<AnswerEdit, StationflowError> {
        let (section, _) = self
            .schema
            .locate(id)
            .ok_or_else(|| StationflowError::UnknownQuestion(id.to_string()))?;
        let text = text.into();
        if text.len() > MAX_ANSWER_LENGTH {
            return Err(StationflowError::AnswerTooLong(id.to_string()));
        }
        if self.answers.budget_with(id, text.len()) > MAX_ANSWERS_TOTAL {
            return Err(StationflowError::AnswersTooLarge(id.to_string()));
        }
        let changed = self.answers.insert(id.clone(), text);
        Ok(AnswerEdit {
            question: id.clone(),
            section,
            changed,
        })
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Whether the current question's gate is satisfied.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.current_question()
            .map(|q| !q.required || self.answers.is_answered(&q.id))
            .unwrap_or(false)
    }

    pub fn next(&mut self) -> Result<Step, StationflowError> {
        let question = self.current_question()?;
        if question.required && !self.answers.is_answered(&question.id) {
            return Err(StationflowError::RequiredAnswerMissing(
                question.id.to_string(),
            ));
        }

        let len = self.section_len(self.pointer.section)?;
        if self.pointer.question.saturating_add(1) < len {
            self.pointer.question = self.pointer.question.saturating_add(1);
        } else if self.pointer.section < self.schema.section_count() {
            self.pointer = ProgressPointer {
                section: self.pointer.section.saturating_add(1),
                question: 0,
            };
        } else {
            return Ok(Step::ReadyToSubmit);
        }
        Ok(Step::Moved(self.pointer))
    }

    /// Step back one question. Returns `false` at the very first question.
    pub fn previous(&mut self) -> bool {
        if self.pointer.question > 0 {
            self.pointer.question -= 1;
            return true;
        }
        if self.pointer.section <= 1 {
            return false;
        }
        let section = self.pointer.section - 1;
        let question = self
            .section_len(section)
            .map(|len| len.saturating_sub(1))
            .unwrap_or(0);
        self.pointer = ProgressPointer { section, question };
        true
    }

    /// Every required question in the section has a non-blank answer.
    pub fn is_section_complete(&self, section: usize) -> Result<bool, StationflowError> {
        let section = self.schema.section(section)?;
        Ok(section
            .questions
            .iter()
            .filter(|q| q.required)
            .all(|q| self.answers.is_answered(&q.id)))
    }

    pub fn is_section_accessible(&self, section: usize) -> Result<bool, StationflowError> {
        let complete = self.is_section_complete(section)?;
        Ok(section <= self.pointer.section || complete)
    }

    /// Jump to the first question of a section.
    pub fn jump_to(&mut self, section: usize) -> Result<ProgressPointer, StationflowError> {
        if !self.is_section_accessible(section)? {
            return Err(StationflowError::SectionInaccessible(section));
        }
        self.pointer = ProgressPointer {
            section,
            question: 0,
        };
        Ok(self.pointer)
    }

    #[must_use]
    pub fn section_states(&self) -> Vec<SectionState> {
        self.schema
            .sections()
            .map(|(number, section)| SectionState {
                section: number,
                title: section.title.clone(),
                complete: self.is_section_complete(number).unwrap_or(false),
                accessible: self.is_section_accessible(number).unwrap_or(false),
                current: number == self.pointer.section,
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------------

    /// Answers grouped by section, without changing any state.
    ///
    /// Only valid at the final question with every section complete.
    /// With unchanged answers the payload is identical on every call.
    pub fn submission(&self) -> Result<Submission, StationflowError> {
        let count = self.schema.section_count();
        let at_end = self.pointer.section == count
            && self.pointer.question.saturating_add(1) == self.section_len(count)?;
        if !at_end {
            return Err(StationflowError::NotReadyToSubmit);
        }
        if let Some(missing) = self.first_missing_required() {
            return Err(StationflowError::RequiredAnswerMissing(missing.to_string()));
        }

        let sections = self
            .schema
            .sections()
            .map(|(number, section)| SectionAnswers {
                section: number,
                title: section.title.clone(),
                answers: section
                    .questions
                    .iter()
                    .filter(|q| self.answers.is_answered(&q.id))
                    .map(|q| SubmittedAnswer {
                        question_id: q.id.clone(),
                        question: q.text.clone(),
                        answer: self.answers.get(&q.id).unwrap_or_default().to_string(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Submission { sections })
    }

    /// Stamp the session as submitted. The first stamp is kept.
    pub fn mark_submitted(&mut self, now_ms: u64) {
        self.completed_at_ms.get_or_insert(now_ms);
    }

    /// [`Progression::submission`] followed by [`Progression::mark_submitted`].
    pub fn submit(&mut self, now_ms: u64) -> Result<Submission, StationflowError> {
        let submission = self.submission()?;
        self.mark_submitted(now_ms);
        Ok(submission)
    }

    /// Persistable form of the current state.
    #[must_use]
    pub fn snapshot(&self, now_ms: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            answers: self.answers.as_map().clone(),
            current_section: self.pointer.section,
            current_question: self.pointer.question,
            updated_at_ms: now_ms,
            completed_at_ms: self.completed_at_ms,
        }
    }

    fn section_len(&self, section: usize) -> Result<usize, StationflowError> {
        Ok(self.schema.section(section)?.questions.len())
    }

    fn first_missing_required(&self) -> Option<&QuestionId> {
        self.schema
            .sections()
            .flat_map(|(_, s)| s.questions.iter())
            .find(|q| q.required && !self.answers.is_answered(&q.id))
            .map(|q| &q.id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

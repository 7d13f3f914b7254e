//! # Questionnaire Schema
//!
//! The immutable section/question structure, validated once at load.
//! A schema that fails validation is never partially used.

use crate::StationflowError;
use crate::primitives::SECTION_COUNT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a question, unique across the whole schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

impl QuestionId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    /// Input type tag from the wire ("text", "textarea", ...). Informational.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
}

impl Question {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, required: bool) -> Self {
        Self {
            id: QuestionId::new(id),
            text: text.into(),
            kind: "text".to_string(),
            required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Guidance shown alongside the questions.
    #[serde(default)]
    pub what_to_think_about: String,
    pub questions: Vec<Question>,
}

impl Section {
    #[must_use]
    pub fn new(title: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            what_to_think_about: String::new(),
            questions,
        }
    }
}

/// Validated questionnaire structure. Sections are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionnaireSchema {
    sections: Vec<Section>,
}

impl QuestionnaireSchema {
    /// Validate and wrap a list of sections.
    ///
    /// Requires exactly `SECTION_COUNT` sections, at least one question per
    /// section, and non-empty question ids unique across the schema.
    pub fn new(sections: Vec<Section>) -> Result<Self, StationflowError> {
        if sections.len() != SECTION_COUNT {
            return Err(StationflowError::InvalidSchema(format!(
                "expected {} sections, got {}",
                SECTION_COUNT,
                sections.len()
            )));
        }

        let mut seen = BTreeSet::new();
        for (index, section) in sections.iter().enumerate() {
            if section.questions.is_empty() {
                return Err(StationflowError::InvalidSchema(format!(
                    "section {} has no questions",
                    index + 1
                )));
            }
            for question in &section.questions {
                if question.id.as_str().trim().is_empty() {
                    return Err(StationflowError::InvalidSchema(format!(
                        "section {} has a question without id",
                        index + 1
                    )));
                }
                if !seen.insert(question.id.clone()) {
                    return Err(StationflowError::InvalidSchema(format!(
                        "duplicate question id '{}'",
                        question.id
                    )));
                }
            }
        }

        Ok(Self { sections })
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Section by 1-based number.
    pub fn section(&self, number: usize) -> Result<&Section, StationflowError> {
        number
            .checked_sub(1)
            .and_then(|i| self.sections.get(i))
            .ok_or(StationflowError::UnknownSection(number))
    }

    /// `(number, section)` pairs in order.
    pub fn sections(&self) -> impl Iterator<Item = (usize, &Section)> {
        self.sections.iter().enumerate().map(|(i, s)| (i + 1, s))
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Number of questions in all sections before `number`.
    #[must_use]
    pub fn questions_before(&self, number: usize) -> usize {
        self.sections
            .iter()
            .take(number.saturating_sub(1))
            .map(|s| s.questions.len())
            .sum()
    }

    /// Locate a question: `(section number, index within section)`.
    #[must_use]
    pub fn locate(&self, id: &QuestionId) -> Option<(usize, usize)> {
        self.sections().find_map(|(number, section)| {
            section
                .questions
                .iter()
                .position(|q| &q.id == id)
                .map(|index| (number, index))
        })
    }
}

impl TryFrom<Vec<Section>> for QuestionnaireSchema {
    type Error = StationflowError;

    fn try_from(sections: Vec<Section>) -> Result<Self, Self::Error> {
        Self::new(sections)
    }
}

// =============================================================================
// TESTS
// =============================================================================

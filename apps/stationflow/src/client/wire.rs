//! # Wire Types
//!
//! Request and response bodies of the incubator backend, and the
//! conversions that validate them into core types. Untyped JSON never
//! leaves this module.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stationflow_core::{
    CompletionSet, OverrideMap, OverrideSnapshot, ProgressSnapshot, QuestionId,
    QuestionnaireSchema, Section, Station,
};

// =============================================================================
// ROADMAP (OVERRIDES)
// =============================================================================

/// `GET roadmap` body. Both maps are kept as raw JSON until decoded.
#[derive(Debug, Default, Deserialize)]
pub struct RoadmapResponse {
    #[serde(default)]
    pub admin_locks: Value,
    #[serde(default)]
    pub admin_unlocks: Value,
}

impl RoadmapResponse {
    /// Decode both maps. Malformed entries count as "no override".
    pub fn into_snapshot(self) -> OverrideSnapshot {
        let (locks, bad_locks) = lenient_overrides(&self.admin_locks);
        let (unlocks, bad_unlocks) = lenient_overrides(&self.admin_unlocks);
        if bad_locks + bad_unlocks > 0 {
            tracing::warn!(
                ignored_locks = bad_locks,
                ignored_unlocks = bad_unlocks,
                "Ignoring malformed override entries"
            );
        }
        OverrideSnapshot::new(locks, unlocks)
    }
}

/// Keep the boolean entries of a JSON object and count the rest.
///
/// Anything that is not an object decodes to an empty map. Only a JSON
/// `true` or `false` is accepted as a value.
pub fn lenient_overrides(raw: &Value) -> (OverrideMap, usize) {
    match raw {
        Value::Object(entries) => {
            let mut map = OverrideMap::new();
            let mut ignored = 0;
            for (key, value) in entries {
                match value {
                    Value::Bool(b) => map.set(key.as_str(), *b),
                    _ => ignored += 1,
                }
            }
            (map, ignored)
        }
        Value::Null => (OverrideMap::new(), 0),
        _ => (OverrideMap::new(), 1),
    }
}

// =============================================================================
// COMPLETION
// =============================================================================

/// `GET progress` body.
#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub completed_stations: Vec<u64>,
    pub current_station: u64,
}

/// Validated completion data for the gating engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub completed: CompletionSet,
    pub current: Station,
}

impl Default for CompletionReport {
    fn default() -> Self {
        Self {
            completed: CompletionSet::new(),
            current: Station::Idea,
        }
    }
}

impl TryFrom<ProgressResponse> for CompletionReport {
    type Error = ClientError;

    /// Unknown completed ids are dropped; an unknown current station is an
    /// error since nothing sensible can be active.
    fn try_from(raw: ProgressResponse) -> Result<Self, Self::Error> {
        let mut unknown = Vec::new();
        let ids = raw
            .completed_stations
            .into_iter()
            .filter_map(|id| match u8::try_from(id) {
                Ok(id) => Some(id),
                Err(_) => {
                    unknown.push(id);
                    None
                }
            });
        let (completed, rejected) = CompletionSet::from_ids(ids);
        unknown.extend(rejected.into_iter().map(u64::from));
        if !unknown.is_empty() {
            tracing::warn!(?unknown, "Dropping unknown completed station ids");
        }

        let current = u8::try_from(raw.current_station)
            .ok()
            .and_then(|id| Station::from_id(id).ok())
            .ok_or_else(|| {
                ClientError::ParseError(format!("unknown current station {}", raw.current_station))
            })?;

        Ok(Self { completed, current })
    }
}

// =============================================================================
// QUESTIONNAIRE
// =============================================================================

/// `GET questionnaire-structure` body.
#[derive(Debug, Deserialize)]
pub struct StructureResponse {
    pub sections: Vec<Section>,
}

impl TryFrom<StructureResponse> for QuestionnaireSchema {
    type Error = ClientError;

    fn try_from(raw: StructureResponse) -> Result<Self, Self::Error> {
        Ok(QuestionnaireSchema::new(raw.sections)?)
    }
}

/// Partial write for a single answer change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutosaveRequest {
    pub question_id: QuestionId,
    pub answer: String,
    pub current_section: usize,
    pub current_question: usize,
    pub updated_at_ms: u64,
}

impl AutosaveRequest {
    /// Autosave body for `question` taken from `snapshot`.
    pub fn from_snapshot(question: QuestionId, snapshot: &ProgressSnapshot) -> Self {
        let answer = snapshot.answers.get(&question).cloned().unwrap_or_default();
        Self {
            question_id: question,
            answer,
            current_section: snapshot.current_section,
            current_question: snapshot.current_question,
            updated_at_ms: snapshot.updated_at_ms,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Core Type Definitions
//!
//! This module contains the core types shared by both engines:
//! - Station identity (`Station`) and computed status (`StationStatus`)
//! - Gating inputs (`CompletionSet`, `OverrideMap`)
//! - Error types (`StationflowError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer identifiers only
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Carry no hidden mutable state; statuses are always recomputed

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// =============================================================================
// STATION
// =============================================================================

/// One stage of the incubator pipeline.
///
/// The set is closed: a raw id that does not name one of these fifteen
/// stations is rejected at the boundary by [`Station::from_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Station {
    Idea = 1,
    Mockup = 2,
    Validation = 3,
    PitchDeck = 4,
    MentorshipPre = 5,
    Mvp = 6,
    UserTesting = 7,
    MentorshipPost = 8,
    Traction = 9,
    Fundraising = 10,
    DemoDay = 11,
    Finance = 12,
    Marketing = 13,
    Legal = 14,
    Graduation = 15,
}

impl Station {
    /// Every station in ascending id order.
    pub const ALL: [Station; 15] = [
        Station::Idea,
        Station::Mockup,
        Station::Validation,
        Station::PitchDeck,
        Station::MentorshipPre,
        Station::Mvp,
        Station::UserTesting,
        Station::MentorshipPost,
        Station::Traction,
        Station::Fundraising,
        Station::DemoDay,
        Station::Finance,
        Station::Marketing,
        Station::Legal,
        Station::Graduation,
    ];

    /// Resolve a raw station id.
    pub fn from_id(id: u8) -> Result<Self, StationflowError> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.id() == id)
            .ok_or(StationflowError::UnknownStation(id))
    }

    /// The numeric id used by the remote progress service.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Station {
    type Error = StationflowError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id)
    }
}

impl From<Station> for u8 {
    fn from(station: Station) -> Self {
        station.id()
    }
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

// =============================================================================
// OWNER IDENTIFIERS
// =============================================================================

/// Identifier of a team on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u64);

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// STATION STATUS
// =============================================================================

/// Computed status of a station. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    Locked,
    Unlocked,
    Active,
    Completed,
}

impl StationStatus {
    /// Whether a user may act on a station with this status.
    #[must_use]
    pub const fn is_enterable(self) -> bool {
        !matches!(self, StationStatus::Locked)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StationStatus::Locked => "locked",
            StationStatus::Unlocked => "unlocked",
            StationStatus::Active => "active",
            StationStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// COMPLETION SET
// =============================================================================

/// Stations the team has finished, as reported by the remote progress service.
///
/// Read-only snapshot per evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionSet(BTreeSet<Station>);

impl CompletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw ids, returning the ids that did not name a station.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = u8>) -> (Self, Vec<u8>) {
        let mut set = BTreeSet::new();
        let mut unknown = Vec::new();
        for id in ids {
            match Station::from_id(id) {
                Ok(station) => {
                    set.insert(station);
                }
                Err(_) => unknown.push(id),
            }
        }
        (Self(set), unknown)
    }

    #[must_use]
    pub fn contains(&self, station: Station) -> bool {
        self.0.contains(&station)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Station> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Station> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = Station>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// OVERRIDE MAP
// =============================================================================

/// Administrator allow/deny flags keyed by section key.
///
/// Only an explicit `true` counts; an absent key and `false` both mean
/// "no override".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverrideMap(BTreeMap<String, bool>);

impl OverrideMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag for a section key.
    pub fn set(&mut self, key: impl Into<String>, value: bool) {
        self.0.insert(key.into(), value);
    }

    /// Builder-style [`OverrideMap::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: bool) -> Self {
        self.set(key, value);
        self
    }

    /// True only if the key is present and explicitly `true`.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for OverrideMap {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the stationflow core.
///
/// - No silent failures
/// - Use `Result<T, StationflowError>` for fallible operations
/// - The core never panics; background failures are the caller's to ignore
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StationflowError {
    /// A raw id did not name any station.
    #[error("Unknown station id: {0}")]
    UnknownStation(u8),

    /// A section number outside `1..=SECTION_COUNT`.
    #[error("Unknown section: {0}")]
    UnknownSection(usize),

    /// A question id not present in the schema.
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    /// The questionnaire structure failed validation.
    #[error("Invalid questionnaire schema: {0}")]
    InvalidSchema(String),

    /// An answer exceeded `MAX_ANSWER_LENGTH`.
    #[error("Answer to '{0}' is too long")]
    AnswerTooLong(String),

    /// Accepting an answer would push the answer set past `MAX_ANSWERS_TOTAL`.
    #[error("Answer to '{0}' does not fit in the saved progress")]
    AnswersTooLarge(String),

    /// Forward navigation blocked by an empty required answer.
    #[error("Question '{0}' is required")]
    RequiredAnswerMissing(String),

    /// Jump to a section that is ahead, incomplete and not yet reached.
    #[error("Section {0} is not accessible yet")]
    SectionInaccessible(usize),

    /// Entry requested for a station whose status is locked.
    #[error("Station {0} is locked")]
    StationLocked(Station),

    /// Submission requested before the final question was reached.
    #[error("Questionnaire is not ready to submit")]
    NotReadyToSubmit,

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

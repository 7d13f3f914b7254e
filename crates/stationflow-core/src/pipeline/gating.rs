//! # Station Gating
//!
//! Maps a snapshot of inputs to the status of every station.
//!
//! ## Policy (first match wins)
//!
//! | # | Condition | Status |
//! |---|-----------|--------|
//! | 1 | station in completion set | completed |
//! | 2 | station 1 and idea artifact exists | completed |
//! | 3 | current station, unlocked and not locked | active |
//! | 4 | current station otherwise | locked |
//! | 5 | unlocked and not locked | unlocked |
//! | 6 | otherwise | locked |
//!
//! Default deny: without an explicit administrator unlock a station that is
//! not completed is locked, whatever its position in the pipeline.

use super::topology::{PipelineTopology, TopologyNode};
use crate::primitives::DERIVED_COMPLETION_STATION;
use crate::{CompletionSet, OverrideMap, Station, StationStatus, StationflowError};
use serde::{Deserialize, Serialize};

// =============================================================================
// GATING INPUTS
// =============================================================================

/// Everything a status evaluation depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatingInputs {
    pub completed: CompletionSet,
    pub current: Station,
    pub locks: OverrideMap,
    pub unlocks: OverrideMap,
    /// Whether the concept artifact backing station 1 exists.
    pub idea_artifact_complete: bool,
}

impl GatingInputs {
    /// Inputs with nothing completed and no overrides.
    #[must_use]
    pub fn new(current: Station) -> Self {
        Self {
            completed: CompletionSet::new(),
            current,
            locks: OverrideMap::new(),
            unlocks: OverrideMap::new(),
            idea_artifact_complete: false,
        }
    }
}

// =============================================================================
// ENTRY INTENT
// =============================================================================

/// Outcome of a permitted station entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryIntent {
    pub station: Station,
    /// `true` to view the finished artifact rather than resume work.
    pub review_mode: bool,
}

// =============================================================================
// GATING ENGINE
// =============================================================================

/// Stateless status evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatingEngine {
    topology: PipelineTopology,
}

impl GatingEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            topology: PipelineTopology::new(),
        }
    }

    #[must_use]
    pub fn topology(&self) -> &PipelineTopology {
        &self.topology
    }

    /// Status of a single station.
    #[must_use]
    pub fn status_of(&self, station: Station, inputs: &GatingInputs) -> StationStatus {
        if inputs.completed.contains(station) {
            return StationStatus::Completed;
        }
        if station == DERIVED_COMPLETION_STATION && inputs.idea_artifact_complete {
            return StationStatus::Completed;
        }

        let key = self.topology.section_key_of(station);
        let open = inputs.unlocks.is_set(key) && !inputs.locks.is_set(key);

        match (station == inputs.current, open) {
            (true, true) => StationStatus::Active,
            (false, true) => StationStatus::Unlocked,
            (_, false) => StationStatus::Locked,
        }
    }

    /// Status of every station, in pipeline order.
    #[must_use]
    pub fn board(&self, inputs: &GatingInputs) -> StationBoard {
        let entries = self
            .topology
            .order()
            .iter()
            .map(|&station| (station, self.status_of(station, inputs)))
            .collect();
        StationBoard { entries }
    }

    /// Resolve a user's request to act on a station.
    ///
    /// Locked stations are refused; completed stations open in review mode.
    pub fn request_entry(
        &self,
        station: Station,
        inputs: &GatingInputs,
    ) -> Result<EntryIntent, StationflowError> {
        match self.status_of(station, inputs) {
            StationStatus::Locked => Err(StationflowError::StationLocked(station)),
            StationStatus::Completed => Ok(EntryIntent {
                station,
                review_mode: true,
            }),
            StationStatus::Active | StationStatus::Unlocked => Ok(EntryIntent {
                station,
                review_mode: false,
            }),
        }
    }
}

// =============================================================================
// STATION BOARD
// =============================================================================

/// Evaluated statuses for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationBoard {
    entries: Vec<(Station, StationStatus)>,
}

impl StationBoard {
    /// `(station, status)` pairs in pipeline order.
    #[must_use]
    pub fn entries(&self) -> &[(Station, StationStatus)] {
        &self.entries
    }

    #[must_use]
    pub fn status(&self, station: Station) -> StationStatus {
        self.entries
            .iter()
            .find(|(s, _)| *s == station)
            .map(|(_, status)| *status)
            .unwrap_or(StationStatus::Locked)
    }

    /// Status for each rendered node; both anchors of a workshop agree.
    #[must_use]
    pub fn node_statuses(&self, topology: &PipelineTopology) -> Vec<(TopologyNode, StationStatus)> {
        topology
            .rendered_nodes()
            .into_iter()
            .map(|node| (node, self.status(node.station)))
            .collect()
    }

    /// Share of completed stations, 0..=100.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        if self.entries.is_empty() {
            return 0;
        }
        let done = self
            .entries
            .iter()
            .filter(|(_, s)| *s == StationStatus::Completed)
            .count();
        ((done as u64).saturating_mul(100) / (self.entries.len() as u64)).min(100) as u8
    }
}

// =============================================================================
// TESTS
// =============================================================================

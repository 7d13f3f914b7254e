//! # Storage Module
//!
//! Local fallback storage for questionnaire progress.
//!
//! One record per (user, team-or-none). Records are encoded with
//! `formats::snapshot_to_bytes` in every backend, so a record written by
//! one backend decodes in any other.
//!
//! ## Backends
//!
//! - `MemoryProgressStore`: volatile, for tests and anonymous sessions
//! - `RedbProgressStore`: disk-backed ACID storage

mod redb_store;

pub use redb_store::RedbProgressStore;

use crate::formats::{snapshot_from_bytes, snapshot_to_bytes};
use crate::questionnaire::ProgressSnapshot;
use crate::{StationflowError, TeamId, UserId};
use std::collections::BTreeMap;
use std::sync::Mutex;

// =============================================================================
// SNAPSHOT KEY
// =============================================================================

/// Owner of a local progress record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey {
    pub user: UserId,
    pub team: Option<TeamId>,
}

impl SnapshotKey {
    #[must_use]
    pub fn new(user: UserId, team: Option<TeamId>) -> Self {
        Self { user, team }
    }

    /// Flat storage key: `<user>/<team>` or `<user>/-`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self.team {
            Some(team) => format!("{}/{}", self.user.as_str(), team),
            None => format!("{}/-", self.user.as_str()),
        }
    }
}

// =============================================================================
// PROGRESS PORT
// =============================================================================

/// Load/save access to local progress records.
///
/// Implementations must be safe to share between the UI loop and
/// background autosave tasks.
pub trait ProgressPort: Send + Sync {
    fn load(&self, key: &SnapshotKey) -> Result<Option<ProgressSnapshot>, StationflowError>;

    fn save(&self, key: &SnapshotKey, snapshot: &ProgressSnapshot) -> Result<(), StationflowError>;

    /// Stamp the record as completed without deleting it.
    ///
    /// Returns `false` if there is no record. An existing completion time
    /// is kept.
    fn mark_completed(&self, key: &SnapshotKey, now_ms: u64) -> Result<bool, StationflowError> {
        let Some(mut snapshot) = self.load(key)? else {
            return Ok(false);
        };
        if snapshot.completed_at_ms.is_none() {
            snapshot.completed_at_ms = Some(now_ms);
            self.save(key, &snapshot)?;
        }
        Ok(true)
    }
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================

/// Volatile store; records live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressPort for MemoryProgressStore {
    fn load(&self, key: &SnapshotKey) -> Result<Option<ProgressSnapshot>, StationflowError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StationflowError::IoError(e.to_string()))?;
        records
            .get(&key.storage_key())
            .map(|bytes| snapshot_from_bytes(bytes))
            .transpose()
    }

    fn save(&self, key: &SnapshotKey, snapshot: &ProgressSnapshot) -> Result<(), StationflowError> {
        let bytes = snapshot_to_bytes(snapshot)?;
        self.records
            .lock()
            .map_err(|e| StationflowError::IoError(e.to_string()))?
            .insert(key.storage_key(), bytes);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

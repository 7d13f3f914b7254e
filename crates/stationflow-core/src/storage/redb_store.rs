//! # redb-backed Progress Storage
//!
//! Disk-backed local snapshots using the redb embedded database:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - Concurrent readers, single writer

use super::{ProgressPort, SnapshotKey};
use crate::formats::{snapshot_from_bytes, snapshot_to_bytes};
use crate::questionnaire::ProgressSnapshot;
use crate::StationflowError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for snapshots: storage key -> encoded snapshot bytes
const SNAPSHOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

fn io_err(e: impl std::fmt::Display) -> StationflowError {
    StationflowError::IoError(e.to_string())
}

pub struct RedbProgressStore {
    db: Database,
}

impl std::fmt::Debug for RedbProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbProgressStore").finish_non_exhaustive()
    }
}

impl RedbProgressStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StationflowError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize the table so first reads do not fail
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(SNAPSHOTS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }
}

impl ProgressPort for RedbProgressStore {
    fn load(&self, key: &SnapshotKey) -> Result<Option<ProgressSnapshot>, StationflowError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SNAPSHOTS).map_err(io_err)?;
        let storage_key = key.storage_key();
        let record = table.get(storage_key.as_str()).map_err(io_err)?;
        record
            .map(|data| snapshot_from_bytes(data.value()))
            .transpose()
    }

    fn save(&self, key: &SnapshotKey, snapshot: &ProgressSnapshot) -> Result<(), StationflowError> {
        let bytes = snapshot_to_bytes(snapshot)?;
        let storage_key = key.storage_key();

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(SNAPSHOTS).map_err(io_err)?;
            table
                .insert(storage_key.as_str(), bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::QuestionId;
    use crate::{TeamId, UserId};

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("progress.db");
        let key = SnapshotKey::new(UserId::new("grace"), Some(TeamId(9)));

        let mut snapshot = ProgressSnapshot {
            current_section: 4,
            current_question: 2,
            updated_at_ms: 42,
            ..ProgressSnapshot::default()
        };
        snapshot
            .answers
            .insert(QuestionId::new("market"), "Students".to_string());

        {
            let store = RedbProgressStore::open(&path).expect("open");
            store.save(&key, &snapshot).expect("save");
        }

        let store = RedbProgressStore::open(&path).expect("reopen");
        assert_eq!(store.load(&key).expect("load"), Some(snapshot));
    }

    #[test]
    fn missing_record_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RedbProgressStore::open(dir.path().join("p.db")).expect("open");
        let key = SnapshotKey::new(UserId::new("nobody"), None);
        assert_eq!(store.load(&key).expect("load"), None);
        assert!(!store.mark_completed(&key, 1).expect("mark"));
    }
}

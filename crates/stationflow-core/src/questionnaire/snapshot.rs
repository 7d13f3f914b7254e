//! # Progress Snapshot
//!
//! The persistable form of a questionnaire session, and the rule for
//! choosing between a remote and a local copy.

use super::QuestionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answers plus position, as stored remotely and in the local fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub answers: BTreeMap<QuestionId, String>,
    /// 1-based section number.
    pub current_section: usize,
    pub current_question: usize,
    /// Milliseconds since the Unix epoch of the last edit or move.
    #[serde(default)]
    pub updated_at_ms: u64,
    /// Set once the questionnaire was submitted. The record is kept.
    #[serde(default)]
    pub completed_at_ms: Option<u64>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at_ms.is_some()
    }
}

/// Which copy [`reconcile`] chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Remote,
    Local,
}

/// Pick between a remotely loaded snapshot and the local fallback.
///
/// Last writer wins by `updated_at_ms`; a tie goes to the remote copy.
#[must_use]
pub fn reconcile(
    remote: Option<ProgressSnapshot>,
    local: Option<ProgressSnapshot>,
) -> Option<(ProgressSnapshot, SnapshotSource)> {
    match (remote, local) {
        (Some(r), Some(l)) => {
            if l.updated_at_ms > r.updated_at_ms {
                Some((l, SnapshotSource::Local))
            } else {
                Some((r, SnapshotSource::Remote))
            }
        }
        (Some(r), None) => Some((r, SnapshotSource::Remote)),
        (None, Some(l)) => Some((l, SnapshotSource::Local)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64, section: usize) -> ProgressSnapshot {
        ProgressSnapshot {
            current_section: section,
            updated_at_ms: ms,
            ..ProgressSnapshot::default()
        }
    }

    #[test]
    fn newer_local_wins() {
        let (snap, source) = reconcile(Some(at(10, 2)), Some(at(20, 5))).expect("some");
        assert_eq!(source, SnapshotSource::Local);
        assert_eq!(snap.current_section, 5);
    }

    #[test]
    fn tie_goes_to_remote() {
        let (_, source) = reconcile(Some(at(10, 2)), Some(at(10, 5))).expect("some");
        assert_eq!(source, SnapshotSource::Remote);
    }

    #[test]
    fn falls_back_to_whatever_exists() {
        assert_eq!(
            reconcile(None, Some(at(1, 1))).map(|(_, s)| s),
            Some(SnapshotSource::Local)
        );
        assert_eq!(reconcile(None, None), None);
    }
}

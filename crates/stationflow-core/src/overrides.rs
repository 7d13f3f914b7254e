//! # Override Cache
//!
//! The synchronous half of override synchronization: which fetched snapshot
//! wins, and whether a new one is worth republishing.
//!
//! Rules applied by [`OverrideCache::apply`]:
//! - A failed fetch keeps the previous snapshot (stale but available).
//! - A result older than the last applied one is discarded.
//! - A result fetched for another team context is discarded.
//! - A result equal to the cached snapshot is not republished.
//!
//! The never-fetched state is the empty snapshot, which gates every
//! non-completed station to locked.

use crate::{CompletionSet, GatingInputs, OverrideMap, Station, TeamId};
use serde::{Deserialize, Serialize};

/// The two administrator override maps, fetched together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverrideSnapshot {
    pub locks: OverrideMap,
    pub unlocks: OverrideMap,
}

impl OverrideSnapshot {
    #[must_use]
    pub fn new(locks: OverrideMap, unlocks: OverrideMap) -> Self {
        Self { locks, unlocks }
    }

    /// Combine these overrides with the other gating inputs.
    #[must_use]
    pub fn gating_inputs(
        &self,
        completed: CompletionSet,
        current: Station,
        idea_artifact_complete: bool,
    ) -> GatingInputs {
        GatingInputs {
            completed,
            current,
            locks: self.locks.clone(),
            unlocks: self.unlocks.clone(),
            idea_artifact_complete,
        }
    }
}

/// Issued when a fetch is dispatched; handed back with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    context: Option<TeamId>,
}

impl FetchTicket {
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn context(&self) -> Option<TeamId> {
        self.context
    }
}

/// What [`OverrideCache::apply`] did with a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    /// New content; downstream should recompute.
    Republished,
    /// Same content as cached; nothing to do.
    Unchanged,
    /// Fetch failed; previous snapshot retained.
    Stale,
    /// Result superseded or for another context; ignored.
    Discarded,
}

impl CacheUpdate {
    #[must_use]
    pub fn is_republished(self) -> bool {
        matches!(self, CacheUpdate::Republished)
    }
}

/// Latest-wins, change-aware cache of the override snapshot.
#[derive(Debug, Clone, Default)]
pub struct OverrideCache {
    snapshot: OverrideSnapshot,
    context: Option<TeamId>,
    issued: u64,
    applied: u64,
    fetched: bool,
}

impl OverrideCache {
    #[must_use]
    pub fn new(context: Option<TeamId>) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &OverrideSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn context(&self) -> Option<TeamId> {
        self.context
    }

    /// Whether any fetch has succeeded for the current context.
    #[must_use]
    pub fn has_fetched(&self) -> bool {
        self.fetched
    }

    /// Register a fetch about to be dispatched.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued = self.issued.saturating_add(1);
        FetchTicket {
            seq: self.issued,
            context: self.context,
        }
    }

    /// Apply the result of a fetch previously registered with
    /// [`OverrideCache::begin_fetch`].
    pub fn apply<E>(
        &mut self,
        ticket: FetchTicket,
        result: Result<OverrideSnapshot, E>,
    ) -> CacheUpdate {
        if ticket.context != self.context || ticket.seq <= self.applied {
            return CacheUpdate::Discarded;
        }
        let Ok(snapshot) = result else {
            return CacheUpdate::Stale;
        };

        self.applied = ticket.seq;
        self.fetched = true;
        if snapshot == self.snapshot {
            CacheUpdate::Unchanged
        } else {
            self.snapshot = snapshot;
            CacheUpdate::Republished
        }
    }

    /// Move to another team context. Returns `true` if the context changed,
    /// in which case the snapshot is reset and in-flight fetches are void.
    pub fn switch_context(&mut self, context: Option<TeamId>) -> bool {
        if context == self.context {
            return false;
        }
        self.context = context;
        self.snapshot = OverrideSnapshot::default();
        self.applied = self.issued;
        self.fetched = false;
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn unlocking(key: &str) -> OverrideSnapshot {
        OverrideSnapshot::new(OverrideMap::new(), OverrideMap::new().with(key, true))
    }

    #[test]
    fn first_fetch_republishes() {
        let mut cache = OverrideCache::new(Some(TeamId(1)));
        let ticket = cache.begin_fetch();
        let update = cache.apply::<()>(ticket, Ok(unlocking("mvp")));
        assert_eq!(update, CacheUpdate::Republished);
        assert!(cache.snapshot().unlocks.is_set("mvp"));
    }

    #[test]
    fn identical_content_is_not_republished() {
        let mut cache = OverrideCache::new(None);
        let t1 = cache.begin_fetch();
        cache.apply::<()>(t1, Ok(unlocking("mvp")));
        let t2 = cache.begin_fetch();
        assert_eq!(
            cache.apply::<()>(t2, Ok(unlocking("mvp"))),
            CacheUpdate::Unchanged
        );
    }

    #[test]
    fn failure_keeps_previous_snapshot() {
        let mut cache = OverrideCache::new(None);
        let t1 = cache.begin_fetch();
        cache.apply::<&str>(t1, Ok(unlocking("mvp")));
        let t2 = cache.begin_fetch();
        assert_eq!(cache.apply(t2, Err("timeout")), CacheUpdate::Stale);
        assert!(cache.snapshot().unlocks.is_set("mvp"));
    }

    #[test]
    fn older_result_is_discarded() {
        let mut cache = OverrideCache::new(None);
        let old = cache.begin_fetch();
        let new = cache.begin_fetch();
        cache.apply::<()>(new, Ok(unlocking("legal")));
        assert_eq!(
            cache.apply::<()>(old, Ok(unlocking("mvp"))),
            CacheUpdate::Discarded
        );
        assert!(cache.snapshot().unlocks.is_set("legal"));
        assert!(!cache.snapshot().unlocks.is_set("mvp"));
    }

    #[test]
    fn late_result_for_previous_team_is_discarded() {
        let mut cache = OverrideCache::new(Some(TeamId(1)));
        let ticket = cache.begin_fetch();
        assert!(cache.switch_context(Some(TeamId(2))));
        assert_eq!(
            cache.apply::<()>(ticket, Ok(unlocking("mvp"))),
            CacheUpdate::Discarded
        );
        assert!(cache.snapshot().unlocks.is_empty());
        assert!(!cache.has_fetched());
    }
}

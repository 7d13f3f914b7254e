//! # Invalidation Bus
//!
//! Cross-session "something changed" signals, fanned out over a tokio
//! broadcast channel.

use stationflow_core::TeamId;
use tokio::sync::broadcast;

/// Event name announcing that roadmap overrides changed.
pub const ROADMAP_UPDATED: &str = "roadmap-updated";

const DEFAULT_CAPACITY: usize = 64;

/// One invalidation signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub event: String,
    /// Team the change applies to; `None` applies to everyone.
    pub team: Option<TeamId>,
}

impl Invalidation {
    pub fn new(event: impl Into<String>, team: Option<TeamId>) -> Self {
        Self {
            event: event.into(),
            team,
        }
    }

    pub fn roadmap_updated(team: Option<TeamId>) -> Self {
        Self::new(ROADMAP_UPDATED, team)
    }

    /// Whether this event concerns `context`.
    #[must_use]
    pub fn applies_to(&self, context: Option<TeamId>) -> bool {
        self.team.is_none() || self.team == context
    }
}

/// Shared broadcast channel; clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct InvalidationBus {
    tx: broadcast::Sender<Invalidation>,
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InvalidationBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns how many subscribers will see it.
    pub fn publish(&self, event: Invalidation) -> usize {
        tracing::debug!(event = %event.event, team = ?event.team, "Publishing invalidation");
        self.tx.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.tx.subscribe()
    }
}

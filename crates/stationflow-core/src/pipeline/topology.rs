//! # Pipeline Topology
//!
//! Static definition of the incubator pipeline.
//!
//! | Position | Station | Key | Kind |
//! |----------|---------|-----|------|
//! | 0 | 1 | idea | pipeline |
//! | 1 | 2 | mockup | pipeline |
//! | 2 | 3 | validation | pipeline |
//! | 3 | 4 | pitch_deck | pipeline |
//! | 4 | 5 | mentorship_pre | pipeline |
//! | 5 | 6 | mvp | pipeline |
//! | 6 | 7 | user_testing | pipeline |
//! | 7 | 12 | finance | workshop |
//! | 8 | 13 | marketing | workshop |
//! | 9 | 14 | legal | workshop |
//! | 10 | 8 | mentorship_post | pipeline |
//! | 11 | 9 | traction | pipeline |
//! | 12 | 10 | fundraising | pipeline |
//! | 13 | 11 | demo_day | pipeline |
//! | 14 | 15 | graduation | pipeline |
//!
//! Workshops are rendered twice (inline and standalone) but are one
//! station for status purposes.

use crate::Station;
use crate::primitives::{PIPELINE_ORDER, WORKSHOPS};
use serde::{Deserialize, Serialize};

// =============================================================================
// TOPOLOGY NODE
// =============================================================================

/// Where a rendered node is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// A node in the main pipeline sequence.
    Inline,
    /// A workshop's separate entry point.
    Standalone,
}

/// A node of the rendered topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub station: Station,
    pub anchor: Anchor,
}

// =============================================================================
// PIPELINE TOPOLOGY
// =============================================================================

/// Pure lookups over the fixed pipeline.
///
/// Every method is total over [`Station`]; unknown raw ids never get this far.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineTopology;

impl PipelineTopology {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Stations in canonical traversal order.
    #[must_use]
    pub fn order(&self) -> &'static [Station; 15] {
        &PIPELINE_ORDER
    }

    /// Zero-based index of a station in the pipeline order.
    #[must_use]
    pub fn position_of(&self, station: Station) -> usize {
        // PIPELINE_ORDER holds every variant; the fallback is unreachable.
        PIPELINE_ORDER
            .iter()
            .position(|s| *s == station)
            .unwrap_or(PIPELINE_ORDER.len())
    }

    /// Stable administrator-facing key used to address override maps.
    #[must_use]
    pub fn section_key_of(&self, station: Station) -> &'static str {
        match station {
            Station::Idea => "idea",
            Station::Mockup => "mockup",
            Station::Validation => "validation",
            Station::PitchDeck => "pitch_deck",
            Station::MentorshipPre => "mentorship_pre",
            Station::Mvp => "mvp",
            Station::UserTesting => "user_testing",
            Station::MentorshipPost => "mentorship_post",
            Station::Traction => "traction",
            Station::Fundraising => "fundraising",
            Station::DemoDay => "demo_day",
            Station::Finance => "finance",
            Station::Marketing => "marketing",
            Station::Legal => "legal",
            Station::Graduation => "graduation",
        }
    }

    /// Reverse of [`PipelineTopology::section_key_of`].
    #[must_use]
    pub fn station_by_key(&self, key: &str) -> Option<Station> {
        Station::ALL
            .iter()
            .copied()
            .find(|s| self.section_key_of(*s) == key)
    }

    /// Previous and next station following the pipeline order.
    #[must_use]
    pub fn neighbors(&self, station: Station) -> (Option<Station>, Option<Station>) {
        let pos = self.position_of(station);
        let prev = pos
            .checked_sub(1)
            .and_then(|p| PIPELINE_ORDER.get(p).copied());
        let next = PIPELINE_ORDER.get(pos.saturating_add(1)).copied();
        (prev, next)
    }

    #[must_use]
    pub fn is_workshop(&self, station: Station) -> bool {
        WORKSHOPS.contains(&station)
    }

    /// Workshop stations in pipeline order.
    #[must_use]
    pub fn workshops(&self) -> &'static [Station; 3] {
        &WORKSHOPS
    }

    /// Human title for display.
    #[must_use]
    pub fn display_name(&self, station: Station) -> &'static str {
        match station {
            Station::Idea => "Idea Card",
            Station::Mockup => "Mockup",
            Station::Validation => "Validation Report",
            Station::PitchDeck => "Pitch Deck",
            Station::MentorshipPre => "Mentorship (pre-MVP)",
            Station::Mvp => "MVP",
            Station::UserTesting => "User Testing",
            Station::MentorshipPost => "Mentorship (post-MVP)",
            Station::Traction => "Traction",
            Station::Fundraising => "Fundraising",
            Station::DemoDay => "Demo Day",
            Station::Finance => "Finance Workshop",
            Station::Marketing => "Marketing Workshop",
            Station::Legal => "Legal Workshop",
            Station::Graduation => "Graduation",
        }
    }

    /// The rendered topology: the pipeline inline, then each workshop again
    /// as a standalone entry.
    #[must_use]
    pub fn rendered_nodes(&self) -> Vec<TopologyNode> {
        let inline = PIPELINE_ORDER.iter().map(|&station| TopologyNode {
            station,
            anchor: Anchor::Inline,
        });
        let standalone = WORKSHOPS.iter().map(|&station| TopologyNode {
            station,
            anchor: Anchor::Standalone,
        });
        inline.chain(standalone).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

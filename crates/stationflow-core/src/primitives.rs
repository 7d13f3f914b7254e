//! # Fixed Primitives
//!
//! Compile-time constants for the stationflow core.
//!
//! The pipeline shape and the questionnaire size are fixed at build time.
//! Nothing here is configurable at runtime.

use crate::Station;

/// Canonical traversal order of the pipeline.
///
/// The three workshops (12, 13, 14) are spliced contiguously between
/// station 7 and station 8.
pub const PIPELINE_ORDER: [Station; 15] = [
    Station::Idea,
    Station::Mockup,
    Station::Validation,
    Station::PitchDeck,
    Station::MentorshipPre,
    Station::Mvp,
    Station::UserTesting,
    Station::Finance,
    Station::Marketing,
    Station::Legal,
    Station::MentorshipPost,
    Station::Traction,
    Station::Fundraising,
    Station::DemoDay,
    Station::Graduation,
];

/// Stations that also appear as standalone entry points.
pub const WORKSHOPS: [Station; 3] = [Station::Finance, Station::Marketing, Station::Legal];

/// The only station whose completion may be derived from an artifact.
pub const DERIVED_COMPLETION_STATION: Station = Station::Idea;

/// Number of sections in every questionnaire.
pub const SECTION_COUNT: usize = 8;

/// Magic bytes for the local progress snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"STFL";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot encoding.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum encoded size of a single local snapshot (4 MB).
pub const MAX_SNAPSHOT_SIZE: usize = 4 * 1024 * 1024;

/// Maximum length of a single answer in bytes (64KB).
///
/// Longer answers are rejected by `Progression::set_answer`.
pub const MAX_ANSWER_LENGTH: usize = 65536;

/// Budget for all answers of one questionnaire, counted as id bytes plus
/// answer bytes plus `ANSWER_ENTRY_OVERHEAD` per entry.
///
/// Kept below `MAX_SNAPSHOT_SIZE` so every accepted answer set still
/// encodes into a local snapshot.
pub const MAX_ANSWERS_TOTAL: usize = MAX_SNAPSHOT_SIZE - 4096;

/// Worst-case encoding overhead of one answer entry (two length varints).
pub const ANSWER_ENTRY_OVERHEAD: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_contains_every_station_once() {
        let mut seen: Vec<u8> = PIPELINE_ORDER.iter().map(|s| s.id()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=15).collect::<Vec<u8>>());
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"STFL");
    }
}

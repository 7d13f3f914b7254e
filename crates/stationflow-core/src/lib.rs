//! # stationflow-core
//!
//! The deterministic progression engines for stationflow - THE LOGIC.
//!
//! This crate decides, from snapshots of externally owned data:
//! - the status of every incubator station (`pipeline`)
//! - which override snapshot is current (`overrides`)
//! - where a team is in the seeding questionnaire and what it may do next
//!   (`questionnaire`)
//! - how questionnaire progress is kept locally (`formats`, `storage`)
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Has NO async, NO network dependencies (pure Rust)
//! - Never stores a computed status; every evaluation is recomputed
//! - Uses `BTreeMap`/`BTreeSet` and integer arithmetic only
//! - Never panics; fallible operations return `StationflowError`

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod overrides;
pub mod pipeline;
pub mod primitives;
pub mod questionnaire;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CompletionSet, OverrideMap, Station, StationStatus, StationflowError, TeamId, UserId,
};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use overrides::{CacheUpdate, FetchTicket, OverrideCache, OverrideSnapshot};
pub use pipeline::{
    Anchor, EntryIntent, GatingEngine, GatingInputs, PipelineTopology, StationBoard, TopologyNode,
};
pub use questionnaire::{
    AnswerEdit, AnswerMap, ProgressPointer, ProgressSnapshot, Progression, Question, QuestionId,
    QuestionnaireSchema, Section, SectionAnswers, SectionState, SnapshotSource, Step, Submission,
    SubmittedAnswer, reconcile,
};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use formats::{PersistenceHeader, snapshot_from_bytes, snapshot_to_bytes};
pub use storage::{MemoryProgressStore, ProgressPort, RedbProgressStore, SnapshotKey};

//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the engines are INVALID.
//!
//! ## Tiers
//! - T0: Pipeline Topology
//! - T1: Station Gating
//! - T2: Questionnaire Progression
//! - T3: Snapshot Continuity (overrides + local progress)

use stationflow_core::{
    CacheUpdate, CompletionSet, GatingEngine, GatingInputs, MemoryProgressStore, OverrideCache,
    OverrideMap, OverrideSnapshot, PipelineTopology, ProgressPort, Progression, Question,
    QuestionId, QuestionnaireSchema, Section, SnapshotKey, Station, StationStatus,
    StationflowError, Step, UserId,
};

fn completed(ids: &[u8]) -> CompletionSet {
    CompletionSet::from_ids(ids.iter().copied()).0
}

/// Section 1 has two required questions; every other section one required
/// and one optional.
fn schema() -> QuestionnaireSchema {
    let mut sections = vec![Section::new(
        "Problem",
        vec![
            Question::new("problem", "What problem do you solve?", true),
            Question::new("who", "Who has it?", true),
        ],
    )];
    for n in 2..=8 {
        sections.push(Section::new(
            format!("Section {n}"),
            vec![
                Question::new(format!("s{n}_required"), "Required", true),
                Question::new(format!("s{n}_optional"), "Optional", false),
            ],
        ));
    }
    QuestionnaireSchema::new(sections).expect("valid schema")
}

// =============================================================================
// TIER T0: PIPELINE TOPOLOGY
// =============================================================================

mod t0_topology {
    use super::*;

    /// T0.1: Canonical order is fixed.
    #[test]
    fn canonical_order() {
        let ids: Vec<u8> = PipelineTopology::new()
            .order()
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 12, 13, 14, 8, 9, 10, 11, 15]);
    }

    /// T0.2: Workshops are contiguous between 7 and 8.
    #[test]
    fn workshop_contiguity() {
        let topo = PipelineTopology::new();
        let seven = topo.position_of(Station::UserTesting);
        assert_eq!(topo.position_of(Station::Finance), seven + 1);
        assert_eq!(topo.position_of(Station::Marketing), seven + 2);
        assert_eq!(topo.position_of(Station::Legal), seven + 3);
        assert_eq!(topo.position_of(Station::MentorshipPost), seven + 4);
    }

    /// T0.3: Known section keys.
    #[test]
    fn section_keys() {
        let topo = PipelineTopology::new();
        assert_eq!(topo.section_key_of(Station::Idea), "idea");
        assert_eq!(topo.section_key_of(Station::Mvp), "mvp");
        assert_eq!(topo.section_key_of(Station::Finance), "finance");
        assert_eq!(topo.section_key_of(Station::PitchDeck), "pitch_deck");
        assert_eq!(topo.section_key_of(Station::MentorshipPre), "mentorship_pre");
    }
}

// =============================================================================
// TIER T1: STATION GATING
// =============================================================================

mod t1_gating {
    use super::*;

    /// T1.1: Current station unlocked by admin is active; the next one,
    /// with no key present, is locked.
    #[test]
    fn active_current_and_locked_successor() {
        let engine = GatingEngine::new();
        let inputs = GatingInputs {
            completed: completed(&[1, 2, 3]),
            current: Station::PitchDeck,
            locks: OverrideMap::new(),
            unlocks: OverrideMap::new().with("pitch_deck", true),
            idea_artifact_complete: false,
        };
        assert_eq!(
            engine.status_of(Station::PitchDeck, &inputs),
            StationStatus::Active
        );
        assert_eq!(
            engine.status_of(Station::MentorshipPre, &inputs),
            StationStatus::Locked
        );
    }

    /// T1.2: Idea artifact completes station 1 with an empty completion set.
    #[test]
    fn derived_idea_completion() {
        let engine = GatingEngine::new();
        let mut inputs = GatingInputs::new(Station::Idea);
        inputs.idea_artifact_complete = true;
        assert_eq!(
            engine.status_of(Station::Idea, &inputs),
            StationStatus::Completed
        );
    }

    /// T1.3: Evaluation is idempotent.
    #[test]
    fn evaluation_idempotent() {
        let engine = GatingEngine::new();
        let mut inputs = GatingInputs::new(Station::Mvp);
        inputs.completed = completed(&[1, 2, 3, 4, 5]);
        inputs.unlocks = OverrideMap::new().with("mvp", true).with("legal", true);
        assert_eq!(engine.board(&inputs), engine.board(&inputs));
    }
}

// =============================================================================
// TIER T2: QUESTIONNAIRE PROGRESSION
// =============================================================================

mod t2_questionnaire {
    use super::*;

    /// T2.1: Jumping past an untouched section is rejected even when the
    /// current section is complete.
    #[test]
    fn jump_past_untouched_section_rejected() {
        let mut p = Progression::new(schema());
        p.set_answer(&QuestionId::new("problem"), "Onboarding is slow")
            .expect("known");
        p.set_answer(&QuestionId::new("who"), "HR teams").expect("known");
        assert_eq!(p.is_section_complete(1), Ok(true));
        assert_eq!(p.jump_to(3), Err(StationflowError::SectionInaccessible(3)));
        assert_eq!(p.pointer().section, 1);
    }

    /// T2.2: A blank required answer blocks Continue with no state change.
    #[test]
    fn blank_required_blocks_continue() {
        let mut p = Progression::new(schema());
        let before = p.snapshot(0);
        assert!(!p.can_advance());
        assert!(p.next().is_err());
        assert_eq!(p.snapshot(0), before);
    }

    /// T2.3: Linear numbering spans sections.
    #[test]
    fn linear_numbering() {
        let mut p = Progression::new(schema());
        p.set_answer(&QuestionId::new("problem"), "x").expect("known");
        p.set_answer(&QuestionId::new("who"), "y").expect("known");
        p.next().expect("q2");
        let step = p.next().expect("section 2");
        assert!(matches!(step, Step::Moved(ptr) if ptr.section == 2 && ptr.question == 0));
        assert_eq!(p.global_number(), 3);
        assert_eq!(p.total_questions(), 16);
    }
}

// =============================================================================
// TIER T3: SNAPSHOT CONTINUITY
// =============================================================================

mod t3_continuity {
    use super::*;

    /// T3.1: A failed refresh keeps the last good override snapshot.
    #[test]
    fn stale_overrides_survive_failure() {
        let engine = GatingEngine::new();
        let mut cache = OverrideCache::new(None);

        let ticket = cache.begin_fetch();
        let good = OverrideSnapshot::new(OverrideMap::new(), OverrideMap::new().with("mvp", true));
        assert_eq!(
            cache.apply::<String>(ticket, Ok(good)),
            CacheUpdate::Republished
        );

        let ticket = cache.begin_fetch();
        assert_eq!(
            cache.apply(ticket, Err("connection reset".to_string())),
            CacheUpdate::Stale
        );

        let inputs = cache.snapshot().gating_inputs(CompletionSet::new(), Station::Mvp, false);
        assert_eq!(engine.status_of(Station::Mvp, &inputs), StationStatus::Active);
    }

    /// T3.2: Never-fetched overrides gate everything to locked.
    #[test]
    fn never_fetched_is_default_deny() {
        let engine = GatingEngine::new();
        let cache = OverrideCache::new(None);
        let inputs = cache.snapshot().gating_inputs(CompletionSet::new(), Station::Idea, false);
        assert!(
            engine
                .board(&inputs)
                .entries()
                .iter()
                .all(|(_, s)| *s == StationStatus::Locked)
        );
    }

    /// T3.3: Local snapshot resumes position and answers.
    #[test]
    fn resume_from_local_snapshot() {
        let store = MemoryProgressStore::new();
        let key = SnapshotKey::new(UserId::new("lin"), None);

        let mut p = Progression::new(schema());
        p.set_answer(&QuestionId::new("problem"), "x").expect("known");
        p.next().expect("moved");
        store.save(&key, &p.snapshot(7)).expect("save");

        let resumed = Progression::resume(schema(), store.load(&key).expect("load"));
        assert_eq!(resumed.pointer(), p.pointer());
        assert_eq!(resumed.answers(), p.answers());
    }
}

//! # Property-Based Tests
//!
//! Gating and progression invariants checked with proptest.

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use stationflow_core::{
    CompletionSet, GatingEngine, GatingInputs, OverrideMap, PipelineTopology, Progression,
    Question, QuestionnaireSchema, Section, Station, StationStatus, StationflowError, Step,
};

// =============================================================================
// STRATEGIES
// =============================================================================

fn station() -> impl Strategy<Value = Station> {
    (0usize..15).prop_map(|i| Station::ALL[i])
}

fn completion_set() -> impl Strategy<Value = CompletionSet> {
    vec(station(), 0..15).prop_map(|stations| stations.into_iter().collect::<CompletionSet>())
}

/// Override maps over real section keys plus some noise keys.
fn override_map() -> impl Strategy<Value = OverrideMap> {
    let topology = PipelineTopology::new();
    let keys: Vec<String> = Station::ALL
        .iter()
        .map(|s| topology.section_key_of(*s).to_string())
        .chain(["bogus".to_string(), String::new()])
        .collect();
    btree_map(prop::sample::select(keys), any::<bool>(), 0..10)
        .prop_map(|m| m.into_iter().collect::<OverrideMap>())
}

fn inputs() -> impl Strategy<Value = GatingInputs> {
    (
        completion_set(),
        station(),
        override_map(),
        override_map(),
        any::<bool>(),
    )
        .prop_map(
            |(completed, current, locks, unlocks, idea_artifact_complete)| GatingInputs {
                completed,
                current,
                locks,
                unlocks,
                idea_artifact_complete,
            },
        )
}

/// Eight sections of 1..5 questions each with random required flags.
fn schema() -> impl Strategy<Value = QuestionnaireSchema> {
    vec(vec(any::<bool>(), 1..5), 8).prop_map(|sections| {
        let sections = sections
            .into_iter()
            .enumerate()
            .map(|(s, flags)| {
                let questions = flags
                    .into_iter()
                    .enumerate()
                    .map(|(q, required)| Question::new(format!("s{s}q{q}"), "?", required))
                    .collect();
                Section::new(format!("Section {}", s + 1), questions)
            })
            .collect();
        QuestionnaireSchema::new(sections).expect("generated schema is valid")
    })
}

/// Answer every question and walk to the end.
fn complete_walkthrough(schema: QuestionnaireSchema) -> Progression {
    let mut p = Progression::new(schema);
    loop {
        let id = p.current_question().expect("question").id.clone();
        p.set_answer(&id, format!("answer for {id}")).expect("known");
        match p.next().expect("gate open") {
            Step::Moved(_) => {}
            Step::ReadyToSubmit => return p,
        }
    }
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A completed station is completed whatever the overrides say.
    #[test]
    fn completion_dominates(mut inputs in inputs(), station in station()) {
        inputs.completed = inputs.completed.iter().chain([station]).collect();
        prop_assert_eq!(
            GatingEngine::new().status_of(station, &inputs),
            StationStatus::Completed
        );
    }

    /// Without overrides every non-completed station is locked.
    #[test]
    fn default_deny(mut inputs in inputs()) {
        inputs.locks = OverrideMap::new();
        inputs.unlocks = OverrideMap::new();
        inputs.idea_artifact_complete = false;
        let engine = GatingEngine::new();
        for station in Station::ALL {
            if !inputs.completed.contains(station) {
                prop_assert_eq!(engine.status_of(station, &inputs), StationStatus::Locked);
            }
        }
    }

    /// Lock on a key always wins over unlock on the same key.
    #[test]
    fn lock_precedence(mut inputs in inputs(), station in station()) {
        let key = PipelineTopology::new().section_key_of(station);
        inputs.locks.set(key, true);
        inputs.unlocks.set(key, true);
        let status = GatingEngine::new().status_of(station, &inputs);
        prop_assert!(status == StationStatus::Locked || status == StationStatus::Completed);
    }

    /// Only the current station can be active, and at most one is.
    #[test]
    fn single_active_station(inputs in inputs()) {
        let board = GatingEngine::new().board(&inputs);
        let active: Vec<Station> = board
            .entries()
            .iter()
            .filter(|(_, s)| *s == StationStatus::Active)
            .map(|(st, _)| *st)
            .collect();
        prop_assert!(active.len() <= 1);
        if let Some(a) = active.first() {
            prop_assert_eq!(*a, inputs.current);
        }
    }

    /// Jumping back is always allowed; jumping ahead needs completion.
    #[test]
    fn accessibility_boundary(schema in schema(), target in 1usize..=8) {
        let p = Progression::new(schema);
        let allowed = p.clone().jump_to(target);
        if target == 1 {
            prop_assert!(allowed.is_ok());
        } else if p.is_section_complete(target).expect("section") {
            prop_assert!(allowed.is_ok());
        } else {
            prop_assert_eq!(allowed, Err(StationflowError::SectionInaccessible(target)));
        }
    }

    /// From the end, every earlier section is reachable.
    #[test]
    fn backward_jumps_always_succeed(schema in schema(), target in 1usize..=8) {
        let mut p = complete_walkthrough(schema);
        prop_assert!(p.jump_to(target).is_ok());
    }

    /// Submitting twice with unchanged answers yields the same payload.
    #[test]
    fn submission_idempotent(schema in schema(), t1 in any::<u64>(), t2 in any::<u64>()) {
        let mut p = complete_walkthrough(schema);
        let first = p.submit(t1).expect("submit");
        let second = p.submit(t2).expect("resubmit");
        prop_assert_eq!(first, second);
    }

    /// Progress percentage is monotone along a walkthrough and ends at 100.
    #[test]
    fn progress_monotone(schema in schema()) {
        let mut p = Progression::new(schema);
        let mut last = p.progress_percent();
        loop {
            let id = p.current_question().expect("question").id.clone();
            p.set_answer(&id, "x").expect("known");
            match p.next().expect("gate open") {
                Step::Moved(_) => {
                    prop_assert!(p.progress_percent() >= last);
                    last = p.progress_percent();
                }
                Step::ReadyToSubmit => break,
            }
        }
        prop_assert_eq!(p.progress_percent(), 100);
    }
}

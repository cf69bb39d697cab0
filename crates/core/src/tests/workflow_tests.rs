// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    after_5pm, after_8am, before_5pm, code, create_test_actor, create_test_bulletin,
    create_test_cause, test_date,
};
use crate::{Command, CoreError, DayState, TransitionResult, apply, apply_publish_all};
use albina_domain::{
    AvalancheProblem, AvalancheProblemType, Bulletin, BulletinStatus, PublicationSchedule,
};
use time::OffsetDateTime;

fn draft_day(bulletins: Vec<Bulletin>) -> DayState {
    let mut state: DayState = DayState::new(code("AT-07"), test_date());
    state.status = BulletinStatus::Draft;
    state.bulletins = bulletins;
    state
}

fn run(state: &DayState, command: Command) -> Result<TransitionResult, CoreError> {
    apply(
        state,
        command,
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    )
}

fn publish_at(state: &DayState, now: OffsetDateTime) -> Result<TransitionResult, CoreError> {
    run(state, Command::Publish { change: false, now })
}

#[test]
fn test_submit_draft_becomes_submitted() {
    let state: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);

    let transition: TransitionResult = run(&state, Command::Submit).unwrap();

    assert_eq!(transition.new_state.status, BulletinStatus::Submitted);
    assert_eq!(transition.audit_event.action.name, "Submit");
}

#[test]
fn test_submit_is_blocked_by_duplicate_region() {
    let state: DayState = draft_day(vec![
        create_test_bulletin("b-1", "AT-07", &["AT-07-A"]),
        create_test_bulletin("b-2", "AT-07", &["AT-07-A", "AT-07-B"]),
    ]);

    let result: Result<TransitionResult, CoreError> = run(&state, Command::Submit);

    assert_eq!(
        result,
        Err(CoreError::DuplicateRegions {
            regions: vec![code("AT-07-A")]
        })
    );
}

#[test]
fn test_submit_is_blocked_by_incomplete_problem() {
    let mut bulletin: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);
    bulletin.forenoon.above.avalanche_problems[1] =
        Some(AvalancheProblem::new(AvalancheProblemType::Cornices));
    let state: DayState = draft_day(vec![bulletin]);

    let result: Result<TransitionResult, CoreError> = run(&state, Command::Submit);

    assert_eq!(
        result,
        Err(CoreError::IncompleteAvalancheProblems { count: 1 })
    );
}

#[test]
fn test_submitted_day_cannot_be_submitted_again() {
    let mut state: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);
    state.status = BulletinStatus::Submitted;

    let result: Result<TransitionResult, CoreError> = run(&state, Command::Submit);

    assert_eq!(
        result,
        Err(CoreError::InvalidTransition {
            from: BulletinStatus::Submitted,
            action: String::from("submit"),
        })
    );
}

#[test]
fn test_publish_before_5pm_gate_is_rejected() {
    let mut state: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);
    state.status = BulletinStatus::Submitted;

    let result: Result<TransitionResult, CoreError> = publish_at(&state, before_5pm());

    assert_eq!(
        result,
        Err(CoreError::PublicationGateClosed {
            date: test_date(),
            status: BulletinStatus::Submitted,
        })
    );
}

#[test]
fn test_publish_after_gate_moves_saved_regions_to_published() {
    let mut state: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);
    state.status = BulletinStatus::Submitted;

    let transition: TransitionResult = publish_at(&state, after_5pm()).unwrap();

    assert_eq!(transition.new_state.status, BulletinStatus::Published);
    let published: &Bulletin = &transition.new_state.bulletins[0];
    assert!(published.regions.saved.is_empty());
    assert_eq!(published.regions.published, vec![code("AT-07-01")]);
    assert_eq!(published.status, BulletinStatus::Published);
}

#[test]
fn test_resubmitted_day_waits_for_8am_gate() {
    let mut state: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);
    state.status = BulletinStatus::Resubmitted;

    assert!(matches!(
        publish_at(&state, after_5pm()),
        Err(CoreError::PublicationGateClosed { .. })
    ));

    let transition: TransitionResult = publish_at(&state, after_8am()).unwrap();
    assert_eq!(transition.new_state.status, BulletinStatus::Republished);
}

#[test]
fn test_draft_cannot_skip_submission() {
    let state: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);

    let result: Result<TransitionResult, CoreError> = publish_at(&state, after_8am());

    assert!(matches!(
        result,
        Err(CoreError::InvalidTransition {
            from: BulletinStatus::Draft,
            ..
        })
    ));
}

#[test]
fn test_update_cycle_after_publication() {
    let mut state: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);
    state.status = BulletinStatus::Published;

    let updated: TransitionResult =
        run(&state, Command::StartUpdate { now: after_8am() }).unwrap();
    assert_eq!(updated.new_state.status, BulletinStatus::Updated);

    let resubmitted: TransitionResult = run(&updated.new_state, Command::Submit).unwrap();
    assert_eq!(resubmitted.new_state.status, BulletinStatus::Resubmitted);

    let republished: TransitionResult = run(
        &resubmitted.new_state,
        Command::Publish {
            change: true,
            now: after_8am(),
        },
    )
    .unwrap();
    assert_eq!(republished.new_state.status, BulletinStatus::Republished);
    assert!(
        republished
            .audit_event
            .action
            .details
            .as_ref()
            .unwrap()
            .contains("change publication")
    );
}

#[test]
fn test_update_of_missing_day_requires_5pm_to_have_passed() {
    let state: DayState = DayState::new(code("AT-07"), test_date());

    assert!(matches!(
        run(&state, Command::StartUpdate { now: before_5pm() }),
        Err(CoreError::InvalidTransition { .. })
    ));
    assert_eq!(
        run(&state, Command::StartUpdate { now: after_5pm() })
            .unwrap()
            .new_state
            .status,
        BulletinStatus::Updated
    );
}

#[test]
fn test_update_of_draft_is_rejected() {
    let state: DayState = draft_day(vec![]);
    assert!(matches!(
        run(&state, Command::StartUpdate { now: after_8am() }),
        Err(CoreError::InvalidTransition { .. })
    ));
}

#[test]
fn test_publish_all_skips_regions_that_are_not_ready() {
    let mut tyrol: DayState = draft_day(vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])]);
    tyrol.status = BulletinStatus::Submitted;

    let mut south_tyrol: DayState = DayState::new(code("IT-32-BZ"), test_date());
    south_tyrol.status = BulletinStatus::Draft;

    let mut trentino: DayState = DayState::new(code("IT-32-TN"), test_date());
    trentino.status = BulletinStatus::Resubmitted;

    let results: Vec<TransitionResult> = apply_publish_all(
        &[tyrol, south_tyrol, trentino],
        &PublicationSchedule::default(),
        after_5pm(),
        &create_test_actor(),
        &create_test_cause(),
    )
    .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].new_state.region, code("AT-07"));
    assert_eq!(results[0].new_state.status, BulletinStatus::Published);
}

#[test]
fn test_publish_all_carries_each_publication_into_the_next() {
    let bulletins: Vec<Bulletin> = vec![
        create_test_bulletin("b-1", "AT-07", &["AT-07-01"]),
        create_test_bulletin("b-2", "IT-32-BZ", &["IT-32-BZ-01"]),
    ];
    let mut tyrol: DayState = draft_day(bulletins.clone());
    tyrol.status = BulletinStatus::Submitted;
    let mut south_tyrol: DayState = DayState::new(code("IT-32-BZ"), test_date());
    south_tyrol.status = BulletinStatus::Submitted;
    south_tyrol.bulletins = bulletins;

    let results: Vec<TransitionResult> = apply_publish_all(
        &[tyrol, south_tyrol],
        &PublicationSchedule::default(),
        after_5pm(),
        &create_test_actor(),
        &create_test_cause(),
    )
    .unwrap();

    assert_eq!(results.len(), 2);
    let last: &DayState = &results[1].new_state;
    for bulletin in &last.bulletins {
        assert_eq!(bulletin.status, BulletinStatus::Published);
        assert!(bulletin.regions.saved.is_empty());
        assert_eq!(bulletin.regions.published.len(), 1);
    }
}

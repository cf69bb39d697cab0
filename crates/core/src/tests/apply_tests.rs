// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    before_5pm, bulletin_id, code, create_test_actor, create_test_bulletin, create_test_cause,
    test_date,
};
use crate::{Command, CoreError, DayState, TransitionResult, apply};
use albina_domain::{
    Author, Bulletin, BulletinStatus, DangerRating, Daytime, PublicationSchedule,
};

fn save(state: &DayState, bulletins: Vec<Bulletin>) -> Result<TransitionResult, CoreError> {
    apply(
        state,
        Command::SaveBulletins {
            bulletins,
            now: before_5pm(),
        },
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    )
}

#[test]
fn test_first_save_moves_missing_day_to_draft() {
    let state: DayState = DayState::new(code("AT-07"), test_date());
    let bulletin: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);

    let transition: TransitionResult = save(&state, vec![bulletin]).unwrap();

    assert_eq!(transition.new_state.status, BulletinStatus::Draft);
    assert_eq!(transition.new_state.bulletins.len(), 1);
    assert_eq!(
        transition.new_state.bulletins[0].status,
        BulletinStatus::Draft
    );
    assert_eq!(
        transition.new_state.bulletins[0]
            .validity
            .unwrap()
            .date(),
        test_date()
    );
}

#[test]
fn test_save_emits_scoped_audit_event() {
    let state: DayState = DayState::new(code("AT-07"), test_date());
    let bulletin: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);

    let transition: TransitionResult = save(&state, vec![bulletin]).unwrap();

    assert_eq!(transition.audit_event.action.name, "SaveBulletins");
    assert_eq!(transition.audit_event.actor.username, "alice");
    assert_eq!(transition.audit_event.cause.request_id, "req-456");
    assert_eq!(transition.audit_event.scope.region, code("AT-07"));
    assert_eq!(transition.audit_event.scope.date, test_date());
    assert!(transition.audit_event.before.summary.contains("status=missing"));
    assert!(transition.audit_event.after.summary.contains("status=draft"));
}

#[test]
fn test_save_with_elevation_dependency_fills_below_from_above() {
    let state: DayState = DayState::new(code("AT-07"), test_date());
    let mut bulletin: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);
    bulletin.elevation = Some(2000);
    bulletin.has_elevation_dependency = true;

    let transition: TransitionResult = save(&state, vec![bulletin]).unwrap();

    let saved: &Bulletin = &transition.new_state.bulletins[0];
    assert_eq!(saved.forenoon.below.danger_rating, DangerRating::Considerable);
    assert_eq!(
        saved.effective_below(Daytime::Forenoon).danger_rating,
        DangerRating::Considerable
    );
}

#[test]
fn test_save_rejects_own_bulletin_without_own_region() {
    let state: DayState = DayState::new(code("AT-07"), test_date());
    let mut bulletin: Bulletin = create_test_bulletin("b-1", "AT-07", &[]);
    bulletin.regions.suggested.push(code("IT-32-BZ-01"));

    let result: Result<TransitionResult, CoreError> = save(&state, vec![bulletin]);

    assert_eq!(
        result,
        Err(CoreError::NoRegionSelected {
            bulletin: Some(bulletin_id("b-1"))
        })
    );
}

#[test]
fn test_save_rejects_bulletin_without_identifier() {
    let state: DayState = DayState::new(code("AT-07"), test_date());
    let mut bulletin: Bulletin = Bulletin::new(code("AT-07"), Author::new("Alice"));
    bulletin.regions.saved.push(code("AT-07-01"));

    assert_eq!(
        save(&state, vec![bulletin]),
        Err(CoreError::MissingBulletinId)
    );
}

#[test]
fn test_save_replaces_own_contributions_and_keeps_foreign_bulletins() {
    let mut state: DayState = DayState::new(code("AT-07"), test_date());
    state.status = BulletinStatus::Draft;
    let mut shared: Bulletin = create_test_bulletin("b-bz", "IT-32-BZ", &["IT-32-BZ-01"]);
    // Tyrol had accepted a suggestion on the South Tyrolean bulletin.
    shared.regions.saved.push(code("AT-07-09"));
    state.bulletins = vec![
        create_test_bulletin("b-1", "AT-07", &["AT-07-01"]),
        create_test_bulletin("b-2", "AT-07", &["AT-07-02"]),
        shared,
    ];

    // The new save only contains b-2, now covering both regions.
    let updated: Bulletin = create_test_bulletin("b-2", "AT-07", &["AT-07-01", "AT-07-02"]);
    let transition: TransitionResult = save(&state, vec![updated]).unwrap();

    let ids: Vec<&str> = transition
        .new_state
        .bulletins
        .iter()
        .map(|b| b.id.as_ref().unwrap().as_str())
        .collect();
    assert_eq!(ids, vec!["b-bz", "b-2"]);

    let foreign: &Bulletin = &transition.new_state.bulletins[0];
    assert_eq!(foreign.regions.saved, vec![code("IT-32-BZ-01")]);
    assert_eq!(transition.new_state.status, BulletinStatus::Draft);
}

#[test]
fn test_save_is_rejected_while_write_disabled() {
    for status in [
        BulletinStatus::Submitted,
        BulletinStatus::Resubmitted,
        BulletinStatus::Published,
        BulletinStatus::Republished,
    ] {
        let mut state: DayState = DayState::new(code("AT-07"), test_date());
        state.status = status;

        let result: Result<TransitionResult, CoreError> = save(
            &state,
            vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
        );

        assert!(matches!(result, Err(CoreError::WriteDisabled { .. })));
    }
}

#[test]
fn test_missing_day_cannot_be_saved_after_5pm() {
    let state: DayState = DayState::new(code("AT-07"), test_date());

    let result: Result<TransitionResult, CoreError> = apply(
        &state,
        Command::SaveBulletins {
            bulletins: vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
            now: crate::tests::helpers::after_5pm(),
        },
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    );

    assert_eq!(
        result,
        Err(CoreError::InvalidTransition {
            from: BulletinStatus::Missing,
            action: String::from("save"),
        })
    );
}

#[test]
fn test_delete_removes_own_bulletin_only() {
    let mut state: DayState = DayState::new(code("AT-07"), test_date());
    state.status = BulletinStatus::Draft;
    state.bulletins = vec![
        create_test_bulletin("b-1", "AT-07", &["AT-07-01"]),
        create_test_bulletin("b-bz", "IT-32-BZ", &["IT-32-BZ-01"]),
    ];

    let deleted: TransitionResult = apply(
        &state,
        Command::DeleteBulletin {
            bulletin: bulletin_id("b-1"),
        },
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(deleted.new_state.bulletins.len(), 1);

    let foreign: Result<TransitionResult, CoreError> = apply(
        &state,
        Command::DeleteBulletin {
            bulletin: bulletin_id("b-bz"),
        },
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    );
    assert!(matches!(foreign, Err(CoreError::NotBulletinOwner { .. })));

    let unknown: Result<TransitionResult, CoreError> = apply(
        &state,
        Command::DeleteBulletin {
            bulletin: bulletin_id("b-404"),
        },
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    );
    assert!(matches!(unknown, Err(CoreError::BulletinNotFound { .. })));
}

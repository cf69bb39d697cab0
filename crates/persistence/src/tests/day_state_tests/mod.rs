// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulletins, region status and audit events written by transitions.

use albina::{Command, DayState, TransitionResult, apply};
use albina_audit::AuditEvent;
use albina_domain::{Bulletin, BulletinStatus, PublicationSchedule, RegionDayStatus};
use time::macros::date;

use crate::error::PersistenceError;
use crate::tests::{
    code, create_test_actor, create_test_bulletin, create_test_cause, save_day, test_date,
};
use crate::SqlitePersistence;

#[test]
fn test_unwritten_day_is_missing_and_empty() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    let state: DayState = persistence.get_day_state(&code("AT-07"), test_date()).unwrap();

    assert_eq!(state.status, BulletinStatus::Missing);
    assert!(state.bulletins.is_empty());
}

#[test]
fn test_persisted_save_round_trips() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let bulletin: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01", "AT-07-02"]);

    let (result, _): (TransitionResult, i64) = save_day(&mut persistence, "AT-07", vec![bulletin]);

    let reloaded: DayState = persistence.get_day_state(&code("AT-07"), test_date()).unwrap();
    assert_eq!(reloaded, result.new_state);
    assert_eq!(reloaded.status, BulletinStatus::Draft);
}

#[test]
fn test_save_of_one_region_keeps_bulletins_of_another() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    save_day(
        &mut persistence,
        "IT-32-BZ",
        vec![create_test_bulletin("b-bz", "IT-32-BZ", &["IT-32-BZ-01"])],
    );
    save_day(
        &mut persistence,
        "AT-07",
        vec![create_test_bulletin("b-at", "AT-07", &["AT-07-01"])],
    );

    let bulletins: Vec<Bulletin> = persistence.get_bulletins(test_date()).unwrap();
    let owners: Vec<&str> = bulletins.iter().map(|b| b.owner_region.as_str()).collect();
    assert_eq!(owners, vec!["AT-07", "IT-32-BZ"]);

    // Status is tracked per region.
    assert_eq!(
        persistence.get_region_status(&code("IT-32-BZ"), test_date()).unwrap(),
        BulletinStatus::Draft
    );
    assert_eq!(
        persistence.get_region_status(&code("IT-32-TN"), test_date()).unwrap(),
        BulletinStatus::Missing
    );
}

#[test]
fn test_bulletins_are_scoped_to_their_day() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    save_day(
        &mut persistence,
        "AT-07",
        vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
    );

    assert!(persistence.get_bulletins(date!(2026 - 01 - 17)).unwrap().is_empty());
}

#[test]
fn test_transition_writes_audit_event() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    let (result, event_id): (TransitionResult, i64) = save_day(
        &mut persistence,
        "AT-07",
        vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
    );

    let stored: AuditEvent = persistence.get_audit_event(event_id).unwrap();
    assert_eq!(stored.event_id, Some(event_id));
    assert_eq!(stored.scope, result.audit_event.scope);
    assert_eq!(stored.actor, result.audit_event.actor);
    assert_eq!(stored.action, result.audit_event.action);
    assert_eq!(stored.after, result.audit_event.after);
}

#[test]
fn test_audit_timeline_is_ordered_per_region_day() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    save_day(
        &mut persistence,
        "AT-07",
        vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
    );

    let state: DayState = persistence.get_day_state(&code("AT-07"), test_date()).unwrap();
    let submitted: TransitionResult = apply(
        &state,
        Command::Submit,
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_transition(&submitted).unwrap();

    let timeline: Vec<AuditEvent> = persistence
        .get_audit_timeline(&code("AT-07"), test_date())
        .unwrap();
    let names: Vec<&str> = timeline.iter().map(|e| e.action.name.as_str()).collect();
    assert_eq!(names, vec!["SaveBulletins", "Submit"]);
    assert!(
        persistence
            .get_audit_timeline(&code("IT-32-BZ"), test_date())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_missing_audit_event_is_reported() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    assert_eq!(
        persistence.get_audit_event(99),
        Err(PersistenceError::EventNotFound(99))
    );
}

#[test]
fn test_region_statuses_in_range() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let region = code("AT-07");
    persistence
        .set_region_status(&region, date!(2026 - 01 - 14), BulletinStatus::Published)
        .unwrap();
    persistence
        .set_region_status(&region, date!(2026 - 01 - 15), BulletinStatus::Draft)
        .unwrap();
    persistence
        .set_region_status(&region, date!(2026 - 01 - 15), BulletinStatus::Submitted)
        .unwrap();
    persistence
        .set_region_status(&region, date!(2026 - 01 - 20), BulletinStatus::Draft)
        .unwrap();

    let statuses: Vec<RegionDayStatus> = persistence
        .get_region_statuses(&region, date!(2026 - 01 - 14), date!(2026 - 01 - 16))
        .unwrap();

    assert_eq!(
        statuses,
        vec![
            RegionDayStatus {
                date: date!(2026 - 01 - 14),
                status: BulletinStatus::Published,
            },
            RegionDayStatus {
                date: date!(2026 - 01 - 15),
                status: BulletinStatus::Submitted,
            },
        ]
    );
}

#[test]
fn test_day_states_cover_every_region_with_status() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    save_day(
        &mut persistence,
        "AT-07",
        vec![create_test_bulletin("b-at", "AT-07", &["AT-07-01"])],
    );
    save_day(
        &mut persistence,
        "IT-32-BZ",
        vec![create_test_bulletin("b-bz", "IT-32-BZ", &["IT-32-BZ-01"])],
    );

    let states: Vec<DayState> = persistence.get_day_states(test_date()).unwrap();

    let regions: Vec<&str> = states.iter().map(|s| s.region.as_str()).collect();
    assert_eq!(regions, vec!["AT-07", "IT-32-BZ"]);
    assert!(states.iter().all(|s| s.bulletins.len() == 2));
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod day_state_tests;
mod forecaster_tests;
mod initialization_tests;

use albina::{Command, DayState, TransitionResult, apply};
use albina_audit::{Actor, Cause};
use albina_domain::{
    Author, Bulletin, BulletinId, DangerRating, PublicationSchedule, RegionCode,
};
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};

use crate::SqlitePersistence;

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("alice"), String::from("forecaster"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-1"), String::from("Test operation"))
}

pub fn code(value: &str) -> RegionCode {
    RegionCode::new(value).unwrap()
}

pub const fn test_date() -> Date {
    date!(2026 - 01 - 16)
}

pub const fn before_5pm() -> OffsetDateTime {
    datetime!(2026-01-15 11:00 UTC)
}

pub fn create_test_bulletin(id: &str, owner: &str, regions: &[&str]) -> Bulletin {
    let mut bulletin: Bulletin = Bulletin::new(code(owner), Author::new("Alice"));
    bulletin.id = Some(BulletinId::new(id).unwrap());
    bulletin.regions.saved = regions.iter().map(|r| code(r)).collect();
    bulletin.forenoon.above.danger_rating = DangerRating::Moderate;
    bulletin
}

/// Saves `bulletins` for `region` on the test date and persists the result.
pub fn save_day(
    persistence: &mut SqlitePersistence,
    region: &str,
    bulletins: Vec<Bulletin>,
) -> (TransitionResult, i64) {
    let state: DayState = persistence.get_day_state(&code(region), test_date()).unwrap();
    let result: TransitionResult = apply(
        &state,
        Command::SaveBulletins {
            bulletins,
            now: before_5pm(),
        },
        &PublicationSchedule::default(),
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    let event_id: i64 = persistence.persist_transition(&result).unwrap();
    (result, event_id)
}

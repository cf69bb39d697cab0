// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use albina_audit::Cause;
use albina_domain::{
    Aspect, Author, AvalancheProblem, AvalancheProblemType, AvalancheSize, Bulletin,
    DangerRating, Frequency, MatrixInformation, PublicationSchedule, RegionCode,
    SnowpackStability,
};
use albina_persistence::SqlitePersistence;
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};

use crate::{AuthenticatedActor, RegionDayQuery, Role};

pub fn code(value: &str) -> RegionCode {
    RegionCode::new(value).unwrap()
}

pub fn create_test_forecaster() -> AuthenticatedActor {
    AuthenticatedActor::new(
        String::from("alice"),
        String::from("Alice"),
        Role::Forecaster,
        code("AT-07"),
    )
}

pub fn create_test_foreman() -> AuthenticatedActor {
    AuthenticatedActor::new(
        String::from("bob"),
        String::from("Bob"),
        Role::Foreman,
        code("IT-32-BZ"),
    )
}

pub fn create_test_admin() -> AuthenticatedActor {
    AuthenticatedActor::new(
        String::from("root"),
        String::from("Root"),
        Role::Admin,
        code("AT"),
    )
}

pub fn create_test_observer() -> AuthenticatedActor {
    AuthenticatedActor::new(
        String::from("olga"),
        String::from("Olga"),
        Role::Observer,
        code("AT-07"),
    )
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

/// Persistence with alice (AT-07 forecaster) and bob (IT-32-BZ foreman).
pub fn setup_test_persistence() -> SqlitePersistence {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    persistence
        .create_forecaster("alice", "Alice", "alice-pw", "AT-07", "forecaster")
        .unwrap();
    persistence
        .create_forecaster("bob", "Bob", "bob-pw", "IT-32-BZ", "foreman")
        .unwrap();
    persistence
}

pub fn schedule() -> PublicationSchedule {
    PublicationSchedule::default()
}

pub const fn test_date() -> Date {
    date!(2026 - 01 - 16)
}

/// Noon on the day before the forecast day, before the 5PM publication.
pub const fn before_5pm() -> OffsetDateTime {
    datetime!(2026-01-15 11:00 UTC)
}

/// Evening before the forecast day, after the 5PM publication.
pub const fn after_5pm() -> OffsetDateTime {
    datetime!(2026-01-15 18:00 UTC)
}

pub fn day(region: &str) -> RegionDayQuery {
    RegionDayQuery {
        date: test_date(),
        region: code(region),
    }
}

/// An unsaved bulletin of `owner` holding `regions`, ready for submission.
pub fn create_test_bulletin(owner: &str, regions: &[&str]) -> Bulletin {
    let mut problem: AvalancheProblem = AvalancheProblem::new(AvalancheProblemType::NewSnow);
    problem.aspects.insert(Aspect::N);
    problem.danger_rating = DangerRating::Considerable;
    problem.matrix = MatrixInformation {
        snowpack_stability: Some(SnowpackStability::Fair),
        frequency: Some(Frequency::Many),
        avalanche_size: Some(AvalancheSize::Medium),
    };

    let mut bulletin: Bulletin = Bulletin::new(code(owner), Author::new("Alice"));
    bulletin.regions.saved = regions.iter().map(|r| code(r)).collect();
    bulletin.forenoon.above.danger_rating = DangerRating::Considerable;
    bulletin.forenoon.above.avalanche_problems[0] = Some(problem);
    bulletin
}

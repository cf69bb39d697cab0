// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use albina_audit::{Actor, Cause};
use albina_domain::{
    Aspect, Author, AvalancheProblem, AvalancheProblemType, AvalancheSize, Bulletin, BulletinId,
    DangerRating, Frequency, MatrixInformation, RegionCode, SnowpackStability,
};
use time::{Date, OffsetDateTime};
use time::macros::{date, datetime};

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("alice"), String::from("forecaster"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Forecaster request"))
}

pub fn code(value: &str) -> RegionCode {
    RegionCode::new(value).unwrap()
}

pub fn bulletin_id(value: &str) -> BulletinId {
    BulletinId::new(value).unwrap()
}

/// The forecast day used throughout the tests.
pub const fn test_date() -> Date {
    date!(2026 - 01 - 16)
}

/// Noon on the day before the forecast day, before the 5PM publication.
pub const fn before_5pm() -> OffsetDateTime {
    datetime!(2026-01-15 11:00 UTC)
}

/// Evening before the forecast day, between the 5PM and 8AM publications.
pub const fn after_5pm() -> OffsetDateTime {
    datetime!(2026-01-15 18:00 UTC)
}

/// Late morning of the forecast day, after the 8AM publication.
pub const fn after_8am() -> OffsetDateTime {
    datetime!(2026-01-16 09:00 UTC)
}

pub fn complete_problem(rating: DangerRating) -> AvalancheProblem {
    let mut problem: AvalancheProblem = AvalancheProblem::new(AvalancheProblemType::WindSlab);
    problem.aspects.insert(Aspect::N);
    problem.aspects.insert(Aspect::NE);
    problem.danger_rating = rating;
    problem.matrix = MatrixInformation {
        snowpack_stability: Some(SnowpackStability::Poor),
        frequency: Some(Frequency::Some),
        avalanche_size: Some(AvalancheSize::Medium),
    };
    problem
}

/// A saved bulletin of `owner` holding `regions`, rated considerable.
pub fn create_test_bulletin(id: &str, owner: &str, regions: &[&str]) -> Bulletin {
    let mut bulletin: Bulletin = Bulletin::new(code(owner), Author::new("Alice"));
    bulletin.id = Some(bulletin_id(id));
    bulletin.regions.saved = regions.iter().map(|r| code(r)).collect();
    bulletin.forenoon.above.danger_rating = DangerRating::Considerable;
    bulletin.forenoon.above.avalanche_problems[0] =
        Some(complete_problem(DangerRating::Considerable));
    bulletin
}

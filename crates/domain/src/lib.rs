// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod bulletin;
mod danger;
mod dates;
mod error;
mod lock;
mod publication;
mod region;
mod status;
mod text;
mod validation;

#[cfg(test)]
mod tests;

pub use bulletin::{
    Author, AvalancheProblem, Bulletin, BulletinId, Daytime, DaytimeDescription,
    ElevationBand, ElevationDescription, MAX_AVALANCHE_PROBLEMS, MAX_ELEVATION, Validity,
    normalize_elevation,
};
pub use danger::{
    Aspect, AvalancheProblemType, AvalancheSize, DangerRating, Frequency, MatrixInformation,
    SnowpackStability,
};
pub use dates::{format_date, iso_date, parse_date};
pub use error::DomainError;
pub use lock::{BulletinLock, RegionLock};
pub use publication::{
    DEFAULT_TIMEZONE, FIRST_PUBLICATION_HOUR, LATE_PUBLICATION_HOUR, PublicationSchedule,
    shift_date,
};
pub use region::{RegionCode, RegionSets};
pub use status::{BulletinStatus, RegionDayStatus, day_is_editable};
pub use text::{LanguageCode, Text};
pub use validation::{
    CheckCode, check_avalanche_problems, check_day, count_incomplete_avalanche_problems,
    find_duplicate_regions,
};

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulletin and region status queries.

use albina_domain::{Bulletin, BulletinStatus, RegionCode, RegionDayStatus, format_date, parse_date};
use diesel::SqliteConnection;
use diesel::prelude::*;
use time::Date;
use tracing::debug;

use crate::diesel_schema::{bulletins, region_status};
use crate::error::PersistenceError;

/// Retrieves every stored bulletin of a day, ordered by owner region.
///
/// # Errors
///
/// Returns an error if the query fails or a stored bulletin cannot be
/// deserialized.
pub fn get_bulletins(
    conn: &mut SqliteConnection,
    date: Date,
) -> Result<Vec<Bulletin>, PersistenceError> {
    let rows: Vec<String> = bulletins::table
        .filter(bulletins::bulletin_date.eq(format_date(date)))
        .order((bulletins::owner_region.asc(), bulletins::bulletin_id.asc()))
        .select(bulletins::bulletin_json)
        .load(conn)?;

    debug!(date = %date, count = rows.len(), "Loaded bulletins");

    rows.iter()
        .map(|json| serde_json::from_str::<Bulletin>(json).map_err(PersistenceError::from))
        .collect()
}

/// Retrieves the workflow status of a region on a day.
///
/// A day without a stored status is `missing`.
///
/// # Errors
///
/// Returns an error if the query fails or the stored status is unknown.
pub fn get_region_status(
    conn: &mut SqliteConnection,
    region: &RegionCode,
    date: Date,
) -> Result<BulletinStatus, PersistenceError> {
    let stored: Option<String> = region_status::table
        .filter(region_status::region.eq(region.as_str()))
        .filter(region_status::status_date.eq(format_date(date)))
        .select(region_status::status)
        .first::<String>(conn)
        .optional()?;

    stored.map_or(Ok(BulletinStatus::Missing), |status| {
        status
            .parse::<BulletinStatus>()
            .map_err(|e| PersistenceError::corrupt("region_status", &e))
    })
}

/// Retrieves the stored statuses of a region in `[start, end]`, ascending.
///
/// Days without a stored status are not returned.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row cannot be parsed.
pub fn get_region_statuses(
    conn: &mut SqliteConnection,
    region: &RegionCode,
    start: Date,
    end: Date,
) -> Result<Vec<RegionDayStatus>, PersistenceError> {
    let rows: Vec<(String, String)> = region_status::table
        .filter(region_status::region.eq(region.as_str()))
        .filter(region_status::status_date.ge(format_date(start)))
        .filter(region_status::status_date.le(format_date(end)))
        .order(region_status::status_date.asc())
        .select((region_status::status_date, region_status::status))
        .load(conn)?;

    rows.into_iter()
        .map(|(date, status)| {
            Ok(RegionDayStatus {
                date: parse_date(&date).map_err(|e| PersistenceError::corrupt("region_status", &e))?,
                status: status
                    .parse::<BulletinStatus>()
                    .map_err(|e| PersistenceError::corrupt("region_status", &e))?,
            })
        })
        .collect()
}

/// Lists the regions that have a stored status on a day, ascending.
///
/// # Errors
///
/// Returns an error if the query fails or a stored region code is invalid.
pub fn list_regions_with_status(
    conn: &mut SqliteConnection,
    date: Date,
) -> Result<Vec<RegionCode>, PersistenceError> {
    let rows: Vec<String> = region_status::table
        .filter(region_status::status_date.eq(format_date(date)))
        .order(region_status::region.asc())
        .select(region_status::region)
        .load(conn)?;

    rows.iter()
        .map(|code| RegionCode::new(code).map_err(|e| PersistenceError::corrupt("region_status", &e)))
        .collect()
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulletin and region status persistence.
//!
//! A transition is written atomically: the region's status row, the full
//! set of bulletins of the day and the audit event either all land or none
//! does.

use albina::{DayState, TransitionResult};
use albina_domain::{Bulletin, BulletinId, BulletinStatus, RegionCode, format_date};
use diesel::SqliteConnection;
use diesel::prelude::*;
use time::Date;
use tracing::info;

use crate::diesel_schema::{bulletins, region_status};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;

/// Persists a transition result.
///
/// The day's bulletins are replaced by the bulletins of the new state, the
/// acting region's status row is upserted and the audit event is recorded.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `result` - The transition to persist
///
/// # Returns
///
/// The ID of the persisted audit event.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is written in that case.
pub fn persist_transition(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
) -> Result<i64, PersistenceError> {
    conn.transaction(|conn| {
        let state: &DayState = &result.new_state;
        replace_day_bulletins(conn, state.date, &state.bulletins)?;
        upsert_region_status(conn, &state.region, state.date, state.status)?;
        let event_id: i64 = persist_audit_event(conn, &result.audit_event)?;

        info!(
            event_id,
            region = %state.region,
            date = %state.date,
            status = %state.status,
            bulletins = state.bulletins.len(),
            "Persisted transition"
        );

        Ok(event_id)
    })
}

/// Sets the workflow status of a region on a day.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub fn upsert_region_status(
    conn: &mut SqliteConnection,
    region: &RegionCode,
    date: Date,
    status: BulletinStatus,
) -> Result<(), PersistenceError> {
    let date_str: String = format_date(date);

    diesel::insert_into(region_status::table)
        .values((
            region_status::region.eq(region.as_str()),
            region_status::status_date.eq(&date_str),
            region_status::status.eq(status.as_str()),
        ))
        .on_conflict((region_status::region, region_status::status_date))
        .do_update()
        .set((
            region_status::status.eq(status.as_str()),
            region_status::updated_at.eq(diesel::dsl::sql::<diesel::sql_types::Text>(
                "CURRENT_TIMESTAMP",
            )),
        ))
        .execute(conn)?;

    Ok(())
}

fn replace_day_bulletins(
    conn: &mut SqliteConnection,
    date: Date,
    day_bulletins: &[Bulletin],
) -> Result<(), PersistenceError> {
    let date_str: String = format_date(date);

    diesel::delete(bulletins::table)
        .filter(bulletins::bulletin_date.eq(&date_str))
        .execute(conn)?;

    for bulletin in day_bulletins {
        let id: &BulletinId = bulletin.id.as_ref().ok_or_else(|| {
            PersistenceError::MissingBulletinId {
                owner: bulletin.owner_region.to_string(),
                date: date_str.clone(),
            }
        })?;
        let bulletin_json: String = serde_json::to_string(bulletin)?;

        diesel::insert_into(bulletins::table)
            .values((
                bulletins::bulletin_id.eq(id.as_str()),
                bulletins::bulletin_date.eq(&date_str),
                bulletins::owner_region.eq(bulletin.owner_region.as_str()),
                bulletins::bulletin_json.eq(bulletin_json),
            ))
            .execute(conn)?;
    }

    Ok(())
}

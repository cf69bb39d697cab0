// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use albina_audit::{Action, Actor, AuditEvent, AuditScope, Cause, StateSnapshot};
use albina_domain::{RegionCode, format_date, parse_date};
use diesel::SqliteConnection;
use diesel::prelude::*;
use time::Date;

use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventRow {
    event_id: i64,
    region: String,
    event_date: String,
    actor_json: String,
    cause_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
}

impl AuditEventRow {
    fn into_event(self) -> Result<AuditEvent, PersistenceError> {
        let region: RegionCode = RegionCode::new(&self.region)
            .map_err(|e| PersistenceError::corrupt("audit_events", &e))?;
        let date: Date =
            parse_date(&self.event_date).map_err(|e| PersistenceError::corrupt("audit_events", &e))?;

        let actor: Actor = serde_json::from_str(&self.actor_json)?;
        let cause: Cause = serde_json::from_str(&self.cause_json)?;
        let action: Action = serde_json::from_str(&self.action_json)?;
        let before: StateSnapshot = serde_json::from_str(&self.before_snapshot_json)?;
        let after: StateSnapshot = serde_json::from_str(&self.after_snapshot_json)?;

        Ok(AuditEvent::new(
            AuditScope::new(region, date),
            actor,
            cause,
            action,
            before,
            after,
        )
        .with_event_id(self.event_id))
    }
}

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns `PersistenceError::EventNotFound` if no such event exists, or an
/// error if the stored event cannot be deserialized.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let row: AuditEventRow = match audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first::<AuditEventRow>(conn)
    {
        Ok(row) => row,
        Err(diesel::result::Error::NotFound) => {
            return Err(PersistenceError::EventNotFound(event_id));
        }
        Err(e) => return Err(PersistenceError::from(e)),
    };

    row.into_event()
}

/// Retrieves the audit events of a region's day, oldest first.
///
/// # Errors
///
/// Returns an error if events cannot be retrieved or deserialized.
pub fn get_audit_timeline(
    conn: &mut SqliteConnection,
    region: &RegionCode,
    date: Date,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::region.eq(region.as_str()))
        .filter(audit_events::event_date.eq(format_date(date)))
        .order(audit_events::event_id.asc())
        .select(AuditEventRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AuditEventRow::into_event).collect()
}

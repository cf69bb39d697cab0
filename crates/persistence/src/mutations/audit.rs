// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use albina_audit::AuditEvent;
use albina_domain::format_date;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::connection::last_insert_id;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Appends an audit event to the trail and returns its new identifier.
///
/// The event's parts are stored as JSON columns next to the region and day
/// they are queried by. Any `event_id` already on the event is ignored.
///
/// # Errors
///
/// Returns an error if the event cannot be encoded or inserted.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let actor_json: String = serde_json::to_string(&event.actor)?;
    let cause_json: String = serde_json::to_string(&event.cause)?;
    let action_json: String = serde_json::to_string(&event.action)?;
    let before_json: String = serde_json::to_string(&event.before)?;
    let after_json: String = serde_json::to_string(&event.after)?;

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::region.eq(event.scope.region.as_str()),
            audit_events::event_date.eq(format_date(event.scope.date)),
            audit_events::actor_json.eq(actor_json),
            audit_events::cause_json.eq(cause_json),
            audit_events::action_json.eq(action_json),
            audit_events::before_snapshot_json.eq(before_json),
            audit_events::after_snapshot_json.eq(after_json),
        ))
        .execute(conn)?;

    let event_id: i64 = last_insert_id(conn)?;

    debug!(
        event_id,
        region = %event.scope.region,
        date = %event.scope.date,
        action = %event.action.name,
        "Persisted audit event"
    );

    Ok(event_id)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Forecaster and session mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::connection::last_insert_id;
use crate::diesel_schema::{forecasters, sessions};
use crate::error::PersistenceError;

/// Creates a new forecaster.
///
/// Usernames are stored lowercase for case-insensitive uniqueness.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `username` - The login name (will be normalized)
/// * `display_name` - The name shown as bulletin author
/// * `password` - The plain-text password (will be hashed)
/// * `region` - The region the forecaster acts for
/// * `role` - One of `admin`, `forecaster`, `foreman`, `observer`
///
/// # Errors
///
/// Returns an error if the password cannot be hashed or the username
/// already exists.
pub fn create_forecaster(
    conn: &mut SqliteConnection,
    username: &str,
    display_name: &str,
    password: &str,
    region: &str,
    role: &str,
) -> Result<i64, PersistenceError> {
    let normalized: String = username.to_lowercase();

    info!(
        username = %normalized,
        region,
        role,
        "Creating forecaster"
    );

    let password_hash: String = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    diesel::insert_into(forecasters::table)
        .values((
            forecasters::username.eq(&normalized),
            forecasters::display_name.eq(display_name),
            forecasters::password_hash.eq(&password_hash),
            forecasters::region.eq(region),
            forecasters::role.eq(role),
        ))
        .execute(conn)?;

    let forecaster_id: i64 = last_insert_id(conn)?;

    info!(forecaster_id, "Forecaster created");
    Ok(forecaster_id)
}

/// Records a successful login.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_last_login(
    conn: &mut SqliteConnection,
    forecaster_id: i64,
) -> Result<(), PersistenceError> {
    debug!(forecaster_id, "Updating last_login_at");

    diesel::update(forecasters::table)
        .filter(forecasters::forecaster_id.eq(forecaster_id))
        .set(forecasters::last_login_at.eq(diesel::dsl::sql::<
            diesel::sql_types::Nullable<diesel::sql_types::Text>,
        >("CURRENT_TIMESTAMP")))
        .execute(conn)?;

    Ok(())
}

/// Disables a forecaster and drops their sessions.
///
/// # Errors
///
/// Returns `PersistenceError::ForecasterNotFound` if no such forecaster
/// exists, or an error if the database update fails.
pub fn disable_forecaster(
    conn: &mut SqliteConnection,
    forecaster_id: i64,
) -> Result<(), PersistenceError> {
    info!(forecaster_id, "Disabling forecaster");

    conn.transaction(|conn| {
        let rows_affected: usize = diesel::update(forecasters::table)
            .filter(forecasters::forecaster_id.eq(forecaster_id))
            .set(forecasters::is_disabled.eq(1))
            .execute(conn)?;

        if rows_affected == 0 {
            return Err(PersistenceError::ForecasterNotFound(format!(
                "Forecaster with ID {forecaster_id} not found"
            )));
        }

        diesel::delete(sessions::table)
            .filter(sessions::forecaster_id.eq(forecaster_id))
            .execute(conn)?;

        Ok(())
    })
}

/// Creates a new session.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The opaque bearer token
/// * `forecaster_id` - The forecaster the session belongs to
/// * `expires_at` - RFC 3339 expiry instant
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    forecaster_id: i64,
    expires_at: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::forecaster_id.eq(forecaster_id),
            sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    let session_id: i64 = last_insert_id(conn)?;

    debug!(session_id, forecaster_id, "Session created");
    Ok(session_id)
}

/// Updates the last activity timestamp of a session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_session_activity(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<(), PersistenceError> {
    diesel::update(sessions::table)
        .filter(sessions::session_id.eq(session_id))
        .set(
            sessions::last_activity_at.eq(diesel::dsl::sql::<diesel::sql_types::Text>(
                "CURRENT_TIMESTAMP",
            )),
        )
        .execute(conn)?;

    Ok(())
}

/// Deletes a session by token (logout).
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<(), PersistenceError> {
    debug!("Deleting session by token");

    diesel::delete(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .execute(conn)?;

    Ok(())
}

/// Deletes every session that expired before `now`.
///
/// Expiry instants are RFC 3339 UTC strings, so they order lexically.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(
    conn: &mut SqliteConnection,
    now: &str,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::expires_at.lt(now))
        .execute(conn)?;

    info!(rows_affected, "Deleted expired sessions");
    Ok(rows_affected)
}

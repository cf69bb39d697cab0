// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Forecaster and session queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::{ForecasterData, SessionData};
use crate::diesel_schema::{forecasters, sessions};
use crate::error::PersistenceError;

/// Diesel Queryable struct for forecaster rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = forecasters)]
struct ForecasterRow {
    forecaster_id: i64,
    username: String,
    display_name: String,
    password_hash: String,
    region: String,
    role: String,
    is_disabled: i32,
    created_at: String,
    last_login_at: Option<String>,
}

impl From<ForecasterRow> for ForecasterData {
    fn from(row: ForecasterRow) -> Self {
        Self {
            forecaster_id: row.forecaster_id,
            username: row.username,
            display_name: row.display_name,
            password_hash: row.password_hash,
            region: row.region,
            role: row.role,
            is_disabled: row.is_disabled != 0,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        }
    }
}

/// Diesel Queryable struct for session rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = sessions)]
struct SessionRow {
    session_id: i64,
    session_token: String,
    forecaster_id: i64,
    created_at: String,
    last_activity_at: String,
    expires_at: String,
}

/// Retrieves a forecaster by username (case-insensitive).
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the forecaster is not found.
pub fn get_forecaster_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<ForecasterData>, PersistenceError> {
    let normalized: String = username.to_lowercase();

    debug!(username = %normalized, "Looking up forecaster");

    Ok(forecasters::table
        .filter(forecasters::username.eq(&normalized))
        .select(ForecasterRow::as_select())
        .first(conn)
        .optional()?
        .map(ForecasterData::from))
}

/// Retrieves a forecaster by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the forecaster is not found.
pub fn get_forecaster_by_id(
    conn: &mut SqliteConnection,
    forecaster_id: i64,
) -> Result<Option<ForecasterData>, PersistenceError> {
    Ok(forecasters::table
        .filter(forecasters::forecaster_id.eq(forecaster_id))
        .select(ForecasterRow::as_select())
        .first(conn)
        .optional()?
        .map(ForecasterData::from))
}

/// Lists all forecasters ordered by username.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_forecasters(
    conn: &mut SqliteConnection,
) -> Result<Vec<ForecasterData>, PersistenceError> {
    let rows: Vec<ForecasterRow> = forecasters::table
        .order(forecasters::username.asc())
        .select(ForecasterRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(ForecasterData::from).collect())
}

/// Counts all forecasters.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_forecasters(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(forecasters::table.count().get_result(conn)?)
}

/// Retrieves a session by token.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the session is not found.
pub fn get_session_by_token(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<Option<SessionData>, PersistenceError> {
    debug!("Looking up session by token");

    Ok(sessions::table
        .filter(sessions::session_token.eq(session_token))
        .select(SessionRow::as_select())
        .first(conn)
        .optional()?
        .map(|row: SessionRow| SessionData {
            session_id: row.session_id,
            session_token: row.session_token,
            forecaster_id: row.forecaster_id,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            expires_at: row.expires_at,
        }))
}

/// Verifies a password against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    Ok(bcrypt::verify(password, password_hash)?)
}

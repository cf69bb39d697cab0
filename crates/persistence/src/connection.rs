// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Opening and configuring the bulletin database.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::path::Path;
use tracing::{debug, info};

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Milliseconds a writer waits for a competing lock before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Where the database lives.
pub enum Location<'a> {
    /// A shared-cache in-memory database private to one adapter.
    Memory(u64),
    /// A database file, opened in write-ahead logging mode.
    File(&'a Path),
}

impl Location<'_> {
    fn url(&self) -> Result<String, PersistenceError> {
        match self {
            Self::Memory(id) => Ok(format!("file:albina_mem_{id}?mode=memory&cache=shared")),
            Self::File(path) => path.to_str().map(str::to_string).ok_or_else(|| {
                PersistenceError::InvalidPath(format!(
                    "database path is not valid UTF-8: {}",
                    path.display()
                ))
            }),
        }
    }
}

#[derive(QueryableByName)]
struct ForeignKeysRow {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

#[derive(QueryableByName)]
struct JournalModeRow {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

/// Opens the database, configures the connection and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, a PRAGMA fails,
/// a migration fails, or foreign keys end up disabled.
pub fn open(location: &Location<'_>) -> Result<SqliteConnection, PersistenceError> {
    let url: String = location.url()?;
    info!(database = %url, "Opening bulletin database");

    let mut conn: SqliteConnection = SqliteConnection::establish(&url)?;
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut conn)?;
    diesel::sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")).execute(&mut conn)?;

    if let Location::File(_) = location {
        let mode: JournalModeRow =
            diesel::sql_query("PRAGMA journal_mode = WAL").get_result(&mut conn)?;
        debug!(journal_mode = %mode.journal_mode, "Journal mode set");
    }

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    if !applied.is_empty() {
        info!(applied = applied.len(), "Applied database migrations");
    }

    ensure_foreign_keys(&mut conn)?;
    Ok(conn)
}

/// Fails unless foreign key enforcement is on for this connection.
///
/// Sessions cascade with their forecaster only while it is.
///
/// # Errors
///
/// Returns `PersistenceError::ForeignKeyEnforcementNotEnabled` if it is off.
pub fn ensure_foreign_keys(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let row: ForeignKeysRow = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if row.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    Ok(())
}

/// Row ID assigned by the last insert on this connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_insert_id(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for collaborative bulletin authoring.
//!
//! Stores, in one `SQLite` database managed through Diesel:
//!
//! - the bulletins of every forecast day, as JSON documents
//! - the workflow status of every region on every day
//! - the audit events produced by workflow transitions
//! - forecaster accounts and login sessions
//!
//! Lock state is never stored here; locks are broadcast facts only.
//!
//! ## Testing
//!
//! Every test gets its own shared in-memory database via
//! [`Persistence::new_in_memory`], so tests never see each other's data.

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
#![allow(clippy::multiple_crate_versions)]

use albina::{DayState, TransitionResult};
use albina_audit::AuditEvent;
use albina_domain::{Bulletin, BulletinStatus, RegionCode, RegionDayStatus};
use connection::Location;
use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::Date;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod connection;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{ForecasterData, SessionData};
pub use error::PersistenceError;
pub use queries::verify_password;

/// Type alias used by the API and server layers.
pub type SqlitePersistence = Persistence;

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives its own database instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let conn: SqliteConnection = connection::open(&Location::Memory(db_id))?;
        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let conn: SqliteConnection = connection::open(&Location::File(path.as_ref()))?;
        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        connection::ensure_foreign_keys(&mut self.conn)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Persists a transition result: bulletins, status and audit event.
    ///
    /// # Returns
    ///
    /// The ID of the persisted audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails; nothing is written in that case.
    pub fn persist_transition(&mut self, result: &TransitionResult) -> Result<i64, PersistenceError> {
        mutations::persist_transition(&mut self.conn, result)
    }

    /// Persists a standalone audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::persist_audit_event(&mut self.conn, event)
    }

    /// Sets a region's status on a day without touching bulletins.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_region_status(
        &mut self,
        region: &RegionCode,
        date: Date,
        status: BulletinStatus,
    ) -> Result<(), PersistenceError> {
        mutations::upsert_region_status(&mut self.conn, region, date, status)
    }

    // ========================================================================
    // Bulletins & Status
    // ========================================================================

    /// Retrieves every bulletin of a day, ordered by owner region.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a bulletin cannot be decoded.
    pub fn get_bulletins(&mut self, date: Date) -> Result<Vec<Bulletin>, PersistenceError> {
        queries::get_bulletins(&mut self.conn, date)
    }

    /// Retrieves a region's status on a day (`missing` when never written).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_region_status(
        &mut self,
        region: &RegionCode,
        date: Date,
    ) -> Result<BulletinStatus, PersistenceError> {
        queries::get_region_status(&mut self.conn, region, date)
    }

    /// Retrieves the stored statuses of a region in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_region_statuses(
        &mut self,
        region: &RegionCode,
        start: Date,
        end: Date,
    ) -> Result<Vec<RegionDayStatus>, PersistenceError> {
        queries::get_region_statuses(&mut self.conn, region, start, end)
    }

    /// Loads the state of a region's day: its status plus every bulletin of the day.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_day_state(
        &mut self,
        region: &RegionCode,
        date: Date,
    ) -> Result<DayState, PersistenceError> {
        let mut state: DayState = DayState::new(region.clone(), date);
        state.status = queries::get_region_status(&mut self.conn, region, date)?;
        state.bulletins = queries::get_bulletins(&mut self.conn, date)?;
        Ok(state)
    }

    /// Loads the state of every region that has a stored status on a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_day_states(&mut self, date: Date) -> Result<Vec<DayState>, PersistenceError> {
        let regions: Vec<RegionCode> = queries::list_regions_with_status(&mut self.conn, date)?;
        let bulletins: Vec<Bulletin> = queries::get_bulletins(&mut self.conn, date)?;

        regions
            .into_iter()
            .map(|region| {
                let status: BulletinStatus =
                    queries::get_region_status(&mut self.conn, &region, date)?;
                let mut state: DayState = DayState::new(region, date);
                state.status = status;
                state.bulletins.clone_from(&bulletins);
                Ok(state)
            })
            .collect()
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not found or cannot be deserialized.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::get_audit_event(&mut self.conn, event_id)
    }

    /// Retrieves the audit events of a region's day, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if events cannot be retrieved or deserialized.
    pub fn get_audit_timeline(
        &mut self,
        region: &RegionCode,
        date: Date,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::get_audit_timeline(&mut self.conn, region, date)
    }

    // ========================================================================
    // Forecasters & Sessions
    // ========================================================================

    /// Creates a forecaster with a bcrypt-hashed password.
    ///
    /// # Errors
    ///
    /// Returns an error if the username exists or the write fails.
    pub fn create_forecaster(
        &mut self,
        username: &str,
        display_name: &str,
        password: &str,
        region: &str,
        role: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::create_forecaster(
            &mut self.conn,
            username,
            display_name,
            password,
            region,
            role,
        )
    }

    /// Retrieves a forecaster by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_forecaster_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<ForecasterData>, PersistenceError> {
        queries::get_forecaster_by_username(&mut self.conn, username)
    }

    /// Retrieves a forecaster by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_forecaster_by_id(
        &mut self,
        forecaster_id: i64,
    ) -> Result<Option<ForecasterData>, PersistenceError> {
        queries::get_forecaster_by_id(&mut self.conn, forecaster_id)
    }

    /// Lists all forecasters.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_forecasters(&mut self) -> Result<Vec<ForecasterData>, PersistenceError> {
        queries::list_forecasters(&mut self.conn)
    }

    /// Counts all forecasters.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_forecasters(&mut self) -> Result<i64, PersistenceError> {
        queries::count_forecasters(&mut self.conn)
    }

    /// Records a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_last_login(&mut self, forecaster_id: i64) -> Result<(), PersistenceError> {
        mutations::update_last_login(&mut self.conn, forecaster_id)
    }

    /// Disables a forecaster and drops their sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the forecaster does not exist or the update fails.
    pub fn disable_forecaster(&mut self, forecaster_id: i64) -> Result<(), PersistenceError> {
        mutations::disable_forecaster(&mut self.conn, forecaster_id)
    }

    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn create_session(
        &mut self,
        session_token: &str,
        forecaster_id: i64,
        expires_at: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::create_session(&mut self.conn, session_token, forecaster_id, expires_at)
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::get_session_by_token(&mut self.conn, session_token)
    }

    /// Updates the last activity timestamp of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_session_activity(&mut self, session_id: i64) -> Result<(), PersistenceError> {
        mutations::update_session_activity(&mut self.conn, session_id)
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::delete_session(&mut self.conn, session_token)
    }

    /// Deletes sessions that expired before `now` (RFC 3339).
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_expired_sessions(&mut self, now: &str) -> Result<usize, PersistenceError> {
        mutations::delete_expired_sessions(&mut self.conn, now)
    }
}

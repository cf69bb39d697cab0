// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use albina_domain::DomainError;
use diesel::result::DatabaseErrorKind;

/// Errors of the bulletin store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database could not be opened.
    ConnectionFailed(String),
    /// The database path is unusable.
    InvalidPath(String),
    /// A schema migration failed.
    MigrationFailed(String),
    /// Foreign key enforcement is off for the connection.
    ForeignKeyEnforcementNotEnabled,
    /// A unique, foreign key or check constraint rejected a write.
    ConstraintViolation(String),
    /// Any other database failure.
    Database(String),
    /// A stored JSON document could not be read or written.
    Serialization(String),
    /// A stored value could not be turned back into a domain value.
    CorruptRecord {
        /// The table the value came from.
        table: &'static str,
        /// What was wrong with it.
        message: String,
    },
    /// A bulletin without identifier was handed to the store.
    MissingBulletinId {
        /// Owner of the bulletin.
        owner: String,
        /// The forecast day.
        date: String,
    },
    /// Hashing or verifying a password failed.
    Credential(String),
    /// No audit event has this ID.
    EventNotFound(i64),
    /// No forecaster matches.
    ForecasterNotFound(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(msg) => write!(f, "Cannot open database: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid database path: {msg}"),
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::ConstraintViolation(msg) => write!(f, "Constraint violated: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Serialization(msg) => write!(f, "Cannot encode stored document: {msg}"),
            Self::CorruptRecord { table, message } => {
                write!(f, "Corrupt record in {table}: {message}")
            }
            Self::MissingBulletinId { owner, date } => {
                write!(f, "Bulletin of {owner} on {date} has no identifier")
            }
            Self::Credential(msg) => write!(f, "Password hashing failed: {msg}"),
            Self::EventNotFound(id) => write!(f, "Audit event {id} does not exist"),
            Self::ForecasterNotFound(msg) => write!(f, "Forecaster not found: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => Self::ConstraintViolation(info.message().to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for PersistenceError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Credential(err.to_string())
    }
}

impl PersistenceError {
    /// Wraps a domain parsing failure for a value read from `table`.
    pub(crate) fn corrupt(table: &'static str, err: &DomainError) -> Self {
        Self::CorruptRecord {
            table,
            message: err.to_string(),
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Region code is empty or contains invalid characters.
    InvalidRegionCode(String),
    /// Bulletin identifier is empty.
    InvalidBulletinId(String),
    /// A string value does not name a known enumeration member.
    UnknownValue {
        /// The kind of value that was being parsed (e.g. "aspect").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
    /// Bulletin status string is not recognized.
    InvalidBulletinStatus {
        /// The rejected status string.
        status: String,
    },
    /// A status transition is not permitted by the workflow.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was rejected.
        reason: String,
    },
    /// Avalanche problem slot index is out of range.
    InvalidProblemSlot {
        /// The rejected slot index.
        slot: usize,
    },
    /// The timezone name is not a known IANA timezone.
    InvalidTimezone(String),
    /// A wall-clock time does not exist in the configured timezone.
    NonexistentLocalTime {
        /// The date in question.
        date: time::Date,
        /// The hour that could not be resolved.
        hour: u32,
    },
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// Failed to parse date from string.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// One or more populated avalanche problems are incomplete.
    IncompleteAvalancheProblems {
        /// Number of incomplete problem slots.
        count: usize,
    },
    /// Lock event could not be encoded or decoded.
    LockEncoding(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRegionCode(code) => write!(f, "Invalid region code: '{code}'"),
            Self::InvalidBulletinId(id) => write!(f, "Invalid bulletin id: '{id}'"),
            Self::UnknownValue { kind, value } => write!(f, "Unknown {kind}: '{value}'"),
            Self::InvalidBulletinStatus { status } => {
                write!(f, "Invalid bulletin status: '{status}'")
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition from '{from}' to '{to}': {reason}")
            }
            Self::InvalidProblemSlot { slot } => {
                write!(f, "Invalid avalanche problem slot: {slot}")
            }
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: '{tz}'"),
            Self::NonexistentLocalTime { date, hour } => {
                write!(f, "Local time {hour:02}:00 on {date} does not exist")
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::IncompleteAvalancheProblems { count } => {
                write!(
                    f,
                    "{count} avalanche problem(s) are incomplete: aspects, problem type, danger rating and matrix are required"
                )
            }
            Self::LockEncoding(msg) => write!(f, "Lock event encoding failed: {msg}"),
        }
    }
}

impl std::error::Error for DomainError {}

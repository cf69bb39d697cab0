// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use albina::CoreError;
use albina_domain::{DomainError, RegionCode};
use albina_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// The forecaster is not bound to the requested region.
    RegionNotPermitted {
        /// The forecaster.
        username: String,
        /// The region named in the request.
        region: RegionCode,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::RegionNotPermitted { username, region } => {
                write!(f, "Forecaster '{username}' may not act for region {region}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// The actor is not bound to the requested region.
    RegionNotPermitted {
        /// The forecaster.
        username: String,
        /// The region named in the request.
        region: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// The request conflicts with bulletins of the day.
    Conflict {
        /// The check code of the conflict (e.g. `duplicateRegion`).
        rule: String,
        /// A human-readable description of the conflict.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::RegionNotPermitted { username, region } => {
                write!(f, "Forecaster '{username}' may not act for region {region}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::Conflict { rule, message } => write!(f, "Conflict ({rule}): {message}"),
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
            AuthError::RegionNotPermitted { username, region } => Self::RegionNotPermitted {
                username,
                region: region.to_string(),
            },
        }
    }
}

/// Translates a domain error into an API error.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidRegionCode(code) => ApiError::InvalidInput {
            field: String::from("region"),
            message: format!("Invalid region code: '{code}'"),
        },
        DomainError::InvalidBulletinId(id) => ApiError::InvalidInput {
            field: String::from("id"),
            message: format!("Invalid bulletin id: '{id}'"),
        },
        DomainError::UnknownValue { kind, value } => ApiError::InvalidInput {
            field: String::from(kind),
            message: format!("Unknown {kind}: '{value}'"),
        },
        DomainError::InvalidBulletinStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Unknown bulletin status: '{status}'"),
        },
        DomainError::InvalidStatusTransition { from, to, reason } => {
            ApiError::DomainRuleViolation {
                rule: String::from("status_transition"),
                message: format!("Cannot move from {from} to {to}: {reason}"),
            }
        }
        DomainError::InvalidProblemSlot { slot } => ApiError::InvalidInput {
            field: String::from("avalanche_problem"),
            message: format!("Avalanche problem slot {slot} does not exist"),
        },
        DomainError::InvalidTimezone(tz) => ApiError::Internal {
            message: format!("Configured timezone '{tz}' is invalid"),
        },
        DomainError::NonexistentLocalTime { date, hour } => ApiError::Internal {
            message: format!("{hour}:00 does not exist on {date} in the configured timezone"),
        },
        DomainError::DateArithmeticOverflow { operation } => ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("Date arithmetic overflow while {operation}"),
        },
        DomainError::DateParseError { date_string, error } => ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("Failed to parse date '{date_string}': {error}"),
        },
        DomainError::IncompleteAvalancheProblems { count } => ApiError::DomainRuleViolation {
            rule: String::from("incomplete_avalanche_problems"),
            message: format!("{count} avalanche problem(s) are incomplete"),
        },
        DomainError::LockEncoding(msg) => ApiError::InvalidInput {
            field: String::from("lock"),
            message: msg,
        },
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::WriteDisabled { .. } => ApiError::DomainRuleViolation {
            rule: String::from("write_disabled"),
            message: err.to_string(),
        },
        CoreError::PublicationGateClosed { .. } => ApiError::DomainRuleViolation {
            rule: String::from("publication_gate"),
            message: err.to_string(),
        },
        CoreError::DuplicateRegions { .. } => ApiError::Conflict {
            rule: String::from("duplicateRegion"),
            message: err.to_string(),
        },
        CoreError::IncompleteAvalancheProblems { .. } => ApiError::DomainRuleViolation {
            rule: String::from("incomplete_avalanche_problems"),
            message: err.to_string(),
        },
        CoreError::NoRegionSelected { .. } => ApiError::InvalidInput {
            field: String::from("regions"),
            message: err.to_string(),
        },
        CoreError::InvalidTransition { .. } => ApiError::DomainRuleViolation {
            rule: String::from("status_transition"),
            message: err.to_string(),
        },
        CoreError::MissingBulletinId => ApiError::Internal {
            message: err.to_string(),
        },
        CoreError::UnknownBulletinIndex { .. } | CoreError::DependentHalfNotEditable { .. } => {
            ApiError::InvalidInput {
                field: String::from("bulletin"),
                message: err.to_string(),
            }
        }
        CoreError::BulletinNotFound { .. } => ApiError::ResourceNotFound {
            resource_type: String::from("Bulletin"),
            message: err.to_string(),
        },
        CoreError::NotBulletinOwner { .. } => ApiError::DomainRuleViolation {
            rule: String::from("bulletin_owner"),
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::EventNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Audit event"),
            message: format!("Audit event {id} does not exist"),
        },
        PersistenceError::ForecasterNotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Forecaster"),
            message: msg,
        },
        PersistenceError::ConstraintViolation(msg) => ApiError::Conflict {
            rule: String::from("storeConstraint"),
            message: msg,
        },
        _ => ApiError::Internal {
            message: format!("Persistence error: {err}"),
        },
    }
}

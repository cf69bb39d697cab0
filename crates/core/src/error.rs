// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use albina_domain::{BulletinId, BulletinStatus, DomainError, RegionCode};
use time::Date;

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The day is submitted or published; bulletins cannot be changed.
    WriteDisabled {
        /// The acting region.
        region: RegionCode,
        /// The forecast day.
        date: Date,
        /// The day's current status.
        status: BulletinStatus,
    },
    /// The publication gate for the day has not passed yet.
    PublicationGateClosed {
        /// The forecast day.
        date: Date,
        /// The day's current status.
        status: BulletinStatus,
    },
    /// Micro-regions are held by more than one bulletin of the acting region.
    DuplicateRegions {
        /// The duplicated regions.
        regions: Vec<RegionCode>,
    },
    /// Populated avalanche problems are incomplete.
    IncompleteAvalancheProblems {
        /// Number of incomplete problems.
        count: usize,
    },
    /// A bulletin created by the acting region holds none of its regions.
    NoRegionSelected {
        /// The offending bulletin, `None` if it was never saved.
        bulletin: Option<BulletinId>,
    },
    /// The requested workflow action is not possible in the day's status.
    InvalidTransition {
        /// The day's current status.
        from: BulletinStatus,
        /// The attempted action.
        action: String,
    },
    /// A bulletin handed to a transition has no identifier.
    MissingBulletinId,
    /// A bulletin position does not exist in the working set.
    UnknownBulletinIndex {
        /// The rejected position.
        index: usize,
    },
    /// The referenced bulletin does not exist for the day.
    BulletinNotFound {
        /// The missing bulletin.
        bulletin: BulletinId,
    },
    /// A mirrored half was edited while its dependency flag is off.
    DependentHalfNotEditable {
        /// The half that was targeted (e.g. "afternoon below").
        half: &'static str,
    },
    /// The acting region did not create the bulletin.
    NotBulletinOwner {
        /// The bulletin.
        bulletin: BulletinId,
        /// The acting region.
        region: RegionCode,
    },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::WriteDisabled {
                region,
                date,
                status,
            } => write!(
                f,
                "Bulletins of {region} for {date} are {status} and cannot be changed"
            ),
            Self::PublicationGateClosed { date, status } => write!(
                f,
                "Bulletins for {date} ({status}) cannot be published before the publication time"
            ),
            Self::DuplicateRegions { regions } => {
                let list: Vec<&str> = regions.iter().map(RegionCode::as_str).collect();
                write!(
                    f,
                    "Regions are part of more than one bulletin: {}",
                    list.join(", ")
                )
            }
            Self::IncompleteAvalancheProblems { count } => {
                write!(f, "{count} avalanche problem(s) are incomplete")
            }
            Self::NoRegionSelected {
                bulletin: Some(bulletin),
            } => write!(f, "Bulletin {bulletin} has no region selected"),
            Self::NoRegionSelected { bulletin: None } => {
                write!(f, "New bulletin has no region selected")
            }
            Self::InvalidTransition { from, action } => {
                write!(f, "Cannot {action} bulletins in status '{from}'")
            }
            Self::MissingBulletinId => write!(f, "Bulletin has no identifier"),
            Self::UnknownBulletinIndex { index } => {
                write!(f, "No bulletin at position {index}")
            }
            Self::BulletinNotFound { bulletin } => write!(f, "Bulletin {bulletin} not found"),
            Self::DependentHalfNotEditable { half } => {
                write!(f, "The {half} half mirrors its source and cannot be edited")
            }
            Self::NotBulletinOwner { bulletin, region } => {
                write!(f, "Bulletin {bulletin} was not created by {region}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::IncompleteAvalancheProblems { count } => {
                Self::IncompleteAvalancheProblems { count }
            }
            other => Self::DomainViolation(other),
        }
    }
}

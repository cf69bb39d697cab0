// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulletin status workflow.
//!
//! Status is tracked per region and per forecast day. The lifecycle is:
//!
//! ```text
//! missing -> draft -> submitted -> published
//!              ^                      |
//!              |       (update)       v
//!           updated <-----------------+
//!              |
//!              v
//!         resubmitted -> republished
//! ```
//!
//! No transition skips `submitted` / `resubmitted`. Status is never advanced
//! by time alone; the publication gates only decide whether an explicit
//! publish is accepted.

use crate::dates::iso_date;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;

/// Workflow status of a region's bulletins for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletinStatus {
    /// Nothing has been saved for the day.
    #[default]
    Missing,
    /// Saved at least once, never submitted.
    Draft,
    /// Reopened after a submission or publication.
    Updated,
    /// Submitted for the first publication.
    Submitted,
    /// Submitted again after an update.
    Resubmitted,
    /// Published at the regular 5PM publication.
    Published,
    /// Published again after an update.
    Republished,
}

impl BulletinStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Draft => "draft",
            Self::Updated => "updated",
            Self::Submitted => "submitted",
            Self::Resubmitted => "resubmitted",
            Self::Published => "published",
            Self::Republished => "republished",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBulletinStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "missing" => Ok(Self::Missing),
            "draft" => Ok(Self::Draft),
            "updated" => Ok(Self::Updated),
            "submitted" => Ok(Self::Submitted),
            "resubmitted" => Ok(Self::Resubmitted),
            "published" => Ok(Self::Published),
            "republished" => Ok(Self::Republished),
            _ => Err(DomainError::InvalidBulletinStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if bulletins of the day must not be created, changed or deleted.
    #[must_use]
    pub const fn is_write_disabled(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Resubmitted | Self::Published | Self::Republished
        )
    }

    /// Returns true for the two states in which content is edited freely.
    #[must_use]
    pub const fn is_editable_draft(&self) -> bool {
        matches!(self, Self::Draft | Self::Updated)
    }

    /// Returns true once the day has gone through a publication.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published | Self::Republished)
    }

    /// Status reached by an explicit submit, if submitting is allowed.
    #[must_use]
    pub const fn submission_target(&self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Submitted),
            Self::Updated => Some(Self::Resubmitted),
            Self::Missing
            | Self::Submitted
            | Self::Resubmitted
            | Self::Published
            | Self::Republished => None,
        }
    }

    /// Status reached by an explicit publish, if publishing is allowed.
    #[must_use]
    pub const fn publication_target(&self) -> Option<Self> {
        match self {
            Self::Submitted => Some(Self::Published),
            Self::Resubmitted => Some(Self::Republished),
            Self::Missing
            | Self::Draft
            | Self::Updated
            | Self::Published
            | Self::Republished => None,
        }
    }

    /// Returns true if an explicit update may reopen the day.
    #[must_use]
    pub const fn can_start_update(&self) -> bool {
        matches!(
            self,
            Self::Missing
                | Self::Submitted
                | Self::Resubmitted
                | Self::Published
                | Self::Republished
        )
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        let valid: bool = match new_status {
            Self::Missing => false,
            Self::Draft => matches!(self, Self::Missing | Self::Draft),
            Self::Updated => self.can_start_update() || matches!(self, Self::Updated),
            Self::Submitted | Self::Resubmitted => self.submission_target() == Some(new_status),
            Self::Published | Self::Republished => self.publication_target() == Some(new_status),
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by status lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for BulletinStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for BulletinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if the region's bulletins for a day may be edited.
///
/// A missing day stays editable only until the 5PM publication of the
/// previous day has happened; draft and updated days are always editable.
///
/// # Arguments
///
/// * `status` - The day's current status
/// * `published_5pm` - Whether the regular publication for the day has passed
#[must_use]
pub const fn day_is_editable(status: BulletinStatus, published_5pm: bool) -> bool {
    (matches!(status, BulletinStatus::Missing) && !published_5pm) || status.is_editable_draft()
}

/// Status of one region on one day, as listed by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDayStatus {
    /// The forecast day.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The day's status.
    pub status: BulletinStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_targets() {
        assert_eq!(
            BulletinStatus::Draft.submission_target(),
            Some(BulletinStatus::Submitted)
        );
        assert_eq!(
            BulletinStatus::Updated.submission_target(),
            Some(BulletinStatus::Resubmitted)
        );
        assert_eq!(BulletinStatus::Submitted.submission_target(), None);
        assert_eq!(BulletinStatus::Missing.submission_target(), None);
    }

    #[test]
    fn test_publication_never_skips_submission() {
        assert!(
            BulletinStatus::Draft
                .validate_transition(BulletinStatus::Published)
                .is_err()
        );
        assert!(
            BulletinStatus::Updated
                .validate_transition(BulletinStatus::Republished)
                .is_err()
        );
        assert!(
            BulletinStatus::Resubmitted
                .validate_transition(BulletinStatus::Republished)
                .is_ok()
        );
    }

    #[test]
    fn test_update_reopens_submitted_and_published_days() {
        for status in [
            BulletinStatus::Submitted,
            BulletinStatus::Resubmitted,
            BulletinStatus::Published,
            BulletinStatus::Republished,
        ] {
            assert!(status.validate_transition(BulletinStatus::Updated).is_ok());
        }
        assert!(
            BulletinStatus::Draft
                .validate_transition(BulletinStatus::Updated)
                .is_err()
        );
    }

    #[test]
    fn test_write_disabled_states() {
        assert!(BulletinStatus::Submitted.is_write_disabled());
        assert!(BulletinStatus::Republished.is_write_disabled());
        assert!(!BulletinStatus::Updated.is_write_disabled());
        assert!(!BulletinStatus::Missing.is_write_disabled());
    }

    #[test]
    fn test_missing_day_locks_after_5pm() {
        assert!(day_is_editable(BulletinStatus::Missing, false));
        assert!(!day_is_editable(BulletinStatus::Missing, true));
        assert!(day_is_editable(BulletinStatus::Updated, true));
        assert!(!day_is_editable(BulletinStatus::Published, false));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!(
            "resubmitted".parse::<BulletinStatus>().unwrap(),
            BulletinStatus::Resubmitted
        );
        assert!(matches!(
            "archived".parse::<BulletinStatus>(),
            Err(DomainError::InvalidBulletinStatus { .. })
        ));
    }
}

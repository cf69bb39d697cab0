// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Publication schedule.
//!
//! Bulletins for a forecast day are published twice at most:
//!
//! - the regular publication at 17:00 local time on the previous day
//! - the late publication at 08:00 local time on the day itself
//!
//! A day submitted for the first time may only be published once the 5PM
//! gate has passed. A resubmitted day may only be published once the 8AM
//! gate has passed. Wall-clock times are resolved in the schedule's IANA
//! timezone and compared as instants.

use crate::error::DomainError;
use crate::status::BulletinStatus;
use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use time::{Date, Duration, OffsetDateTime};

/// Local hour of the regular publication, on the day before the forecast day.
pub const FIRST_PUBLICATION_HOUR: u32 = 17;

/// Local hour of the late publication, on the forecast day.
pub const LATE_PUBLICATION_HOUR: u32 = 8;

/// Default timezone of the publication schedule.
pub const DEFAULT_TIMEZONE: &str = "Europe/Vienna";

/// The publication gates of a server, in its local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationSchedule {
    timezone: Tz,
}

impl Default for PublicationSchedule {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Vienna,
        }
    }
}

impl PublicationSchedule {
    /// Creates a schedule for the given IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimezone` if the name is unknown.
    pub fn new(timezone: &str) -> Result<Self, DomainError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| DomainError::InvalidTimezone(timezone.to_string()))?;
        Ok(Self { timezone: tz })
    }

    /// Returns the IANA name of the schedule's timezone.
    #[must_use]
    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }

    /// Instant of the regular publication for `date` (17:00 the day before).
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn first_publication_at(&self, date: Date) -> Result<OffsetDateTime, DomainError> {
        let previous: Date =
            date.previous_day()
                .ok_or_else(|| DomainError::DateArithmeticOverflow {
                    operation: format!("computing the day before {date}"),
                })?;
        self.local_instant(previous, FIRST_PUBLICATION_HOUR)
    }

    /// Instant of the late publication for `date` (08:00 the same day).
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn late_publication_at(&self, date: Date) -> Result<OffsetDateTime, DomainError> {
        self.local_instant(date, LATE_PUBLICATION_HOUR)
    }

    /// Returns true once the regular publication for `date` has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn has_been_published_5pm(
        &self,
        date: Date,
        now: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        Ok(now >= self.first_publication_at(date)?)
    }

    /// Returns true once the late publication for `date` has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn has_been_published_8am(
        &self,
        date: Date,
        now: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        Ok(now >= self.late_publication_at(date)?)
    }

    /// Returns true if an explicit publish of a day in `status` is accepted at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn is_gate_open(
        &self,
        date: Date,
        status: BulletinStatus,
        now: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        match status {
            BulletinStatus::Submitted => self.has_been_published_5pm(date, now),
            BulletinStatus::Resubmitted => self.has_been_published_8am(date, now),
            _ => Ok(false),
        }
    }

    /// The submitted day will go out with the regular 5PM publication.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn publication_happens_at_5pm(
        &self,
        date: Date,
        status: BulletinStatus,
        now: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        Ok(status == BulletinStatus::Submitted && !self.has_been_published_5pm(date, now)?)
    }

    /// The submitted day will go out with the late 8AM publication.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn publication_happens_at_8am(
        &self,
        date: Date,
        status: BulletinStatus,
        now: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        Ok(
            matches!(status, BulletinStatus::Submitted | BulletinStatus::Resubmitted)
                && !self.has_been_published_8am(date, now)?
                && !self.publication_happens_at_5pm(date, status, now)?,
        )
    }

    /// A submitted day missed both publications.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved.
    pub fn no_publication_will_happen(
        &self,
        date: Date,
        status: BulletinStatus,
        now: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        Ok(
            matches!(status, BulletinStatus::Submitted | BulletinStatus::Resubmitted)
                && self.has_been_published_8am(date, now)?,
        )
    }

    fn local_instant(&self, date: Date, hour: u32) -> Result<OffsetDateTime, DomainError> {
        let naive_date: NaiveDate = NaiveDate::from_ymd_opt(
            date.year(),
            u32::from(u8::from(date.month())),
            u32::from(date.day()),
        )
        .ok_or(DomainError::NonexistentLocalTime { date, hour })?;
        let naive_time: NaiveTime =
            NaiveTime::from_hms_opt(hour, 0, 0).ok_or(DomainError::NonexistentLocalTime { date, hour })?;

        let local = self
            .timezone
            .from_local_datetime(&naive_date.and_time(naive_time))
            .single()
            .ok_or(DomainError::NonexistentLocalTime { date, hour })?;

        OffsetDateTime::from_unix_timestamp(local.timestamp()).map_err(|e| {
            DomainError::DateArithmeticOverflow {
                operation: format!("converting {date} {hour:02}:00 to an instant: {e}"),
            }
        })
    }
}

/// Returns `date` shifted by `days`, used when carrying bulletins across days.
///
/// # Errors
///
/// Returns `DomainError::DateArithmeticOverflow` if the result is out of range.
pub fn shift_date(date: Date, days: i64) -> Result<Date, DomainError> {
    date.checked_add(Duration::days(days))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("shifting {date} by {days} day(s)"),
        })
}

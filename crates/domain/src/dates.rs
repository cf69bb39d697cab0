// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Calendar date helpers.
//!
//! Forecast days travel as `YYYY-MM-DD` strings in query parameters,
//! lock events and status maps.

use crate::error::DomainError;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value.trim(), DATE_FORMAT).map_err(|e| DomainError::DateParseError {
        date_string: value.to_string(),
        error: e.to_string(),
    })
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    // The format only contains date components, so formatting a `Date` cannot fail.
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// Serde adapter that writes a `time::Date` as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::Date;

    /// Serializes a date as `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    /// Deserializes a `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error if the string is not a valid date.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw: String = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_parse_and_format_date() {
        let parsed: Date = parse_date("2026-01-15").unwrap();
        assert_eq!(parsed, date!(2026 - 01 - 15));
        assert_eq!(format_date(parsed), "2026-01-15");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let result = parse_date("15.01.2026");
        assert!(matches!(result, Err(DomainError::DateParseError { .. })));
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Known workflow statuses per region and day.

use albina_domain::{BulletinStatus, RegionCode, RegionDayStatus};
use std::collections::{BTreeMap, HashMap};
use time::Date;

/// The client's view of region statuses.
///
/// A day without a known status is `missing`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRepository {
    statuses: HashMap<RegionCode, BTreeMap<Date, BulletinStatus>>,
}

impl StatusRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The status of `region` on `date`.
    #[must_use]
    pub fn get(&self, region: &RegionCode, date: Date) -> BulletinStatus {
        self.statuses
            .get(region)
            .and_then(|days| days.get(&date))
            .copied()
            .unwrap_or_default()
    }

    /// Records the status of `region` on `date`.
    pub fn set(&mut self, region: &RegionCode, date: Date, status: BulletinStatus) {
        self.statuses
            .entry(region.clone())
            .or_default()
            .insert(date, status);
    }

    /// Replaces the statuses of `region` between two days with a server listing.
    ///
    /// Days of the range the listing does not mention become `missing`.
    pub fn replace_range(
        &mut self,
        region: &RegionCode,
        start: Date,
        end: Date,
        listing: &[RegionDayStatus],
    ) {
        let days: &mut BTreeMap<Date, BulletinStatus> =
            self.statuses.entry(region.clone()).or_default();
        days.retain(|date, _| *date < start || *date > end);
        for entry in listing {
            days.insert(entry.date, entry.status);
        }
    }

    /// Returns true if bulletins of `region` on `date` must not change.
    #[must_use]
    pub fn is_write_disabled(&self, region: &RegionCode, date: Date) -> bool {
        self.get(region, date).is_write_disabled()
    }
}

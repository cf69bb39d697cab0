// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Registry of advisory locks.
//!
//! The registry is a cache of broadcast facts. It changes only through
//! lock events (local or received) and through an explicit resync from the
//! server's list of locked dates. Nothing here blocks a writer.

use albina_domain::{BulletinId, BulletinLock, RegionCode, RegionLock};
use std::collections::{BTreeMap, BTreeSet};
use time::Date;
use tracing::{debug, warn};

/// A user editing a bulletin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletinHolder {
    /// The editing user.
    pub username: String,
    /// The forecast day of the bulletin.
    pub date: Date,
}

/// Region-per-date and bulletin locks known to one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockRegistry {
    // An empty holder set means the date was reported locked by the server
    // without a known holder.
    regions: BTreeMap<RegionCode, BTreeMap<Date, BTreeSet<String>>>,
    bulletins: BTreeMap<BulletinId, Vec<BulletinHolder>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: BTreeMap::new(),
            bulletins: BTreeMap::new(),
        }
    }

    /// Applies a region lock event.
    ///
    /// Returns true if the registry changed.
    pub fn apply_region_event(&mut self, event: &RegionLock) -> bool {
        debug!(
            region = %event.region,
            date = %event.date,
            username = %event.username,
            lock = event.lock,
            "Region lock event"
        );

        if event.lock {
            let holders: &mut BTreeSet<String> = self
                .regions
                .entry(event.region.clone())
                .or_default()
                .entry(event.date)
                .or_default();
            if !holders.insert(event.username.clone()) {
                warn!(
                    region = %event.region,
                    date = %event.date,
                    username = %event.username,
                    "Region already locked by this user"
                );
                return false;
            }
            return true;
        }

        let Some(dates) = self.regions.get_mut(&event.region) else {
            warn!(region = %event.region, date = %event.date, "Unlock for region without locks");
            return false;
        };
        let Some(holders) = dates.get_mut(&event.date) else {
            warn!(region = %event.region, date = %event.date, "Unlock for date that is not locked");
            return false;
        };
        // A server-reported lock has no known holder; any unlock clears it.
        if !holders.remove(&event.username) && !holders.is_empty() {
            warn!(
                region = %event.region,
                date = %event.date,
                username = %event.username,
                "Unlock from a user that does not hold the region"
            );
            return false;
        }
        if holders.is_empty() {
            dates.remove(&event.date);
        }
        if dates.is_empty() {
            self.regions.remove(&event.region);
        }
        true
    }

    /// Applies a bulletin lock event.
    ///
    /// A lock from a second user is added next to the existing holder;
    /// nothing is evicted. Returns true if the registry changed.
    pub fn apply_bulletin_event(&mut self, event: &BulletinLock) -> bool {
        debug!(
            bulletin = %event.bulletin,
            username = %event.username,
            lock = event.lock,
            "Bulletin lock event"
        );

        if event.lock {
            let holders: &mut Vec<BulletinHolder> =
                self.bulletins.entry(event.bulletin.clone()).or_default();
            if holders.iter().any(|h| h.username == event.username) {
                warn!(
                    bulletin = %event.bulletin,
                    username = %event.username,
                    "Bulletin already locked by this user"
                );
                return false;
            }
            holders.push(BulletinHolder {
                username: event.username.clone(),
                date: event.date,
            });
            return true;
        }

        let Some(holders) = self.bulletins.get_mut(&event.bulletin) else {
            warn!(bulletin = %event.bulletin, "Unlock for bulletin that is not locked");
            return false;
        };
        let before: usize = holders.len();
        holders.retain(|h| h.username != event.username);
        let changed: bool = holders.len() != before;
        if !changed {
            warn!(
                bulletin = %event.bulletin,
                username = %event.username,
                "Unlock from a user that does not hold the bulletin"
            );
        }
        if holders.is_empty() {
            self.bulletins.remove(&event.bulletin);
        }
        changed
    }

    /// Dates on which `region` is locked, ascending.
    #[must_use]
    pub fn locked_dates(&self, region: &RegionCode) -> Vec<Date> {
        self.regions
            .get(region)
            .map(|dates| dates.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Returns true if someone other than `me` holds the region on `date`.
    ///
    /// A lock reported by the server without a holder counts as foreign.
    #[must_use]
    pub fn is_region_locked_by_other(&self, region: &RegionCode, date: Date, me: &str) -> bool {
        self.regions
            .get(region)
            .and_then(|dates| dates.get(&date))
            .is_some_and(|holders| holders.is_empty() || holders.iter().any(|h| h != me))
    }

    /// Users currently editing `bulletin`, in the order they started.
    #[must_use]
    pub fn bulletin_holders(&self, bulletin: &BulletinId) -> Vec<&str> {
        self.bulletins
            .get(bulletin)
            .map(|holders| holders.iter().map(|h| h.username.as_str()).collect())
            .unwrap_or_default()
    }

    /// Returns true if someone other than `me` is editing `bulletin`.
    #[must_use]
    pub fn is_bulletin_locked_by_other(&self, bulletin: &BulletinId, me: &str) -> bool {
        self.bulletins
            .get(bulletin)
            .is_some_and(|holders| holders.iter().any(|h| h.username != me))
    }

    /// Lock events for every lock `username` holds.
    #[must_use]
    pub fn held_by(&self, username: &str) -> (Vec<RegionLock>, Vec<BulletinLock>) {
        let regions: Vec<RegionLock> = self
            .regions
            .iter()
            .flat_map(|(region, dates)| {
                dates
                    .iter()
                    .filter(|(_, holders)| holders.contains(username))
                    .map(|(date, _)| RegionLock {
                        region: region.clone(),
                        date: *date,
                        username: username.to_string(),
                        lock: true,
                    })
            })
            .collect();

        let bulletins: Vec<BulletinLock> = self
            .bulletins
            .iter()
            .flat_map(|(bulletin, holders)| {
                holders
                    .iter()
                    .filter(|h| h.username == username)
                    .map(|h| BulletinLock {
                        bulletin: bulletin.clone(),
                        date: h.date,
                        username: username.to_string(),
                        lock: true,
                    })
            })
            .collect();

        (regions, bulletins)
    }

    /// Removes every lock `username` holds and returns the matching unlock events.
    pub fn release_user(&mut self, username: &str) -> (Vec<RegionLock>, Vec<BulletinLock>) {
        let (regions, bulletins): (Vec<RegionLock>, Vec<BulletinLock>) = self.held_by(username);
        let region_unlocks: Vec<RegionLock> = regions.iter().map(RegionLock::released).collect();
        let bulletin_unlocks: Vec<BulletinLock> =
            bulletins.iter().map(BulletinLock::released).collect();

        for event in &region_unlocks {
            self.apply_region_event(event);
        }
        for event in &bulletin_unlocks {
            self.apply_bulletin_event(event);
        }

        (region_unlocks, bulletin_unlocks)
    }

    /// Replaces the locked dates of `region` with the server's view.
    ///
    /// Dates no longer reported are dropped together with their holders.
    /// Newly reported dates are added without a known holder.
    pub fn resync_region(&mut self, region: &RegionCode, dates: &[Date]) {
        let reported: BTreeSet<Date> = dates.iter().copied().collect();
        let entry: &mut BTreeMap<Date, BTreeSet<String>> =
            self.regions.entry(region.clone()).or_default();
        entry.retain(|date, _| reported.contains(date));
        for date in reported {
            entry.entry(date).or_default();
        }
        if entry.is_empty() {
            self.regions.remove(region);
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Federation merge.
//!
//! A working set holds the bulletins of one day from two sources:
//!
//! - internal: the own server, covering the own region and its neighbours
//! - external: every peer server, kept apart per server
//!
//! Each refresh replaces the bulletins of its source (last writer wins at
//! bulletin granularity). The only exception is the bulletin being edited
//! locally, which survives a refresh unless it is disabled for editing.

use crate::error::CoreError;
use albina_domain::{Bulletin, BulletinId, RegionCode, Validity};
use std::collections::BTreeMap;
use time::Date;

/// The locally edited bulletin, as seen by a merge.
#[derive(Debug, Clone, Copy)]
pub struct ActiveBulletin<'a> {
    /// The local working copy.
    pub bulletin: &'a Bulletin,
    /// The copy is read-only (write-disabled day or foreign lock).
    pub disabled: bool,
}

/// The merged bulletins of one forecast day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingSet {
    date: Date,
    internal: Vec<Bulletin>,
    external: BTreeMap<String, Vec<Bulletin>>,
    daytime_dependent: bool,
}

impl WorkingSet {
    /// Creates an empty working set for `date`.
    #[must_use]
    pub const fn new(date: Date) -> Self {
        Self {
            date,
            internal: Vec::new(),
            external: BTreeMap::new(),
            daytime_dependent: false,
        }
    }

    /// The forecast day of this working set.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Returns true if any bulletin of the day is split by daytime.
    #[must_use]
    pub const fn is_daytime_dependent(&self) -> bool {
        self.daytime_dependent
    }

    /// Bulletins of the own server, sorted by owner region.
    #[must_use]
    pub fn internal(&self) -> &[Bulletin] {
        &self.internal
    }

    /// Bulletins of one peer server, sorted by owner region.
    #[must_use]
    pub fn external(&self, server: &str) -> &[Bulletin] {
        self.external
            .get(server)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Names of the peer servers that delivered bulletins.
    pub fn external_servers(&self) -> impl Iterator<Item = &str> {
        self.external.keys().map(String::as_str)
    }

    /// Every bulletin of the day, sorted by owner region.
    #[must_use]
    pub fn all(&self) -> Vec<&Bulletin> {
        let mut all: Vec<&Bulletin> = self
            .internal
            .iter()
            .chain(self.external.values().flatten())
            .collect();
        all.sort_by(|a, b| a.owner_region.cmp(&b.owner_region));
        all
    }

    /// Looks up an internal bulletin by identifier.
    #[must_use]
    pub fn find(&self, id: &BulletinId) -> Option<&Bulletin> {
        self.internal.iter().find(|b| b.id.as_ref() == Some(id))
    }

    /// Replaces the internal bulletins with a refresh from the own server.
    ///
    /// If `active` is editable, it replaces the incoming bulletin with the
    /// same identifier, or is kept as an additional bulletin when the
    /// refresh does not contain it.
    pub fn merge_internal(&mut self, incoming: Vec<Bulletin>, active: Option<ActiveBulletin<'_>>) {
        let mut merged: Vec<Bulletin> = incoming;

        if let Some(active) = active.filter(|a| !a.disabled) {
            let position: Option<usize> = active
                .bulletin
                .id
                .as_ref()
                .and_then(|id| merged.iter().position(|b| b.id.as_ref() == Some(id)));
            match position {
                Some(index) => merged[index] = active.bulletin.clone(),
                None => merged.push(active.bulletin.clone()),
            }
        }

        sort_by_owner(&mut merged);
        self.internal = merged;
        self.refresh_daytime_flag();
    }

    /// Replaces the bulletins of one peer server.
    pub fn merge_external(&mut self, server: &str, incoming: Vec<Bulletin>) {
        let mut merged: Vec<Bulletin> = incoming;
        sort_by_owner(&mut merged);
        self.external.insert(server.to_string(), merged);
        self.refresh_daytime_flag();
    }

    /// Drops the bulletins of a peer server.
    pub fn remove_external(&mut self, server: &str) {
        self.external.remove(server);
        self.refresh_daytime_flag();
    }

    /// Inserts or replaces a local bulletin.
    ///
    /// A bulletin without identifier is always appended.
    pub fn upsert(&mut self, bulletin: Bulletin) {
        let position: Option<usize> = bulletin
            .id
            .as_ref()
            .and_then(|id| self.internal.iter().position(|b| b.id.as_ref() == Some(id)));
        match position {
            Some(index) => self.internal[index] = bulletin,
            None => self.internal.push(bulletin),
        }
        sort_by_owner(&mut self.internal);
        self.refresh_daytime_flag();
    }

    /// Removes a local bulletin. Returns the removed bulletin, if any.
    pub fn remove(&mut self, id: &BulletinId) -> Option<Bulletin> {
        let index: usize = self
            .internal
            .iter()
            .position(|b| b.id.as_ref() == Some(id))?;
        let removed: Bulletin = self.internal.remove(index);
        self.refresh_daytime_flag();
        Some(removed)
    }

    /// Internal bulletins created by `region` or holding one of its regions.
    #[must_use]
    pub fn own_bulletins(&self, region: &RegionCode) -> Vec<&Bulletin> {
        self.internal
            .iter()
            .filter(|b| b.is_created_by(region) || b.regions.holds_within(region))
            .collect()
    }

    /// Internal bulletins of the neighbouring regions.
    #[must_use]
    pub fn foreign_bulletins(&self, region: &RegionCode) -> Vec<&Bulletin> {
        self.internal
            .iter()
            .filter(|b| !b.is_created_by(region) && !b.regions.holds_within(region))
            .collect()
    }

    /// Bulletins the acting region has to send on save, stamped with the day's validity.
    ///
    /// A bulletin is sent when it holds at least one saved or published
    /// region of the acting region.
    ///
    /// # Errors
    ///
    /// Returns an error if the validity window of the day cannot be computed.
    pub fn bulletins_to_save(&self, region: &RegionCode) -> Result<Vec<Bulletin>, CoreError> {
        let validity: Validity = Validity::for_date(self.date)?;
        Ok(self
            .internal
            .iter()
            .filter(|b| b.regions.holds_within(region))
            .map(|b| {
                let mut stamped: Bulletin = b.clone();
                stamped.validity = Some(validity);
                stamped
            })
            .collect())
    }

    fn refresh_daytime_flag(&mut self) {
        self.daytime_dependent = self
            .internal
            .iter()
            .chain(self.external.values().flatten())
            .any(|b| b.has_daytime_dependency);
    }
}

fn sort_by_owner(bulletins: &mut [Bulletin]) {
    bulletins.sort_by(|a, b| a.owner_region.cmp(&b.owner_region));
}

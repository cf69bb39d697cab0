// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State of one forecaster's editor.
//!
//! The session owns everything the editor shows for the active day: the
//! merged working set, the last loaded version of every bulletin, the
//! bulletin being edited, the known statuses and the in-flight flags.
//! All methods are synchronous; the [`crate::Editor`] handle wraps the
//! session in a mutex and performs the network calls.

use albina::{
    ActiveBulletin, AfternoonView, BulletinEdit, CoreError, EditOutcome, WorkingSet, apply_edit,
    reconcile_selection,
};
use albina_domain::{
    Author, Bulletin, BulletinId, BulletinStatus, PublicationSchedule, RegionCode,
    RegionDayStatus,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use time::Date;
use tracing::debug;

use crate::error::ClientError;
use crate::status::StatusRepository;

/// Operations guarded by an in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Loading,
    Saving,
    Deleting,
    Submitting,
    Publishing,
    Updating,
    Copying,
}

impl Operation {
    /// Name used in busy errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Saving => "saving",
            Self::Deleting => "deleting",
            Self::Submitting => "submitting",
            Self::Publishing => "publishing",
            Self::Updating => "updating",
            Self::Copying => "copying",
        }
    }
}

/// The editor state of one forecaster for one day.
#[derive(Debug)]
pub struct EditorSession {
    author: Author,
    region: RegionCode,
    neighbors: Vec<RegionCode>,
    schedule: PublicationSchedule,
    date: Date,
    working_set: WorkingSet,
    original_bulletins: HashMap<BulletinId, Bulletin>,
    active: Option<Bulletin>,
    statuses: StatusRepository,
    in_flight: HashSet<Operation>,
    editing_regions: bool,
    load_error: bool,
    external_load_errors: BTreeMap<String, bool>,
}

impl EditorSession {
    /// Creates a session for `region` showing `date`.
    ///
    /// # Arguments
    ///
    /// * `author` - Author stamped on new bulletins
    /// * `region` - The region the forecaster acts for
    /// * `neighbors` - Regions of the same cluster shown alongside
    /// * `schedule` - Publication times
    /// * `date` - The first day to show
    #[must_use]
    pub fn new(
        author: Author,
        region: RegionCode,
        neighbors: Vec<RegionCode>,
        schedule: PublicationSchedule,
        date: Date,
    ) -> Self {
        Self {
            author,
            region,
            neighbors,
            schedule,
            date,
            working_set: WorkingSet::new(date),
            original_bulletins: HashMap::new(),
            active: None,
            statuses: StatusRepository::new(),
            in_flight: HashSet::new(),
            editing_regions: false,
            load_error: false,
            external_load_errors: BTreeMap::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub const fn author(&self) -> &Author {
        &self.author
    }

    #[must_use]
    pub const fn region(&self) -> &RegionCode {
        &self.region
    }

    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    #[must_use]
    pub const fn schedule(&self) -> &PublicationSchedule {
        &self.schedule
    }

    #[must_use]
    pub const fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    #[must_use]
    pub const fn statuses(&self) -> &StatusRepository {
        &self.statuses
    }

    /// The bulletin being edited.
    #[must_use]
    pub const fn active(&self) -> Option<&Bulletin> {
        self.active.as_ref()
    }

    /// The last version of `id` loaded from the server.
    #[must_use]
    pub fn original(&self, id: &BulletinId) -> Option<&Bulletin> {
        self.original_bulletins.get(id)
    }

    /// Returns true if the working copy of `id` differs from its loaded version.
    #[must_use]
    pub fn has_changes(&self, id: &BulletinId) -> bool {
        let current: Option<&Bulletin> = self
            .active
            .as_ref()
            .filter(|b| b.id.as_ref() == Some(id))
            .or_else(|| self.working_set.find(id));
        match (current, self.original_bulletins.get(id)) {
            (Some(current), Some(original)) => current.differs_from(original),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Regions whose bulletins are loaded from the own server.
    #[must_use]
    pub fn internal_regions(&self) -> Vec<RegionCode> {
        std::iter::once(self.region.clone())
            .chain(self.neighbors.iter().cloned())
            .collect()
    }

    /// The status of the acting region on the shown day.
    #[must_use]
    pub fn status(&self) -> BulletinStatus {
        self.statuses.get(&self.region, self.date)
    }

    #[must_use]
    pub const fn load_error(&self) -> bool {
        self.load_error
    }

    /// Returns true if the last refresh from `server` failed.
    #[must_use]
    pub fn external_load_error(&self, server: &str) -> bool {
        self.external_load_errors
            .get(server)
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub const fn is_editing_regions(&self) -> bool {
        self.editing_regions
    }

    /// Returns true if any operation is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Returns true if `operation` is in flight.
    #[must_use]
    pub fn is_in_flight(&self, operation: Operation) -> bool {
        self.in_flight.contains(&operation)
    }

    // ========================================================================
    // Guards
    // ========================================================================

    /// Marks `operation` as in flight.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Busy` if it already is.
    pub fn begin(&mut self, operation: Operation) -> Result<(), ClientError> {
        if !self.in_flight.insert(operation) {
            return Err(ClientError::Busy(operation.as_str()));
        }
        Ok(())
    }

    /// Clears the in-flight flag of `operation`.
    pub fn finish(&mut self, operation: Operation) {
        self.in_flight.remove(&operation);
    }

    /// Rejects changes to a submitted or published day.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` for such a day.
    pub fn ensure_writable(&self) -> Result<(), ClientError> {
        self.ensure_writable_on(self.date)
    }

    /// Rejects changes to `date` if it is submitted or published.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` for such a day.
    pub fn ensure_writable_on(&self, date: Date) -> Result<(), ClientError> {
        let status: BulletinStatus = self.statuses.get(&self.region, date);
        if status.is_write_disabled() {
            return Err(ClientError::WriteDisabled {
                region: self.region.clone(),
                date,
                status,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Loading and merging
    // ========================================================================

    /// Switches to another day, dropping everything loaded for the old one.
    pub fn set_date(&mut self, date: Date) {
        if date == self.date {
            return;
        }
        self.date = date;
        self.working_set = WorkingSet::new(date);
        self.original_bulletins.clear();
        self.active = None;
        self.editing_regions = false;
        self.load_error = false;
        self.external_load_errors.clear();
    }

    /// Merges a refresh from the own server.
    ///
    /// # Returns
    ///
    /// False if the session moved to another day meanwhile and the result
    /// was discarded.
    pub fn apply_internal(
        &mut self,
        date: Date,
        bulletins: Vec<Bulletin>,
        statuses: &[RegionDayStatus],
    ) -> bool {
        if date != self.date {
            debug!(%date, current = %self.date, "Discarding stale refresh");
            return false;
        }

        self.statuses
            .replace_range(&self.region, date, date, statuses);
        let disabled: bool = self.statuses.is_write_disabled(&self.region, date);

        self.original_bulletins = bulletins
            .iter()
            .filter_map(|b| b.id.clone().map(|id| (id, b.clone())))
            .collect();

        let active: Option<ActiveBulletin<'_>> = self.active.as_ref().map(|bulletin| {
            ActiveBulletin {
                bulletin,
                disabled,
            }
        });
        self.working_set.merge_internal(bulletins, active);

        if disabled && self.active.is_some() {
            debug!("Day is write-disabled, dropping local working copy");
            self.active = None;
        }

        self.load_error = false;
        true
    }

    /// Merges a refresh from a peer server.
    ///
    /// # Returns
    ///
    /// False if the result was for another day and was discarded.
    pub fn apply_external(&mut self, server: &str, date: Date, bulletins: Vec<Bulletin>) -> bool {
        if date != self.date {
            return false;
        }
        self.working_set.merge_external(server, bulletins);
        self.external_load_errors.insert(server.to_string(), false);
        true
    }

    /// Records a failed refresh from the own server.
    pub const fn mark_load_error(&mut self) {
        self.load_error = true;
    }

    /// Records a failed refresh from a peer server.
    pub fn mark_external_load_error(&mut self, server: &str) {
        self.external_load_errors.insert(server.to_string(), true);
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Starts a new bulletin of the acting region and makes it active.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` if the day is submitted or published.
    pub fn create_bulletin(&mut self) -> Result<&Bulletin, ClientError> {
        self.ensure_writable()?;
        let bulletin: &Bulletin = self
            .active
            .insert(Bulletin::new(self.region.clone(), self.author.clone()));
        Ok(bulletin)
    }

    /// Starts a new bulletin carrying the content of `source`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` if the day is submitted or
    /// published.
    pub fn create_from(&mut self, source: &Bulletin) -> Result<&Bulletin, ClientError> {
        self.ensure_writable()?;
        let bulletin: &Bulletin = self
            .active
            .insert(source.copy_for_new_author(self.author.clone(), self.region.clone()));
        Ok(bulletin)
    }

    /// Makes a working copy of `id` the active bulletin.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::BulletinNotFound` if the day has no such bulletin.
    pub fn start_editing(&mut self, id: &BulletinId) -> Result<&Bulletin, ClientError> {
        let bulletin: Bulletin = self
            .working_set
            .find(id)
            .ok_or_else(|| CoreError::BulletinNotFound {
                bulletin: id.clone(),
            })?
            .clone_shallow();
        let bulletin: &Bulletin = self.active.insert(bulletin);
        Ok(bulletin)
    }

    /// Applies an edit to the active bulletin.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` on a write-disabled day,
    /// `ClientError::Validation` if nothing is active, and the propagation
    /// error if the edit is not allowed.
    pub fn edit(&mut self, edit: BulletinEdit) -> Result<AfternoonView, ClientError> {
        self.ensure_writable()?;
        let active: &Bulletin = self
            .active
            .as_ref()
            .ok_or_else(|| ClientError::Validation(String::from("no bulletin is being edited")))?;

        let others: Vec<Bulletin> = self
            .working_set
            .internal()
            .iter()
            .filter(|b| active.id.is_none() || b.id != active.id)
            .cloned()
            .collect();
        let outcome: EditOutcome = apply_edit(active, edit, &others)?;

        self.active = Some(outcome.bulletin);
        Ok(outcome.afternoon_view)
    }

    /// Ends editing; the working copy replaces its bulletin in the working set.
    ///
    /// # Returns
    ///
    /// The bulletin that was active.
    pub fn stop_editing(&mut self) -> Option<Bulletin> {
        let bulletin: Bulletin = self.active.take()?;
        self.working_set.upsert(bulletin.clone());
        Some(bulletin)
    }

    /// Marks that a new area is being drawn.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` on a write-disabled day and
    /// `ClientError::Validation` if no bulletin is active.
    pub fn start_drawing(&mut self) -> Result<(), ClientError> {
        self.ensure_writable()?;
        if self.active.is_none() {
            return Err(ClientError::Validation(String::from(
                "select a bulletin before drawing regions",
            )));
        }
        self.editing_regions = true;
        Ok(())
    }

    /// Applies the drawn selection to the active bulletin.
    ///
    /// Regions the active bulletin now claims are released from the other
    /// bulletins of the acting region.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NoRegionSelected` if the acting region created
    /// the bulletin and the selection holds none of its regions.
    pub fn finish_drawing(&mut self, selected: &[RegionCode]) -> Result<(), ClientError> {
        let active: Bulletin = self
            .active
            .clone()
            .ok_or_else(|| ClientError::Validation(String::from("no bulletin is being edited")))?;

        let mut bulletins: Vec<Bulletin> = self
            .working_set
            .internal()
            .iter()
            .filter(|b| active.id.is_none() || b.id != active.id)
            .cloned()
            .collect();
        bulletins.push(active);
        let target: usize = bulletins.len() - 1;

        let mut reconciled: Vec<Bulletin> =
            reconcile_selection(&bulletins, target, &self.region, selected)?;

        self.active = reconciled.pop();
        for bulletin in reconciled {
            self.working_set.upsert(bulletin);
        }
        self.editing_regions = false;
        Ok(())
    }

    /// Abandons drawing without changing any bulletin.
    pub const fn cancel_drawing(&mut self) {
        self.editing_regions = false;
    }

    // ========================================================================
    // Results of server calls
    // ========================================================================

    /// Bulletins to send on save, stamped with the day's validity.
    ///
    /// # Errors
    ///
    /// Returns an error if the validity window cannot be computed.
    pub fn bulletins_to_save(&self) -> Result<Vec<Bulletin>, ClientError> {
        Ok(self.working_set.bulletins_to_save(&self.region)?)
    }

    /// Own bulletins of the day.
    #[must_use]
    pub fn own_bulletins(&self) -> Vec<Bulletin> {
        self.working_set
            .own_bulletins(&self.region)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Replaces the own bulletins with the server's answer to a save.
    ///
    /// The answer holds every bulletin touching the acting region, which
    /// may include neighbour bulletins carrying suggestions for it. Those
    /// replace the local copy with the same identifier.
    pub fn apply_saved(&mut self, date: Date, saved: &[Bulletin]) {
        if date != self.date {
            return;
        }

        let saved_ids: HashSet<&BulletinId> = saved.iter().filter_map(|b| b.id.as_ref()).collect();
        let mut incoming: Vec<Bulletin> = self
            .working_set
            .foreign_bulletins(&self.region)
            .into_iter()
            .filter(|b| b.id.as_ref().is_none_or(|id| !saved_ids.contains(id)))
            .cloned()
            .collect();
        incoming.extend(saved.iter().cloned());
        self.working_set.merge_internal(incoming, None);

        for bulletin in saved {
            if let Some(id) = &bulletin.id {
                self.original_bulletins.insert(id.clone(), bulletin.clone());
            }
        }

        if self.status() == BulletinStatus::Missing {
            self.statuses
                .set(&self.region, date, BulletinStatus::Draft);
        }
    }

    /// Removes a deleted bulletin.
    pub fn apply_deleted(&mut self, id: &BulletinId, status: BulletinStatus) {
        self.working_set.remove(id);
        self.original_bulletins.remove(id);
        if self.active.as_ref().and_then(|b| b.id.as_ref()) == Some(id) {
            self.active = None;
        }
        self.set_status(self.date, status);
    }

    /// Records the status the server reported for the acting region.
    pub fn set_status(&mut self, date: Date, status: BulletinStatus) {
        self.statuses.set(&self.region, date, status);
    }
}

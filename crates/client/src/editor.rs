// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The editor: session state plus the servers and locks it talks to.
//!
//! Every operation follows the same pattern: take the session lock, check
//! guards and set the in-flight flag, release the lock across the network
//! call, then re-take it to merge the result. A result for a day the
//! session no longer shows is discarded.

use albina::{AfternoonView, BulletinEdit, CoreError};
use albina_domain::{
    Bulletin, BulletinId, BulletinStatus, CheckCode, RegionCode, RegionDayStatus,
    check_avalanche_problems,
};
use std::sync::Arc;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::http::BulletinApi;
use crate::locks::LockManager;
use crate::session::{EditorSession, Operation};

/// Shared handle of a forecaster's editor.
#[derive(Clone)]
pub struct Editor {
    session: Arc<Mutex<EditorSession>>,
    api: Arc<dyn BulletinApi>,
    locks: Arc<LockManager>,
}

impl Editor {
    /// Creates an editor around a session.
    #[must_use]
    pub fn new(session: EditorSession, api: Arc<dyn BulletinApi>, locks: Arc<LockManager>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            api,
            locks,
        }
    }

    /// The session state.
    #[must_use]
    pub fn session(&self) -> Arc<Mutex<EditorSession>> {
        Arc::clone(&self.session)
    }

    /// The lock manager.
    #[must_use]
    pub fn locks(&self) -> Arc<LockManager> {
        Arc::clone(&self.locks)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Shows `date` and loads its bulletins and status from the own server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Busy` if a load is in flight, or the transport
    /// error of the failed request (also recorded as load error).
    pub async fn load(&self, date: Date) -> Result<(), ClientError> {
        let mut session = self.session.lock().await;
        session.begin(Operation::Loading)?;
        session.set_date(date);
        let region: RegionCode = session.region().clone();
        let regions: Vec<RegionCode> = session.internal_regions();
        drop(session);

        let result = self.fetch_internal(date, &region, &regions).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Loading);
        match result {
            Ok((bulletins, statuses)) => {
                session.apply_internal(date, bulletins, &statuses);
                drop(session);
                self.locks
                    .resync_regions(self.api.as_ref(), std::slice::from_ref(&region))
                    .await
            }
            Err(e) => {
                session.mark_load_error();
                Err(e)
            }
        }
    }

    /// Refreshes the own-server bulletins unless something is in flight.
    ///
    /// # Returns
    ///
    /// True if a refresh was merged.
    ///
    /// # Errors
    ///
    /// Returns the transport error of a failed refresh (also recorded as
    /// load error; the next poll retries).
    pub async fn refresh_internal(&self) -> Result<bool, ClientError> {
        let mut session = self.session.lock().await;
        if session.is_busy() || session.is_editing_regions() {
            debug!("Editor busy, skipping internal refresh");
            return Ok(false);
        }
        session.begin(Operation::Loading)?;
        let date: Date = session.date();
        let region: RegionCode = session.region().clone();
        let regions: Vec<RegionCode> = session.internal_regions();
        drop(session);

        let result = self.fetch_internal(date, &region, &regions).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Loading);
        match result {
            Ok((bulletins, statuses)) => Ok(session.apply_internal(date, bulletins, &statuses)),
            Err(e) => {
                warn!(error = %e, "Internal refresh failed");
                session.mark_load_error();
                Err(e)
            }
        }
    }

    /// Refreshes the bulletins of one peer server.
    ///
    /// Skipped while a new area is being drawn.
    ///
    /// # Errors
    ///
    /// Returns the transport error of a failed refresh (also recorded per server).
    pub async fn refresh_external(
        &self,
        server: &dyn BulletinApi,
        regions: &[RegionCode],
    ) -> Result<bool, ClientError> {
        let session = self.session.lock().await;
        if session.is_editing_regions() {
            debug!(server = server.name(), "Drawing regions, skipping external refresh");
            return Ok(false);
        }
        let date: Date = session.date();
        drop(session);

        let result = server.edit_bulletins(date, regions).await;

        let mut session = self.session.lock().await;
        match result {
            Ok(bulletins) => Ok(session.apply_external(server.name(), date, bulletins)),
            Err(e) => {
                warn!(server = server.name(), error = %e, "External refresh failed");
                session.mark_external_load_error(server.name());
                Err(e)
            }
        }
    }

    async fn fetch_internal(
        &self,
        date: Date,
        region: &RegionCode,
        regions: &[RegionCode],
    ) -> Result<(Vec<Bulletin>, Vec<RegionDayStatus>), ClientError> {
        let bulletins: Vec<Bulletin> = self.api.edit_bulletins(date, regions).await?;
        let statuses: Vec<RegionDayStatus> = self.api.internal_status(date, date, region).await?;
        Ok((bulletins, statuses))
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Starts a new bulletin of the acting region.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` on a submitted or published day.
    pub async fn create_bulletin(&self) -> Result<Bulletin, ClientError> {
        let mut session = self.session.lock().await;
        Ok(session.create_bulletin()?.clone())
    }

    /// Starts editing `id` and announces it on the bulletin channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the bulletin does not exist or the lock cannot be sent.
    pub async fn start_editing(&self, id: &BulletinId) -> Result<Bulletin, ClientError> {
        let mut session = self.session.lock().await;
        let bulletin: Bulletin = session.start_editing(id)?.clone();
        let date: Date = session.date();
        drop(session);

        if self.locks.is_bulletin_locked_by_other(id).await {
            info!(bulletin = %id, "Bulletin is also being edited by someone else");
        }
        self.locks.lock_bulletin(id, date).await?;
        Ok(bulletin)
    }

    /// Applies an edit to the active bulletin.
    ///
    /// # Errors
    ///
    /// See [`EditorSession::edit`].
    pub async fn edit(&self, edit: BulletinEdit) -> Result<AfternoonView, ClientError> {
        self.session.lock().await.edit(edit)
    }

    /// Ends editing and announces it on the bulletin channel.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the unlock cannot be sent.
    pub async fn stop_editing(&self) -> Result<Option<Bulletin>, ClientError> {
        let mut session = self.session.lock().await;
        let stopped: Option<Bulletin> = session.stop_editing();
        let date: Date = session.date();
        drop(session);

        if let Some(id) = stopped.as_ref().and_then(|b| b.id.as_ref()) {
            self.locks.unlock_bulletin(id, date).await?;
        }
        Ok(stopped)
    }

    /// Starts drawing a new area and announces it on the region channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the day is write-disabled, nothing is active,
    /// or the lock cannot be sent.
    pub async fn start_drawing(&self) -> Result<(), ClientError> {
        let mut session = self.session.lock().await;
        session.start_drawing()?;
        let region: RegionCode = session.region().clone();
        let date: Date = session.date();
        drop(session);

        if self.locks.is_region_locked_by_other(&region, date).await {
            info!(region = %region, %date, "Someone else is drawing this region too");
        }
        self.locks.lock_region(&region, date).await
    }

    /// Applies the drawn selection, ends drawing and saves.
    ///
    /// # Errors
    ///
    /// Returns the selection error, or any error of the save.
    pub async fn finish_drawing(&self, selected: &[RegionCode]) -> Result<Vec<Bulletin>, ClientError> {
        let mut session = self.session.lock().await;
        let applied: Result<(), ClientError> = session.finish_drawing(selected);
        if applied.is_err() {
            session.cancel_drawing();
        }
        let region: RegionCode = session.region().clone();
        let date: Date = session.date();
        drop(session);

        self.locks.unlock_region(&region, date).await?;
        applied?;
        self.save().await
    }

    // ========================================================================
    // Workflow
    // ========================================================================

    /// Saves the acting region's bulletins of the day.
    ///
    /// The active bulletin, if any, is stopped first so its changes are sent.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` or `ClientError::Busy` before any
    /// call, or the server's error.
    pub async fn save(&self) -> Result<Vec<Bulletin>, ClientError> {
        let session = self.session.lock().await;
        session.ensure_writable()?;
        drop(session);
        self.stop_editing().await?;

        let mut session = self.session.lock().await;
        session.begin(Operation::Saving)?;
        let bulletins: Vec<Bulletin> = match session.bulletins_to_save() {
            Ok(bulletins) => bulletins,
            Err(e) => {
                session.finish(Operation::Saving);
                return Err(e);
            }
        };
        let date: Date = session.date();
        let region: RegionCode = session.region().clone();
        drop(session);

        info!(region = %region, %date, count = bulletins.len(), "Saving bulletins");
        let result = self.api.save_bulletins(date, &region, &bulletins).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Saving);
        let saved: Vec<Bulletin> = result?;
        session.apply_saved(date, &saved);
        Ok(saved)
    }

    /// Deletes a bulletin of the acting region.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` or `ClientError::Busy` before any
    /// call, or the server's error.
    pub async fn delete(&self, id: &BulletinId) -> Result<(), ClientError> {
        let mut session = self.session.lock().await;
        session.ensure_writable()?;
        session.begin(Operation::Deleting)?;
        let date: Date = session.date();
        let region: RegionCode = session.region().clone();
        drop(session);

        let result = self.api.delete_bulletin(date, &region, id).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Deleting);
        let status: BulletinStatus = result?;
        if session.date() == date {
            session.apply_deleted(id, status);
        }
        Ok(())
    }

    /// Submits the acting region's bulletins.
    ///
    /// Avalanche problems are validated and the server's day check must
    /// not report duplicate regions before the submit is sent.
    ///
    /// # Errors
    ///
    /// - `ClientError::WriteDisabled` if the day is already submitted or published
    /// - `ClientError::Validation` if avalanche problems are incomplete
    /// - `ClientError::Conflict` if a micro-region is held twice
    /// - `ClientError::Busy` if a submit is in flight
    pub async fn submit(&self) -> Result<BulletinStatus, ClientError> {
        let mut session = self.session.lock().await;
        session.ensure_writable()?;
        check_avalanche_problems(session.own_bulletins().iter())
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        session.begin(Operation::Submitting)?;
        let date: Date = session.date();
        let region: RegionCode = session.region().clone();
        drop(session);

        let result = self.check_then_submit(date, &region).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Submitting);
        let status: BulletinStatus = result?;
        session.set_status(date, status);
        info!(region = %region, %date, %status, "Bulletins submitted");
        Ok(status)
    }

    async fn check_then_submit(
        &self,
        date: Date,
        region: &RegionCode,
    ) -> Result<BulletinStatus, ClientError> {
        let codes: Vec<CheckCode> = self.api.check(date, region).await?;
        if codes.contains(&CheckCode::DuplicateRegion) {
            return Err(ClientError::Conflict(String::from(
                CheckCode::DuplicateRegion.as_str(),
            )));
        }
        self.api.submit(date, region).await
    }

    /// Publishes the acting region's submitted bulletins.
    ///
    /// Nothing is sent before the publication time of the day's status.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PublicationGateClosed` before the publication
    /// time, `ClientError::Busy` if a publish is in flight, or the server's
    /// error.
    pub async fn publish(&self, change: bool, now: OffsetDateTime) -> Result<BulletinStatus, ClientError> {
        let mut session = self.session.lock().await;
        let date: Date = session.date();
        let status: BulletinStatus = session.status();
        if !session.schedule().is_gate_open(date, status, now)? {
            return Err(CoreError::PublicationGateClosed { date, status }.into());
        }
        session.begin(Operation::Publishing)?;
        let region: RegionCode = session.region().clone();
        drop(session);

        let result = self.api.publish(date, &region, change).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Publishing);
        let published: BulletinStatus = result?;
        session.set_status(date, published);
        info!(region = %region, %date, status = %published, change, "Bulletins published");
        Ok(published)
    }

    /// Reopens a submitted or published day for changes.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Busy` if an update is in flight, or the server's error.
    pub async fn start_update(&self) -> Result<BulletinStatus, ClientError> {
        let mut session = self.session.lock().await;
        session.begin(Operation::Updating)?;
        let date: Date = session.date();
        let region: RegionCode = session.region().clone();
        drop(session);

        let result = self.api.start_update(date, &region).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Updating);
        let status: BulletinStatus = result?;
        session.set_status(date, status);
        Ok(status)
    }

    /// Copies the acting region's bulletins of the shown day to `target`.
    ///
    /// Only regions the acting region holds survive; bulletins without any
    /// are skipped.
    ///
    /// # Returns
    ///
    /// The bulletins saved on `target`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WriteDisabled` if `target` is submitted or
    /// published, `ClientError::Busy` if a copy is in flight, or the
    /// server's error.
    pub async fn copy_to(&self, target: Date) -> Result<Vec<Bulletin>, ClientError> {
        let mut session = self.session.lock().await;
        session.ensure_writable_on(target)?;
        let region: RegionCode = session.region().clone();
        let mut copies: Vec<Bulletin> = Vec::new();
        for bulletin in session.own_bulletins() {
            if let Some(copy) = bulletin.copy_to_day(session.author().clone(), &region, target)? {
                copies.push(copy);
            }
        }
        session.begin(Operation::Copying)?;
        drop(session);

        info!(region = %region, %target, count = copies.len(), "Copying bulletins");
        let result = self.api.save_bulletins(target, &region, &copies).await;

        let mut session = self.session.lock().await;
        session.finish(Operation::Copying);
        let saved: Vec<Bulletin> = result?;
        if session.statuses().get(&region, target) == BulletinStatus::Missing {
            session.set_status(target, BulletinStatus::Draft);
        }
        Ok(saved)
    }

    /// Releases every lock of this forecaster.
    pub async fn close(&self) -> usize {
        self.locks.release_all().await
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operations behind every REST endpoint.
//!
//! Each workflow operation loads the acting region's day, applies one core
//! command, and persists the transition together with its audit event while
//! the caller holds the persistence lock.

use albina::{Command, DayState, LockRegistry, TransitionResult, apply, apply_publish_all};
use albina_audit::{AuditEvent, Cause};
use albina_domain::{
    Bulletin, BulletinId, CheckCode, LanguageCode, PublicationSchedule, RegionCode,
    RegionDayStatus, check_day, format_date,
};
use albina_persistence::{ForecasterData, SqlitePersistence};
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::request_response::{
    DeleteBulletinQuery, EditBulletinsQuery, LockedRegionsQuery, LoginRequest, LoginResponse,
    PublishAllQuery, PublishQuery, RegionDayQuery, StatusQuery, StatusResponse,
};

/// The result of a workflow operation together with its persisted audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult<T> {
    /// The API response.
    pub response: T,
    /// The audit event recorded for the operation, with its identifier.
    pub audit_event: AuditEvent,
}

// ========================================================================
// Authentication
// ========================================================================

/// Logs a forecaster in.
///
/// # Errors
///
/// Returns an error if the credentials are wrong, the forecaster is
/// disabled, or the session cannot be stored.
pub fn login(
    persistence: &mut SqlitePersistence,
    request: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let (access_token, actor, forecaster): (String, AuthenticatedActor, ForecasterData) =
        AuthenticationService::login(persistence, &request.username, &request.password)?;

    let expires_at: String = persistence
        .get_session_by_token(&access_token)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Session not found after creation"),
        })?
        .expires_at;

    Ok(LoginResponse {
        access_token,
        username: forecaster.username,
        display_name: forecaster.display_name,
        region: actor.region,
        roles: vec![String::from(actor.role.as_str())],
        expires_at,
    })
}

/// Logs out by deleting the session.
///
/// # Errors
///
/// Returns an error if the logout fails.
pub fn logout(persistence: &mut SqlitePersistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Creates a forecaster at server start unless the username already exists.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `username` - The login name
/// * `password` - The plain-text password
/// * `region` - The region the forecaster acts for
/// * `role` - The role name
///
/// # Returns
///
/// `true` if the forecaster was created, `false` if it already existed.
///
/// # Errors
///
/// Returns an error if the region or role is invalid or the write fails.
pub fn bootstrap_forecaster(
    persistence: &mut SqlitePersistence,
    username: &str,
    password: &str,
    region: &str,
    role: &str,
) -> Result<bool, ApiError> {
    let region: RegionCode = RegionCode::new(region).map_err(translate_domain_error)?;
    let role: Role = Role::parse(role).map_err(|_| ApiError::InvalidInput {
        field: String::from("role"),
        message: format!("Unknown role '{role}'"),
    })?;

    if persistence
        .get_forecaster_by_username(username)
        .map_err(translate_persistence_error)?
        .is_some()
    {
        info!(username, "Forecaster already exists, skipping bootstrap");
        return Ok(false);
    }

    persistence
        .create_forecaster(username, username, password, region.as_str(), role.as_str())
        .map_err(translate_persistence_error)?;
    Ok(true)
}

// ========================================================================
// Bulletins
// ========================================================================

/// Returns the bulletins of a day touching any of the requested regions.
///
/// A bulletin touches a region if the region created it, holds a
/// micro-region inside it, or carries a suggestion for it.
///
/// # Errors
///
/// Returns an error if a region code is invalid or the query fails.
pub fn get_edit_bulletins(
    persistence: &mut SqlitePersistence,
    query: &EditBulletinsQuery,
) -> Result<Vec<Bulletin>, ApiError> {
    let regions: Vec<RegionCode> = parse_region_list(query.regions.as_deref())?;
    let bulletins: Vec<Bulletin> = persistence
        .get_bulletins(query.date)
        .map_err(translate_persistence_error)?;

    if regions.is_empty() {
        return Ok(bulletins);
    }

    Ok(bulletins
        .into_iter()
        .filter(|b| regions.iter().any(|r| touches(b, r)))
        .collect())
}

fn touches(bulletin: &Bulletin, region: &RegionCode) -> bool {
    bulletin.is_created_by(region)
        || bulletin.regions.holds_within(region)
        || bulletin.regions.suggests_within(region)
}

/// Saves the acting region's bulletins of a day.
///
/// Bulletins without an identifier are assigned one. The stored bulletins
/// are replaced by the reconciled set. The answer holds the bulletins of
/// the day touching the acting region, as `get_edit_bulletins` would
/// return them for that region alone.
///
/// # Errors
///
/// Returns an error if the actor may not write the region, the day is
/// write-disabled, or a bulletin holds no region of the acting area.
pub fn save_bulletins(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    query: &RegionDayQuery,
    mut bulletins: Vec<Bulletin>,
    now: OffsetDateTime,
    cause: Cause,
) -> Result<ApiResult<Vec<Bulletin>>, ApiError> {
    AuthorizationService::authorize_region_write(actor, &query.region, "save_bulletins")?;
    assign_bulletin_ids(&mut bulletins)?;

    let (result, audit_event): (TransitionResult, AuditEvent) = run_transition(
        persistence,
        schedule,
        actor,
        &query.region,
        query.date,
        Command::SaveBulletins { bulletins, now },
        cause,
    )?;

    let region: &RegionCode = &query.region;
    Ok(ApiResult {
        response: result
            .new_state
            .bulletins
            .into_iter()
            .filter(|b| touches(b, region))
            .collect(),
        audit_event,
    })
}

/// Deletes one bulletin created by the acting region.
///
/// # Errors
///
/// Returns an error if the actor may not write the region, the day is
/// write-disabled, or the bulletin does not exist.
pub fn delete_bulletin(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    query: &DeleteBulletinQuery,
    cause: Cause,
) -> Result<ApiResult<StatusResponse>, ApiError> {
    AuthorizationService::authorize_region_write(actor, &query.region, "delete_bulletin")?;

    status_transition(
        persistence,
        schedule,
        actor,
        &query.region,
        query.date,
        Command::DeleteBulletin {
            bulletin: query.id.clone(),
        },
        cause,
    )
}

/// Reopens a submitted, published or missed day for editing.
///
/// # Errors
///
/// Returns an error if the actor may not write the region or the day's
/// status does not allow an update.
pub fn start_update(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    query: &RegionDayQuery,
    now: OffsetDateTime,
    cause: Cause,
) -> Result<ApiResult<StatusResponse>, ApiError> {
    AuthorizationService::authorize_region_write(actor, &query.region, "update")?;

    status_transition(
        persistence,
        schedule,
        actor,
        &query.region,
        query.date,
        Command::StartUpdate { now },
        cause,
    )
}

/// Submits the acting region's day.
///
/// # Errors
///
/// Returns an error if the actor may not write the region, the day cannot
/// be submitted from its status, or validation fails.
pub fn submit(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    query: &RegionDayQuery,
    cause: Cause,
) -> Result<ApiResult<StatusResponse>, ApiError> {
    AuthorizationService::authorize_region_write(actor, &query.region, "submit")?;

    status_transition(
        persistence,
        schedule,
        actor,
        &query.region,
        query.date,
        Command::Submit,
        cause,
    )
}

/// Publishes the acting region's submitted day.
///
/// # Errors
///
/// Returns an error if the actor may not write the region, the day is not
/// submitted, validation fails, or the publication gate is still closed.
pub fn publish(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    query: &PublishQuery,
    now: OffsetDateTime,
    cause: Cause,
) -> Result<ApiResult<StatusResponse>, ApiError> {
    AuthorizationService::authorize_region_write(actor, &query.region, "publish")?;

    status_transition(
        persistence,
        schedule,
        actor,
        &query.region,
        query.date,
        Command::Publish {
            change: query.change,
            now,
        },
        cause,
    )
}

/// Publishes every submitted region of a day whose gate has passed.
///
/// # Returns
///
/// The new status of every region that was published.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or persistence fails.
pub fn publish_all(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    query: &PublishAllQuery,
    now: OffsetDateTime,
    cause: &Cause,
) -> Result<Vec<StatusResponse>, ApiError> {
    AuthorizationService::authorize_publish_all(actor)?;

    let states: Vec<DayState> = persistence
        .get_day_states(query.date)
        .map_err(translate_persistence_error)?;
    let results: Vec<TransitionResult> =
        apply_publish_all(&states, schedule, now, &actor.to_audit_actor(), cause)
            .map_err(translate_core_error)?;

    let mut published: Vec<StatusResponse> = Vec::with_capacity(results.len());
    for result in results {
        persistence
            .persist_transition(&result)
            .map_err(translate_persistence_error)?;
        published.push(status_of(&result.new_state));
    }

    info!(
        date = %format_date(query.date),
        published = published.len(),
        candidates = states.len(),
        "Published all submitted regions"
    );

    Ok(published)
}

/// Runs the day check for the acting region.
///
/// # Errors
///
/// Returns an error if the bulletins cannot be loaded.
pub fn check_bulletins(
    persistence: &mut SqlitePersistence,
    query: &RegionDayQuery,
    languages: &[LanguageCode],
) -> Result<Vec<CheckCode>, ApiError> {
    let bulletins: Vec<Bulletin> = persistence
        .get_bulletins(query.date)
        .map_err(translate_persistence_error)?;
    Ok(check_day(&bulletins, &query.region, languages))
}

/// Returns the stored statuses of a region over a range of days.
///
/// # Errors
///
/// Returns an error if the range is reversed or the query fails.
pub fn get_internal_status(
    persistence: &mut SqlitePersistence,
    query: &StatusQuery,
) -> Result<Vec<RegionDayStatus>, ApiError> {
    if query.start_date > query.end_date {
        return Err(ApiError::InvalidInput {
            field: String::from("startDate"),
            message: format!(
                "Start date {} is after end date {}",
                format_date(query.start_date),
                format_date(query.end_date)
            ),
        });
    }

    persistence
        .get_region_statuses(&query.region, query.start_date, query.end_date)
        .map_err(translate_persistence_error)
}

/// Returns the days on which a region is currently locked, as ISO dates.
#[must_use]
pub fn get_locked_regions(locks: &LockRegistry, query: &LockedRegionsQuery) -> Vec<String> {
    locks
        .locked_dates(&query.region)
        .into_iter()
        .map(format_date)
        .collect()
}

// ========================================================================
// Helpers
// ========================================================================

fn parse_region_list(regions: Option<&str>) -> Result<Vec<RegionCode>, ApiError> {
    regions
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| RegionCode::new(r).map_err(translate_domain_error))
        .collect()
}

fn assign_bulletin_ids(bulletins: &mut [Bulletin]) -> Result<(), ApiError> {
    for bulletin in bulletins.iter_mut().filter(|b| b.id.is_none()) {
        let id: BulletinId = BulletinId::new(&format!("{:032x}", rand::random::<u128>()))
            .map_err(translate_domain_error)?;
        bulletin.id = Some(id);
    }
    Ok(())
}

fn status_of(state: &DayState) -> StatusResponse {
    StatusResponse {
        region: state.region.clone(),
        date: state.date,
        status: state.status,
    }
}

fn run_transition(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    region: &RegionCode,
    date: Date,
    command: Command,
    cause: Cause,
) -> Result<(TransitionResult, AuditEvent), ApiError> {
    let state: DayState = persistence
        .get_day_state(region, date)
        .map_err(translate_persistence_error)?;

    let result: TransitionResult = apply(&state, command, schedule, actor.to_audit_actor(), cause)
        .map_err(|e| {
            warn!(region = %region, date = %format_date(date), error = %e, "Transition rejected");
            translate_core_error(e)
        })?;

    let event_id: i64 = persistence
        .persist_transition(&result)
        .map_err(translate_persistence_error)?;
    let audit_event: AuditEvent = result.audit_event.clone().with_event_id(event_id);

    Ok((result, audit_event))
}

fn status_transition(
    persistence: &mut SqlitePersistence,
    schedule: &PublicationSchedule,
    actor: &AuthenticatedActor,
    region: &RegionCode,
    date: Date,
    command: Command,
    cause: Cause,
) -> Result<ApiResult<StatusResponse>, ApiError> {
    let (result, audit_event): (TransitionResult, AuditEvent) =
        run_transition(persistence, schedule, actor, region, date, command, cause)?;

    Ok(ApiResult {
        response: status_of(&result.new_state),
        audit_event,
    })
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::propagation::resolve_dependencies;
use crate::state::{DayState, TransitionResult};
use albina_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use albina_domain::{
    Bulletin, BulletinId, BulletinStatus, PublicationSchedule, RegionCode, Validity,
    check_avalanche_problems, day_is_editable, find_duplicate_regions,
};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use tracing::warn;

/// Applies a command to a region's day, producing a new state and audit event.
///
/// # Arguments
///
/// * `state` - The current state of the region's day (immutable)
/// * `command` - The command to apply
/// * `schedule` - The server's publication schedule
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new state and audit event
/// * `Err(CoreError)` if the command is invalid
///
/// # Errors
///
/// Returns an error if:
/// - The day is write-disabled and the command changes bulletins
/// - The status does not allow the requested workflow action
/// - Validation fails (incomplete avalanche problems, duplicate regions)
/// - A publish is requested before the publication gate
pub fn apply(
    state: &DayState,
    command: Command,
    schedule: &PublicationSchedule,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let name: &'static str = command.name();
    let (new_state, details): (DayState, String) = match command {
        Command::SaveBulletins { bulletins, now } => save_bulletins(state, bulletins, schedule, now)?,
        Command::DeleteBulletin { bulletin } => delete_bulletin(state, &bulletin)?,
        Command::StartUpdate { now } => start_update(state, schedule, now)?,
        Command::Submit => submit(state)?,
        Command::Publish { change, now } => publish(state, schedule, change, now)?,
    };

    let before: StateSnapshot = state.to_snapshot();
    let after: StateSnapshot = new_state.to_snapshot();
    let action: Action = Action::new(String::from(name), Some(details));
    let audit_event: AuditEvent =
        AuditEvent::new(state.scope(), actor, cause, action, before, after);

    Ok(TransitionResult {
        new_state,
        audit_event,
    })
}

/// Publishes every submitted region of a day whose gate has passed.
///
/// Regions that are not submitted, whose gate is still closed, or that
/// fail validation are skipped and left untouched.
///
/// `states` are the regions of one day sharing one set of bulletins. Each
/// publication starts from the bulletins the previous one produced, so the
/// results can be persisted in order and the last one holds every
/// region's published bulletins.
///
/// # Errors
///
/// Returns an error only if the publication time of the day cannot be
/// resolved in the schedule's timezone.
pub fn apply_publish_all(
    states: &[DayState],
    schedule: &PublicationSchedule,
    now: OffsetDateTime,
    actor: &Actor,
    cause: &Cause,
) -> Result<Vec<TransitionResult>, CoreError> {
    let mut results: Vec<TransitionResult> = Vec::new();

    for state in states {
        if state.status.publication_target().is_none()
            || !schedule.is_gate_open(state.date, state.status, now)?
        {
            continue;
        }

        let current: DayState = match results.last() {
            Some(previous) => DayState {
                bulletins: previous.new_state.bulletins.clone(),
                ..state.clone()
            },
            None => state.clone(),
        };

        match apply(
            &current,
            Command::Publish { change: false, now },
            schedule,
            actor.clone(),
            cause.clone(),
        ) {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(region = %state.region, error = %e, "Skipping region during publish all");
            }
        }
    }

    Ok(results)
}

fn ensure_writable(state: &DayState) -> Result<(), CoreError> {
    if state.status.is_write_disabled() {
        return Err(CoreError::WriteDisabled {
            region: state.region.clone(),
            date: state.date,
            status: state.status,
        });
    }
    Ok(())
}

fn save_bulletins(
    state: &DayState,
    incoming: Vec<Bulletin>,
    schedule: &PublicationSchedule,
    now: OffsetDateTime,
) -> Result<(DayState, String), CoreError> {
    ensure_writable(state)?;

    let published_5pm: bool = schedule.has_been_published_5pm(state.date, now)?;
    if !day_is_editable(state.status, published_5pm) {
        return Err(CoreError::InvalidTransition {
            from: state.status,
            action: String::from("save"),
        });
    }

    let acting: &RegionCode = &state.region;
    let validity: Validity = Validity::for_date(state.date)?;

    let mut prepared: Vec<Bulletin> = Vec::with_capacity(incoming.len());
    for bulletin in incoming {
        if bulletin.id.is_none() {
            return Err(CoreError::MissingBulletinId);
        }
        if bulletin.is_created_by(acting) && !bulletin.regions.holds_within(acting) {
            return Err(CoreError::NoRegionSelected {
                bulletin: bulletin.id,
            });
        }
        let mut resolved: Bulletin = resolve_dependencies(&bulletin);
        resolved.validity = Some(validity);
        prepared.push(resolved);
    }

    let incoming_ids: BTreeSet<&BulletinId> =
        prepared.iter().filter_map(|b| b.id.as_ref()).collect();

    // Stored bulletins missing from the save lose the acting region's contributions.
    let mut bulletins: Vec<Bulletin> = Vec::with_capacity(state.bulletins.len());
    for stored in &state.bulletins {
        if stored.id.as_ref().is_some_and(|id| incoming_ids.contains(id)) {
            continue;
        }
        let mut kept: Bulletin = stored.clone();
        let released: Vec<RegionCode> = kept.regions.held_within(acting);
        kept.regions.release(&released);
        if kept.is_created_by(acting) && kept.regions.is_empty() {
            continue;
        }
        bulletins.push(kept);
    }

    let new_status: BulletinStatus = if state.status == BulletinStatus::Missing {
        BulletinStatus::Draft
    } else {
        state.status
    };

    let saved_count: usize = prepared.len();
    bulletins.extend(prepared);
    let new_state: DayState = with_status(state, bulletins, new_status);

    Ok((
        new_state,
        format!("Saved {saved_count} bulletin(s) for {acting}"),
    ))
}

fn delete_bulletin(
    state: &DayState,
    bulletin: &BulletinId,
) -> Result<(DayState, String), CoreError> {
    ensure_writable(state)?;

    let existing: &Bulletin = state
        .find(bulletin)
        .ok_or_else(|| CoreError::BulletinNotFound {
            bulletin: bulletin.clone(),
        })?;
    if !existing.is_created_by(&state.region) {
        return Err(CoreError::NotBulletinOwner {
            bulletin: bulletin.clone(),
            region: state.region.clone(),
        });
    }

    let bulletins: Vec<Bulletin> = state
        .bulletins
        .iter()
        .filter(|b| b.id.as_ref() != Some(bulletin))
        .cloned()
        .collect();

    Ok((
        with_status(state, bulletins, state.status),
        format!("Deleted bulletin {bulletin}"),
    ))
}

fn start_update(
    state: &DayState,
    schedule: &PublicationSchedule,
    now: OffsetDateTime,
) -> Result<(DayState, String), CoreError> {
    let allowed: bool = match state.status {
        // A missing day is still editable as a draft until the regular publication.
        BulletinStatus::Missing => schedule.has_been_published_5pm(state.date, now)?,
        other => other.can_start_update(),
    };
    if !allowed {
        return Err(CoreError::InvalidTransition {
            from: state.status,
            action: String::from("update"),
        });
    }
    state.status.validate_transition(BulletinStatus::Updated)?;

    Ok((
        with_status(state, state.bulletins.clone(), BulletinStatus::Updated),
        format!("Reopened {} from {}", state.region, state.status),
    ))
}

fn validate_for_release(state: &DayState) -> Result<(), CoreError> {
    check_avalanche_problems(state.own_bulletins())?;

    let duplicates: Vec<RegionCode> = find_duplicate_regions(&state.bulletins, &state.region);
    if !duplicates.is_empty() {
        return Err(CoreError::DuplicateRegions {
            regions: duplicates,
        });
    }
    Ok(())
}

fn submit(state: &DayState) -> Result<(DayState, String), CoreError> {
    let target: BulletinStatus =
        state
            .status
            .submission_target()
            .ok_or_else(|| CoreError::InvalidTransition {
                from: state.status,
                action: String::from("submit"),
            })?;
    validate_for_release(state)?;

    Ok((
        with_status(state, state.bulletins.clone(), target),
        format!("Submitted {} as {target}", state.region),
    ))
}

fn publish(
    state: &DayState,
    schedule: &PublicationSchedule,
    change: bool,
    now: OffsetDateTime,
) -> Result<(DayState, String), CoreError> {
    let target: BulletinStatus =
        state
            .status
            .publication_target()
            .ok_or_else(|| CoreError::InvalidTransition {
                from: state.status,
                action: String::from("publish"),
            })?;
    validate_for_release(state)?;

    if !schedule.is_gate_open(state.date, state.status, now)? {
        return Err(CoreError::PublicationGateClosed {
            date: state.date,
            status: state.status,
        });
    }

    let bulletins: Vec<Bulletin> = state
        .bulletins
        .iter()
        .map(|b| {
            let mut next: Bulletin = b.clone();
            next.regions.mark_published_within(&state.region);
            next
        })
        .collect();

    let kind: &str = if change { "change" } else { "regular" };
    Ok((
        with_status(state, bulletins, target),
        format!("Published {} as {target} ({kind} publication)", state.region),
    ))
}

// Bulletins created by the region carry the day's status.
fn with_status(state: &DayState, bulletins: Vec<Bulletin>, status: BulletinStatus) -> DayState {
    let bulletins: Vec<Bulletin> = bulletins
        .into_iter()
        .map(|mut b| {
            if b.is_created_by(&state.region) {
                b.status = status;
            }
            b
        })
        .collect();

    DayState {
        region: state.region.clone(),
        date: state.date,
        status,
        bulletins,
    }
}

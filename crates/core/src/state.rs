// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use albina_audit::{AuditEvent, AuditScope, StateSnapshot};
use albina_domain::{Bulletin, BulletinId, BulletinStatus, RegionCode, format_date};
use time::Date;

/// The workflow state of one region on one forecast day.
///
/// `bulletins` holds every bulletin stored for the day, not only the ones
/// created by `region`, because saving releases regions from foreign
/// bulletins and accepting suggestions edits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayState {
    /// The region this state is scoped to.
    pub region: RegionCode,
    /// The forecast day this state is scoped to.
    pub date: Date,
    /// The region's status for the day.
    pub status: BulletinStatus,
    /// All bulletins of the day.
    pub bulletins: Vec<Bulletin>,
}

impl DayState {
    /// Creates a new state for a day nothing has been saved for yet.
    ///
    /// # Arguments
    ///
    /// * `region` - The region this state is scoped to
    /// * `date` - The forecast day
    #[must_use]
    pub const fn new(region: RegionCode, date: Date) -> Self {
        Self {
            region,
            date,
            status: BulletinStatus::Missing,
            bulletins: Vec::new(),
        }
    }

    /// Bulletins that hold or were created by the region.
    pub fn own_bulletins(&self) -> impl Iterator<Item = &Bulletin> {
        self.bulletins
            .iter()
            .filter(|b| b.is_created_by(&self.region) || b.regions.holds_within(&self.region))
    }

    /// Looks up a bulletin by identifier.
    #[must_use]
    pub fn find(&self, id: &BulletinId) -> Option<&Bulletin> {
        self.bulletins.iter().find(|b| b.id.as_ref() == Some(id))
    }

    /// Returns the audit scope of this state.
    #[must_use]
    pub fn scope(&self) -> AuditScope {
        AuditScope::new(self.region.clone(), self.date)
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(format!(
            "region={},date={},status={},bulletins={},own_bulletins={}",
            self.region,
            format_date(self.date),
            self.status,
            self.bulletins.len(),
            self.own_bulletins().count()
        ))
    }
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub new_state: DayState,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

//! Audit trail of bulletin workflow transitions.
//!
//! Each successful save, delete, update, submit or publish of a region's day
//! leaves one [`AuditEvent`]. Events are stored as written and never edited.

use albina_domain::{RegionCode, iso_date};
use serde::{Deserialize, Serialize};
use time::Date;

/// Who performed a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Forecaster username.
    pub username: String,
    /// Role the forecaster held when acting (`forecaster`, `admin`, ...).
    pub role: String,
}

impl Actor {
    #[must_use]
    pub const fn new(username: String, role: String) -> Self {
        Self { username, role }
    }
}

/// The request that triggered a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// Server-assigned request identifier, e.g. `http-42`.
    pub request_id: String,
    /// Free text, e.g. `submit requested by alice`.
    pub description: String,
}

impl Cause {
    #[must_use]
    pub const fn new(request_id: String, description: String) -> Self {
        Self {
            request_id,
            description,
        }
    }
}

/// What was done.
///
/// `name` is the command name (`SaveBulletins`, `Submit`, `Publish`, ...).
/// `details` carries command specifics such as the number of saved
/// bulletins or whether a publication was a correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub details: Option<String>,
}

impl Action {
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// Compact description of a region's day, e.g. `status=draft,bulletins=3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub summary: String,
}

impl StateSnapshot {
    #[must_use]
    pub const fn new(summary: String) -> Self {
        Self { summary }
    }

    /// Value of one `key=value` pair of the summary.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up, e.g. `status`
    ///
    /// # Returns
    ///
    /// The value, or `None` if the summary has no such key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.summary.split(',').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

/// The region and forecast day an audit event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditScope {
    pub region: RegionCode,
    #[serde(with = "iso_date")]
    pub date: Date,
}

impl AuditScope {
    #[must_use]
    pub const fn new(region: RegionCode, date: Date) -> Self {
        Self { region, date }
    }
}

/// One transition of a region's day.
///
/// Records who acted, on whose request, what they did, and the day's state
/// before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Store identifier, `None` until persisted.
    pub event_id: Option<i64>,
    pub scope: AuditScope,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
}

impl AuditEvent {
    /// Creates an event that has not been persisted yet.
    #[must_use]
    pub const fn new(
        scope: AuditScope,
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            scope,
            actor,
            cause,
            action,
            before,
            after,
        }
    }

    /// Returns the event tagged with its store identifier.
    #[must_use]
    pub fn with_event_id(self, event_id: i64) -> Self {
        Self {
            event_id: Some(event_id),
            ..self
        }
    }

    /// Whether the transition moved the day to a different status.
    #[must_use]
    pub fn changed_status(&self) -> bool {
        self.before.field("status") != self.after.field("status")
    }
}

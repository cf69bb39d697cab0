// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Query parameter names follow the wire contract (`startDate`, `endDate`).
//! Dates travel as ISO calendar days.

use albina_domain::{BulletinId, BulletinStatus, RegionCode, iso_date};
use serde::{Deserialize, Serialize};
use time::Date;

// ========================================================================
// Authentication
// ========================================================================

/// API request to log in and create a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The forecaster's username.
    pub username: String,
    /// The forecaster's password.
    pub password: String,
}

/// API response for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The bearer token for subsequent requests.
    pub access_token: String,
    /// The forecaster's username.
    pub username: String,
    /// The name shown as bulletin author.
    pub display_name: String,
    /// The region the session acts for.
    pub region: RegionCode,
    /// The forecaster's roles.
    pub roles: Vec<String>,
    /// Session expiration timestamp (RFC 3339).
    pub expires_at: String,
}

// ========================================================================
// Bulletins
// ========================================================================

/// Query for `GET /bulletins/edit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBulletinsQuery {
    /// The forecast day.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Comma-separated region codes; every bulletin of the day when absent.
    #[serde(default)]
    pub regions: Option<String>,
}

/// Query naming a region's day, shared by the workflow endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDayQuery {
    /// The forecast day.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The acting region.
    pub region: RegionCode,
}

/// Query for `POST /bulletins/publish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishQuery {
    /// The forecast day.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The acting region.
    pub region: RegionCode,
    /// The publication corrects an already published day.
    #[serde(default)]
    pub change: bool,
}

/// Query for `POST /bulletins/publish/all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishAllQuery {
    /// The forecast day.
    #[serde(with = "iso_date")]
    pub date: Date,
}

/// Query for `POST /bulletins/delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBulletinQuery {
    /// The forecast day.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The acting region.
    pub region: RegionCode,
    /// The bulletin to delete.
    pub id: BulletinId,
}

/// Query for `GET /bulletins/status/internal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    /// First day of the range (inclusive).
    #[serde(with = "iso_date")]
    pub start_date: Date,
    /// Last day of the range (inclusive).
    #[serde(with = "iso_date")]
    pub end_date: Date,
    /// The region.
    pub region: RegionCode,
}

/// Query for `GET /regions/locked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedRegionsQuery {
    /// The region.
    pub region: RegionCode,
}

/// The status of a region's day after a workflow action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// The region.
    pub region: RegionCode,
    /// The forecast day.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The region's new status.
    pub status: BulletinStatus,
}

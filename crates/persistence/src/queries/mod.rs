// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! - `audit`: audit events and per-day timelines
//! - `bulletins`: bulletins of a day and per-region workflow status
//! - `forecasters`: forecaster accounts and sessions

pub mod audit;
pub mod bulletins;
pub mod forecasters;

pub use audit::{get_audit_event, get_audit_timeline};
pub use bulletins::{
    get_bulletins, get_region_status, get_region_statuses, list_regions_with_status,
};
pub use forecasters::{
    count_forecasters, get_forecaster_by_id, get_forecaster_by_username, get_session_by_token,
    list_forecasters, verify_password,
};

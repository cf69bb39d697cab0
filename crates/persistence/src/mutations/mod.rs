// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! - `audit`: audit event persistence
//! - `bulletins`: bulletins and per-region status of a day, written together
//! - `forecasters`: forecaster accounts and sessions

pub mod audit;
pub mod bulletins;
pub mod forecasters;

pub use audit::persist_audit_event;
pub use bulletins::{persist_transition, upsert_region_status};
pub use forecasters::{
    create_forecaster, create_session, delete_expired_sessions, delete_session,
    disable_forecaster, update_last_login, update_session_activity,
};

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for collaborative bulletin authoring.
//!
//! Translates requests into core commands, enforces role and region
//! authorization, and maps domain, core and persistence errors to the
//! API contract. Transport concerns live in the server crate.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::{
    ApiResult, bootstrap_forecaster, check_bulletins, delete_bulletin, get_edit_bulletins,
    get_internal_status, get_locked_regions, login, logout, publish, publish_all, save_bulletins,
    start_update, submit,
};
pub use request_response::{
    DeleteBulletinQuery, EditBulletinsQuery, LockedRegionsQuery, LoginRequest, LoginResponse,
    PublishAllQuery, PublishQuery, RegionDayQuery, StatusQuery, StatusResponse,
};

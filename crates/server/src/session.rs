// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bearer-token session extraction.
//!
//! Every endpoint except login requires `Authorization: Bearer <token>`.
//! The token is bound to a forecaster and the region they act for.

use albina_api::{AuthenticatedActor, AuthenticationService};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::AppState;

const BEARER: &str = "Bearer ";

/// An authenticated forecaster, taken from the request's bearer token.
///
/// Rejects with HTTP 401 when no usable token is present or the session
/// is unknown, expired, or belongs to a disabled forecaster.
pub struct SessionForecaster {
    /// Who is acting, and for which region.
    pub actor: AuthenticatedActor,
    /// The bearer token the request carried.
    pub token: String,
}

impl FromRequestParts<AppState> for SessionForecaster {
    type Rejection = Unauthorized;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token: &str = bearer_token(&parts.headers)?;

        let mut persistence = state.persistence.lock().await;
        let (actor, _forecaster) = AuthenticationService::validate_session(&mut persistence, token)
            .map_err(|e| {
                warn!(error = %e, path = %parts.uri.path(), "Rejected session token");
                Unauthorized::Session(e.to_string())
            })?;
        drop(persistence);

        debug!(username = %actor.id, region = %actor.region, "Request authenticated");

        Ok(Self {
            actor,
            token: token.to_string(),
        })
    }
}

/// Pulls the token out of an `Authorization: Bearer` header.
///
/// # Errors
///
/// Returns `Unauthorized::NoToken` if the header is absent and
/// `Unauthorized::MalformedHeader` if it is not a non-empty bearer token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Unauthorized> {
    let value: &str = headers
        .get(AUTHORIZATION)
        .ok_or(Unauthorized::NoToken)?
        .to_str()
        .map_err(|_| Unauthorized::MalformedHeader)?;

    match value.strip_prefix(BEARER).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(Unauthorized::MalformedHeader),
    }
}

/// Why a request was not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unauthorized {
    /// No `Authorization` header.
    NoToken,
    /// The header is not `Bearer <token>`.
    MalformedHeader,
    /// The token does not name a live session.
    Session(String),
}

impl std::fmt::Display for Unauthorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoToken => write!(f, "Log in first: no session token was sent"),
            Self::MalformedHeader => {
                write!(f, "Authorization header must read 'Bearer <token>'")
            }
            Self::Session(reason) => write!(f, "Session rejected: {reason}"),
        }
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

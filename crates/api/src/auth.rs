// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use albina_audit::Actor;
use albina_domain::RegionCode;
use albina_persistence::{ForecasterData, PersistenceError, SessionData, SqlitePersistence};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::error::AuthError;

/// Forecaster roles for authorization.
///
/// A role decides which workflow actions a forecaster may trigger. The
/// region a forecaster acts for is tracked separately on the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Server administrators.
    ///
    /// Admins may act for any region and trigger the publication of all
    /// submitted regions of a day at once.
    Admin,
    /// Forecasters author, submit and publish the bulletins of their region.
    Forecaster,
    /// Foremen coordinate a region and have the same rights as forecasters.
    Foreman,
    /// Observers may read bulletins and statuses but never change them.
    Observer,
}

impl Role {
    /// Parses a stored role name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailed` if the name is unknown.
    pub fn parse(role: &str) -> Result<Self, AuthError> {
        match role.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "forecaster" => Ok(Self::Forecaster),
            "foreman" => Ok(Self::Foreman),
            "observer" => Ok(Self::Observer),
            _ => Err(AuthError::AuthenticationFailed {
                reason: format!("Invalid role: {role}"),
            }),
        }
    }

    /// Returns the stored name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Forecaster => "forecaster",
            Self::Foreman => "foreman",
            Self::Observer => "observer",
        }
    }

    const fn can_write(self) -> bool {
        !matches!(self, Self::Observer)
    }
}

/// An authenticated forecaster bound to the region they act for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The forecaster's username.
    pub id: String,
    /// The name shown as bulletin author.
    pub display_name: String,
    /// The role assigned to this forecaster.
    pub role: Role,
    /// The region this forecaster acts for.
    pub region: RegionCode,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(id: String, display_name: String, role: Role, region: RegionCode) -> Self {
        Self {
            id,
            display_name,
            role,
            region,
        }
    }

    /// Builds the actor from a stored forecaster record.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored role or region is invalid.
    pub fn from_forecaster(forecaster: &ForecasterData) -> Result<Self, AuthError> {
        let role: Role = Role::parse(&forecaster.role)?;
        let region: RegionCode =
            RegionCode::new(&forecaster.region).map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Invalid region of {}: {e}", forecaster.username),
            })?;

        Ok(Self::new(
            forecaster.username.clone(),
            forecaster.display_name.clone(),
            role,
            region,
        ))
    }

    /// Converts this actor into an audit Actor.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.id.clone(), String::from(self.role.as_str()))
    }
}

/// Authorization service for role and region based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the actor may change the bulletins of `region`.
    ///
    /// Observers never may. Everybody else may act for the region they are
    /// bound to and its sub-regions; admins may act for any region.
    ///
    /// # Arguments
    ///
    /// * `actor` - The authenticated actor
    /// * `region` - The region named in the request
    /// * `action` - The attempted action, for the error message
    ///
    /// # Errors
    ///
    /// Returns an error if the role or the region binding forbids the action.
    pub fn authorize_region_write(
        actor: &AuthenticatedActor,
        region: &RegionCode,
        action: &str,
    ) -> Result<(), AuthError> {
        if !actor.role.can_write() {
            return Err(AuthError::Unauthorized {
                action: String::from(action),
                required_role: String::from("forecaster"),
            });
        }

        if actor.role != Role::Admin && !region.is_within(&actor.region) {
            return Err(AuthError::RegionNotPermitted {
                username: actor.id.clone(),
                region: region.clone(),
            });
        }

        Ok(())
    }

    /// Checks that the actor may publish every submitted region of a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_publish_all(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Forecaster | Role::Foreman | Role::Observer => Err(AuthError::Unauthorized {
                action: String::from("publish_all"),
                required_role: String::from("admin"),
            }),
        }
    }
}

/// Authentication service for bearer-token sessions.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Default session lifetime.
    const DEFAULT_SESSION_EXPIRATION: Duration = Duration::hours(12);

    /// Authenticates a forecaster and creates a session.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `username` - The login name
    /// * `password` - The plain-text password
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `forecaster_data`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong, the forecaster is
    /// disabled, or the session cannot be stored.
    pub fn login(
        persistence: &mut SqlitePersistence,
        username: &str,
        password: &str,
    ) -> Result<(String, AuthenticatedActor, ForecasterData), AuthError> {
        let forecaster: ForecasterData = persistence
            .get_forecaster_by_username(username)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| {
                warn!(username, "Login attempt for unknown forecaster");
                AuthError::AuthenticationFailed {
                    reason: String::from("Invalid username or password"),
                }
            })?;

        let password_ok: bool =
            albina_persistence::verify_password(password, &forecaster.password_hash)
                .map_err(Self::map_persistence_error)?;
        if !password_ok {
            warn!(username, "Login attempt with wrong password");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Invalid username or password"),
            });
        }

        if forecaster.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Forecaster is disabled"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_forecaster(&forecaster)?;

        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime =
            OffsetDateTime::now_utc() + Self::DEFAULT_SESSION_EXPIRATION;
        let expires_at_str: String =
            expires_at
                .format(&Rfc3339)
                .map_err(|e| AuthError::AuthenticationFailed {
                    reason: format!("Failed to format expiration time: {e}"),
                })?;

        persistence
            .create_session(&session_token, forecaster.forecaster_id, &expires_at_str)
            .map_err(Self::map_persistence_error)?;
        persistence
            .update_last_login(forecaster.forecaster_id)
            .map_err(Self::map_persistence_error)?;

        info!(username = %forecaster.username, region = %actor.region, "Forecaster logged in");

        Ok((session_token, actor, forecaster))
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or the
    /// forecaster behind it is disabled.
    pub fn validate_session(
        persistence: &mut SqlitePersistence,
        session_token: &str,
    ) -> Result<(AuthenticatedActor, ForecasterData), AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = OffsetDateTime::parse(&session.expires_at, &Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })?;

        if OffsetDateTime::now_utc() > expires_at {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let forecaster: ForecasterData = persistence
            .get_forecaster_by_id(session.forecaster_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Forecaster not found"),
            })?;

        if forecaster.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Forecaster is disabled"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_forecaster(&forecaster)?;

        persistence
            .update_session_activity(session.session_id)
            .map_err(Self::map_persistence_error)?;

        debug!(username = %actor.id, "Session validated");
        Ok((actor, forecaster))
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be deleted.
    pub fn logout(
        persistence: &mut SqlitePersistence,
        session_token: &str,
    ) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(Self::map_persistence_error)
    }

    /// Deletes every session that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sessions cannot be deleted.
    pub fn purge_expired_sessions(
        persistence: &mut SqlitePersistence,
        now: OffsetDateTime,
    ) -> Result<usize, AuthError> {
        let now_str: String = now
            .format(&Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to format current time: {e}"),
            })?;

        persistence
            .delete_expired_sessions(&now_str)
            .map_err(Self::map_persistence_error)
    }

    fn generate_session_token() -> String {
        let timestamp: i128 = OffsetDateTime::now_utc().unix_timestamp_nanos();
        format!("session_{timestamp}_{:016x}", rand::random::<u64>())
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}

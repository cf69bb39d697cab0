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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod locks;
mod session;

use albina_api::{
    ApiError, ApiResult, DeleteBulletinQuery, EditBulletinsQuery, LockedRegionsQuery,
    LoginRequest, LoginResponse, PublishAllQuery, PublishQuery, RegionDayQuery, StatusQuery,
    StatusResponse, bootstrap_forecaster, check_bulletins, delete_bulletin, get_edit_bulletins,
    get_internal_status, get_locked_regions, login, logout, publish, publish_all, save_bulletins,
    start_update, submit, translate_persistence_error,
};
use albina_audit::{AuditEvent, Cause};
use albina_domain::{
    Bulletin, CheckCode, DEFAULT_TIMEZONE, LanguageCode, PublicationSchedule, RegionCode,
    RegionDayStatus, iso_date,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState, ws::WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use albina_persistence::SqlitePersistence;
use locks::{LockChannel, LockHub};
use session::SessionForecaster;

/// How often expired sessions are purged.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Source of per-request cause identifiers.
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Albina Server - HTTP and WebSocket server for collaborative bulletin authoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "ALBINA_DATABASE")]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, env = "ALBINA_PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(short, long, env = "ALBINA_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// IANA timezone the publication times are defined in
    #[arg(long, env = "ALBINA_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Languages every bulletin text must be provided in
    #[arg(
        long,
        env = "ALBINA_LANGUAGES",
        value_delimiter = ',',
        default_value = "de,it,en"
    )]
    languages: Vec<LanguageCode>,

    /// Forecaster to create on startup, as `username:password:region:role`
    #[arg(long = "bootstrap-user", env = "ALBINA_BOOTSTRAP_USERS", value_delimiter = ';')]
    bootstrap_users: Vec<String>,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// Bulletins, statuses, audit events, forecasters and sessions.
    persistence: Arc<Mutex<SqlitePersistence>>,
    /// Advisory locks and their broadcast channels.
    locks: LockHub,
    /// When bulletins of a day are published.
    schedule: PublicationSchedule,
    /// Languages checked for missing translations.
    languages: Arc<Vec<LanguageCode>>,
}

/// Query for `GET /audit/timeline`.
#[derive(Debug, Deserialize)]
struct AuditTimelineQuery {
    /// The forecast day.
    #[serde(with = "iso_date")]
    date: Date,
    /// The acting region.
    region: RegionCode,
}

/// Response to a write that does not return a body of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WriteResponse {
    /// Whether the operation succeeded.
    success: bool,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } | ApiError::RegionNotPermitted { .. } => {
                StatusCode::FORBIDDEN
            }
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Builds the cause recorded with a write request.
fn request_cause(username: &str, action: &str) -> Cause {
    let n: u64 = REQUEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    Cause::new(
        format!("http-{n}"),
        format!("{action} requested by {username}"),
    )
}

/// Logs the audit event of a successful write and unwraps its response.
fn finish<T>(result: ApiResult<T>) -> T {
    info!(
        event_id = ?result.audit_event.event_id,
        action = %result.audit_event.action.name,
        region = %result.audit_event.scope.region,
        date = %result.audit_event.scope.date,
        status_changed = result.audit_event.changed_status(),
        "Transition persisted"
    );
    result.response
}

// ========================================================================
// Authentication
// ========================================================================

/// Handler for POST `/authentication`.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(username = %req.username, "Handling login request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = login(&mut persistence, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/authentication/logout`.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
) -> Result<Json<WriteResponse>, HttpError> {
    info!(username = %session.actor.id, "Handling logout request");

    let mut persistence = app_state.persistence.lock().await;
    logout(&mut persistence, &session.token)?;
    drop(persistence);

    Ok(Json(WriteResponse {
        success: true,
        message: Some(String::from("Logged out")),
    }))
}

// ========================================================================
// Bulletins
// ========================================================================

/// Handler for GET `/bulletins/edit`.
async fn handle_get_edit_bulletins(
    AxumState(app_state): AxumState<AppState>,
    _session: SessionForecaster,
    Query(query): Query<EditBulletinsQuery>,
) -> Result<Json<Vec<Bulletin>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let bulletins: Vec<Bulletin> = get_edit_bulletins(&mut persistence, &query)?;
    drop(persistence);

    Ok(Json(bulletins))
}

/// Handler for POST `/bulletins`.
///
/// Replaces the acting region's bulletins of the day and returns them with
/// their assigned ids.
async fn handle_save_bulletins(
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Query(query): Query<RegionDayQuery>,
    Json(bulletins): Json<Vec<Bulletin>>,
) -> Result<Json<Vec<Bulletin>>, HttpError> {
    info!(
        username = %session.actor.id,
        region = %query.region,
        date = %query.date,
        count = bulletins.len(),
        "Handling save request"
    );

    let cause: Cause = request_cause(&session.actor.id, "save");
    let mut persistence = app_state.persistence.lock().await;
    let result: ApiResult<Vec<Bulletin>> = save_bulletins(
        &mut persistence,
        &app_state.schedule,
        &session.actor,
        &query,
        bulletins,
        OffsetDateTime::now_utc(),
        cause,
    )?;
    drop(persistence);

    Ok(Json(finish(result)))
}

/// Handler for POST `/bulletins/delete`.
async fn handle_delete_bulletin(
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Query(query): Query<DeleteBulletinQuery>,
) -> Result<Json<StatusResponse>, HttpError> {
    info!(
        username = %session.actor.id,
        region = %query.region,
        bulletin = %query.id,
        "Handling delete request"
    );

    let cause: Cause = request_cause(&session.actor.id, "delete");
    let mut persistence = app_state.persistence.lock().await;
    let result: ApiResult<StatusResponse> = delete_bulletin(
        &mut persistence,
        &app_state.schedule,
        &session.actor,
        &query,
        cause,
    )?;
    drop(persistence);

    Ok(Json(finish(result)))
}

/// Handler for POST `/bulletins/update`.
async fn handle_start_update(
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Query(query): Query<RegionDayQuery>,
) -> Result<Json<StatusResponse>, HttpError> {
    info!(username = %session.actor.id, region = %query.region, date = %query.date, "Handling update request");

    let cause: Cause = request_cause(&session.actor.id, "update");
    let mut persistence = app_state.persistence.lock().await;
    let result: ApiResult<StatusResponse> = start_update(
        &mut persistence,
        &app_state.schedule,
        &session.actor,
        &query,
        OffsetDateTime::now_utc(),
        cause,
    )?;
    drop(persistence);

    Ok(Json(finish(result)))
}

/// Handler for POST `/bulletins/submit`.
async fn handle_submit(
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Query(query): Query<RegionDayQuery>,
) -> Result<Json<StatusResponse>, HttpError> {
    info!(username = %session.actor.id, region = %query.region, date = %query.date, "Handling submit request");

    let cause: Cause = request_cause(&session.actor.id, "submit");
    let mut persistence = app_state.persistence.lock().await;
    let result: ApiResult<StatusResponse> = submit(
        &mut persistence,
        &app_state.schedule,
        &session.actor,
        &query,
        cause,
    )?;
    drop(persistence);

    Ok(Json(finish(result)))
}

/// Handler for POST `/bulletins/publish`.
async fn handle_publish(
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Query(query): Query<PublishQuery>,
) -> Result<Json<StatusResponse>, HttpError> {
    info!(
        username = %session.actor.id,
        region = %query.region,
        date = %query.date,
        change = query.change,
        "Handling publish request"
    );

    let cause: Cause = request_cause(&session.actor.id, "publish");
    let mut persistence = app_state.persistence.lock().await;
    let result: ApiResult<StatusResponse> = publish(
        &mut persistence,
        &app_state.schedule,
        &session.actor,
        &query,
        OffsetDateTime::now_utc(),
        cause,
    )?;
    drop(persistence);

    Ok(Json(finish(result)))
}

/// Handler for POST `/bulletins/publish/all`.
async fn handle_publish_all(
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Query(query): Query<PublishAllQuery>,
) -> Result<Json<Vec<StatusResponse>>, HttpError> {
    info!(username = %session.actor.id, date = %query.date, "Handling publish all request");

    let cause: Cause = request_cause(&session.actor.id, "publish all");
    let mut persistence = app_state.persistence.lock().await;
    let published: Vec<StatusResponse> = publish_all(
        &mut persistence,
        &app_state.schedule,
        &session.actor,
        &query,
        OffsetDateTime::now_utc(),
        &cause,
    )?;
    drop(persistence);

    info!(published = published.len(), "Publish all finished");
    Ok(Json(published))
}

/// Handler for GET `/bulletins/check`.
async fn handle_check_bulletins(
    AxumState(app_state): AxumState<AppState>,
    _session: SessionForecaster,
    Query(query): Query<RegionDayQuery>,
) -> Result<Json<Vec<CheckCode>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let codes: Vec<CheckCode> = check_bulletins(&mut persistence, &query, &app_state.languages)?;
    drop(persistence);

    Ok(Json(codes))
}

/// Handler for GET `/bulletins/status/internal`.
async fn handle_get_internal_status(
    AxumState(app_state): AxumState<AppState>,
    _session: SessionForecaster,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<RegionDayStatus>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let statuses: Vec<RegionDayStatus> = get_internal_status(&mut persistence, &query)?;
    drop(persistence);

    Ok(Json(statuses))
}

// ========================================================================
// Locks
// ========================================================================

/// Handler for GET `/regions/locked`.
async fn handle_get_locked_regions(
    AxumState(app_state): AxumState<AppState>,
    _session: SessionForecaster,
    Query(query): Query<LockedRegionsQuery>,
) -> Json<Vec<String>> {
    let registry = app_state.locks.registry.lock().await;
    Json(get_locked_regions(&registry, &query))
}

/// Upgrades a lock channel connection after checking the path names the
/// session's forecaster.
fn upgrade_lock_channel(
    ws: WebSocketUpgrade,
    app_state: AppState,
    session: &SessionForecaster,
    username: String,
    channel: LockChannel,
) -> Result<Response, HttpError> {
    if session.actor.id != username {
        warn!(
            session = %session.actor.id,
            requested = %username,
            "Rejecting lock channel for another forecaster"
        );
        return Err(HttpError {
            status: StatusCode::FORBIDDEN,
            message: format!("Session may not open the lock channel of '{username}'"),
        });
    }

    let hub: LockHub = app_state.locks;
    Ok(ws.on_upgrade(move |socket| locks::handle_socket(socket, hub, channel, username)))
}

/// Handler for GET `/ws/region/{username}`.
async fn handle_region_socket(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    upgrade_lock_channel(ws, app_state, &session, username, LockChannel::Region)
}

/// Handler for GET `/ws/bulletin/{username}`.
async fn handle_bulletin_socket(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
    session: SessionForecaster,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    upgrade_lock_channel(ws, app_state, &session, username, LockChannel::Bulletin)
}

// ========================================================================
// Audit
// ========================================================================

/// Handler for GET `/audit/timeline`.
async fn handle_get_audit_timeline(
    AxumState(app_state): AxumState<AppState>,
    _session: SessionForecaster,
    Query(query): Query<AuditTimelineQuery>,
) -> Result<Json<Vec<AuditEvent>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let events: Vec<AuditEvent> = persistence
        .get_audit_timeline(&query.region, query.date)
        .map_err(translate_persistence_error)?;
    drop(persistence);

    Ok(Json(events))
}

/// Handler for GET `/audit/event/{event_id}`.
async fn handle_get_audit_event(
    AxumState(app_state): AxumState<AppState>,
    _session: SessionForecaster,
    Path(event_id): Path<i64>,
) -> Result<Json<AuditEvent>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let event: AuditEvent = persistence
        .get_audit_event(event_id)
        .map_err(translate_persistence_error)?;
    drop(persistence);

    Ok(Json(event))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/authentication", post(handle_login))
        .route("/authentication/logout", post(handle_logout))
        .route("/bulletins", post(handle_save_bulletins))
        .route("/bulletins/edit", get(handle_get_edit_bulletins))
        .route("/bulletins/delete", post(handle_delete_bulletin))
        .route("/bulletins/update", post(handle_start_update))
        .route("/bulletins/submit", post(handle_submit))
        .route("/bulletins/publish", post(handle_publish))
        .route("/bulletins/publish/all", post(handle_publish_all))
        .route("/bulletins/check", get(handle_check_bulletins))
        .route("/bulletins/status/internal", get(handle_get_internal_status))
        .route("/regions/locked", get(handle_get_locked_regions))
        .route("/ws/region/{username}", get(handle_region_socket))
        .route("/ws/bulletin/{username}", get(handle_bulletin_socket))
        .route("/audit/timeline", get(handle_get_audit_timeline))
        .route("/audit/event/{event_id}", get(handle_get_audit_event))
        .with_state(app_state)
}

/// Creates the forecasters named on the command line.
///
/// # Errors
///
/// Returns an error if a definition is malformed or cannot be stored.
fn bootstrap_users(
    persistence: &mut SqlitePersistence,
    definitions: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    for definition in definitions {
        let parts: Vec<&str> = definition.splitn(4, ':').collect();
        let [username, password, region, role] = parts.as_slice() else {
            return Err(format!(
                "Invalid bootstrap user '{definition}', expected username:password:region:role"
            )
            .into());
        };

        if bootstrap_forecaster(persistence, username, password, region, role)? {
            info!(%username, %region, %role, "Bootstrapped forecaster");
        } else {
            info!(%username, "Forecaster already exists, skipping bootstrap");
        }
    }
    Ok(())
}

/// Purges expired sessions once per interval for the lifetime of the server.
fn spawn_session_purge(persistence: Arc<Mutex<SqlitePersistence>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let mut persistence = persistence.lock().await;
            match albina_api::AuthenticationService::purge_expired_sessions(
                &mut persistence,
                OffsetDateTime::now_utc(),
            ) {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged expired sessions"),
                Err(e) => warn!(error = %e, "Failed to purge expired sessions"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Albina Server");

    let mut persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    bootstrap_users(&mut persistence, &args.bootstrap_users)?;

    let schedule: PublicationSchedule = PublicationSchedule::new(&args.timezone)?;
    info!(timezone = %args.timezone, languages = ?args.languages, "Publication schedule configured");

    let persistence: Arc<Mutex<SqlitePersistence>> = Arc::new(Mutex::new(persistence));
    spawn_session_purge(Arc::clone(&persistence));

    let app_state: AppState = AppState {
        persistence,
        locks: LockHub::new(),
        schedule,
        languages: Arc::new(args.languages),
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

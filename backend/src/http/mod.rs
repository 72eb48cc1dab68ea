// HTTP handlers and routing.

use axum::extract::rejection::JsonRejection;
use axum::extract::State as AxumState;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use rover_telemetry_core::constants::SOCKET_PATH;
use rover_telemetry_core::model::Role;

use crate::app::AppState;
use crate::auth::{LoginRequest, RegisterRequest};
use crate::constants::SYSTEM_NAME;
use crate::error::{AuthError, AuthResult};
use crate::users::UserRecord;
use crate::utils::uptime_secs;
use crate::ws::ws_handler;

mod types;
use types::*;

pub fn router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/admin/stats", get(admin_stats))
        .route(SOCKET_PATH, get(ws_handler))
        .route(&format!("{SOCKET_PATH}/"), get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> impl IntoResponse {
    Json(RootResponse {
        status: "Online",
        system: SYSTEM_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn register(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let Json(request) = payload.map_err(reject_body)?;
    let response = app_state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let Json(request) = payload.map_err(reject_body)?;
    let response = app_state.auth.login(request).await?;
    Ok(Json(response))
}

async fn admin_stats(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let user = authorize(&app_state, &headers).await?;
    if !has_clearance(user.role) {
        return Err(AuthError::Forbidden);
    }

    let users = app_state.auth.users();
    Ok(Json(AdminStatsResponse {
        users: users.count().await?,
        uptime_secs: uptime_secs(app_state.start_instant),
        store: users.status(),
        active_connections: app_state.connections.active(),
        total_connections: app_state.connections.total(),
        commands_received: app_state.connections.commands(),
    }))
}

fn reject_body(rejection: JsonRejection) -> AuthError {
    debug!(%rejection, "rejected request body");
    AuthError::InvalidUserData
}

async fn authorize(app_state: &AppState, headers: &HeaderMap) -> AuthResult<UserRecord> {
    let token = bearer_token(headers).ok_or(AuthError::InvalidToken)?;
    app_state.auth.authenticate(token).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn has_clearance(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Operator)
}

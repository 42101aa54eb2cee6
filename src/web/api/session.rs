use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::session::{SessionError, SessionStatus};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartRequest {
    pub satellite_id: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

#[utoipa::path(
    post,
    path = "/api/session/start",
    request_body = StartRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Tracking started", body = SessionStatus),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn start(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<SessionStatus>> {
    require_permission(&user, Permission::Control)?;
    log::info!(
        "tracking of satellite {} requested by {}",
        request.satellite_id,
        user.name
    );

    let mut controller = state.controller.lock().await;
    controller
        .start(request.satellite_id)
        .await
        .map_err(map_session_error)?;

    Ok(Json(controller.status()))
}

#[utoipa::path(
    post,
    path = "/api/session/stop",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Tracking stopped", body = SessionStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn stop(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<SessionStatus>> {
    require_permission(&user, Permission::Control)?;

    let mut controller = state.controller.lock().await;
    controller.stop().await;
    Ok(Json(controller.status()))
}

#[utoipa::path(
    get,
    path = "/api/session/status",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Session snapshot", body = SessionStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<SessionStatus>> {
    require_permission(&user, Permission::ReadStatus)?;

    let controller = state.controller.lock().await;
    Ok(Json(controller.status()))
}

#[utoipa::path(
    delete,
    path = "/api/session/error",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Error dismissed", body = SessionStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn dismiss_error(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<SessionStatus>> {
    require_permission(&user, Permission::Control)?;

    let controller = state.controller.lock().await;
    controller.dismiss_error();
    Ok(Json(controller.status()))
}

#[utoipa::path(
    post,
    path = "/api/session/location/manual",
    request_body = ManualLocationRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Manual location set", body = SessionStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn set_manual_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ManualLocationRequest>,
) -> ApiResult<Json<SessionStatus>> {
    require_permission(&user, Permission::Control)?;

    let controller = state.controller.lock().await;
    controller.set_manual_location(request.latitude, request.longitude, request.altitude_m);
    Ok(Json(controller.status()))
}

#[utoipa::path(
    post,
    path = "/api/session/location/refresh",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Location refreshed from source", body = SessionStatus),
        (status = 503, description = "Location source unavailable", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn refresh_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<SessionStatus>> {
    require_permission(&user, Permission::Control)?;

    let controller = state.controller.lock().await;
    controller
        .refresh_location()
        .await
        .map_err(map_session_error)?;
    Ok(Json(controller.status()))
}

fn map_session_error(err: SessionError) -> ApiError {
    match err {
        SessionError::InvalidSatelliteId(_)
        | SessionError::NoLocation
        | SessionError::IncompleteLocation => ApiError::Validation(err.to_string()),
        SessionError::Location(e) => ApiError::Unavailable(e.to_string()),
    }
}

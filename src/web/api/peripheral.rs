use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::peripheral::{LinkError, LinkState};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkStateResponse {
    pub state: LinkState,
}

#[utoipa::path(
    post,
    path = "/api/peripheral/connect",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Connection attempt started", body = LinkStateResponse),
        (status = 409, description = "No peripheral address configured", body = ErrorResponse),
        (status = 503, description = "Adapter unusable", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "peripheral"
)]
pub async fn connect(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<LinkStateResponse>> {
    require_permission(&user, Permission::Control)?;

    let settings = state
        .settings
        .load()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let mac = settings
        .peripheral_mac
        .ok_or(ApiError::Conflict("peripheral_mac_not_configured"))?;

    state
        .link
        .connect(mac.as_str())
        .await
        .map_err(map_link_error)?;

    Ok(Json(LinkStateResponse {
        state: state.link.state(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/peripheral/disconnect",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Disconnected", body = LinkStateResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "peripheral"
)]
pub async fn disconnect(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<LinkStateResponse>> {
    require_permission(&user, Permission::Control)?;

    state.link.disconnect().await;
    Ok(Json(LinkStateResponse {
        state: state.link.state(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/peripheral/state",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Link state", body = LinkStateResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "peripheral"
)]
pub async fn link_state(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<LinkStateResponse>> {
    require_permission(&user, Permission::ReadStatus)?;

    Ok(Json(LinkStateResponse {
        state: state.link.state(),
    }))
}

fn map_link_error(err: LinkError) -> ApiError {
    match err {
        LinkError::InvalidAddress(_) => ApiError::Validation(err.to_string()),
        LinkError::AdapterMissing | LinkError::AdapterDisabled | LinkError::NotAuthorized => {
            ApiError::Unavailable(err.to_string())
        }
        other => ApiError::Internal(other.to_string()),
    }
}

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::settings::SettingsError;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

/// The credential itself is never echoed back.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub api_key_configured: bool,
    pub peripheral_mac: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialRequest {
    pub value: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MacRequest {
    pub value: String,
}

#[utoipa::path(
    get,
    path = "/api/settings",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Current settings", body = SettingsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<SettingsResponse>> {
    require_permission(&user, Permission::ReadStatus)?;
    respond(&state)
}

#[utoipa::path(
    put,
    path = "/api/settings/credential",
    request_body = CredentialRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Credential saved", body = SettingsResponse),
        (status = 400, description = "Invalid credential format", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn put_credential(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CredentialRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    require_permission(&user, Permission::ManageSettings)?;
    log::info!("credential update by {}", user.name);

    state
        .settings
        .save_api_key(&request.value)
        .map_err(map_settings_error)?;

    // Propagate to the live session so the next poll cycle uses it.
    state
        .controller
        .lock()
        .await
        .update_credential(Some(request.value.trim().to_string()));

    respond(&state)
}

#[utoipa::path(
    put,
    path = "/api/settings/peripheral-mac",
    request_body = MacRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Peripheral address saved", body = SettingsResponse),
        (status = 400, description = "Invalid address format", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn put_mac(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<MacRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    require_permission(&user, Permission::ManageSettings)?;

    // An empty value clears the configured address.
    if request.value.trim().is_empty() {
        state
            .settings
            .clear_peripheral_mac()
            .map_err(map_settings_error)?;
    } else {
        state
            .settings
            .save_peripheral_mac(&request.value)
            .map_err(map_settings_error)?;
    }

    respond(&state)
}

fn respond(state: &AppState) -> ApiResult<Json<SettingsResponse>> {
    let settings = state
        .settings
        .load()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(SettingsResponse {
        api_key_configured: settings.api_key.is_some(),
        peripheral_mac: settings.peripheral_mac.map(|m| m.to_string()),
    }))
}

fn map_settings_error(err: SettingsError) -> ApiError {
    match err {
        SettingsError::InvalidApiKey | SettingsError::InvalidMac(_) => {
            ApiError::Validation(err.to_string())
        }
        other => ApiError::Internal(other.to_string()),
    }
}

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::peripheral::LinkStateResponse;
use super::api::session::{ManualLocationRequest, StartRequest};
use super::api::settings::{CredentialRequest, MacRequest, SettingsResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::session::start,
        super::api::session::stop,
        super::api::session::status,
        super::api::session::dismiss_error,
        super::api::session::set_manual_location,
        super::api::session::refresh_location,
        super::api::peripheral::connect,
        super::api::peripheral::disconnect,
        super::api::peripheral::link_state,
        super::api::settings::get_settings,
        super::api::settings::put_credential,
        super::api::settings::put_mac,
    ),
    components(
        schemas(
            StartRequest,
            ManualLocationRequest,
            LinkStateResponse,
            SettingsResponse,
            CredentialRequest,
            MacRequest,
            ErrorResponse,
            crate::session::SessionStatus,
            crate::position::PositionSample,
            crate::position::SatelliteId,
            crate::location::ObserverLocation,
            crate::peripheral::LinkState,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Skytrack API",
        description = "Satellite tracking session and pointer peripheral control",
        version = "0.1.0"
    ),
    tags(
        (name = "session", description = "Tracking session control"),
        (name = "peripheral", description = "Pointer peripheral link"),
        (name = "settings", description = "Credential and peripheral settings")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

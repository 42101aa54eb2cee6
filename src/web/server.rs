use axum::{routing::delete, routing::get, routing::post, routing::put, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::location::{FixedLocationSource, LocationSource, ObserverLocation};
use crate::peripheral::{NoAdapterTransport, PeripheralLink};
use crate::position::{HttpTransport, PositionClient};
use crate::session::SessionController;
use crate::settings::{Settings, SettingsStore};

use super::api::peripheral as peripheral_handlers;
use super::api::session as session_handlers;
use super::api::settings as settings_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::Config;

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let settings_store = Arc::new(SettingsStore::new(config.settings.file.clone()));
    let stored = settings_store.load().unwrap_or_else(|e| {
        log::warn!("failed to load settings: {}", e);
        Settings::default()
    });

    let transport =
        HttpTransport::new(config.upstream.base_url.clone()).map_err(std::io::Error::other)?;
    let client = Arc::new(PositionClient::new(Arc::new(transport)));

    let observer = config
        .observer
        .as_ref()
        .and_then(|o| ObserverLocation::from_coordinates(&o.coordinates, Some(o.altitude_m)));
    if config.observer.is_some() && observer.is_none() {
        log::warn!("invalid observer coordinates in config, starting without a location");
    }
    let source: Arc<dyn LocationSource> = Arc::new(FixedLocationSource::new(observer));

    // The platform wireless backend plugs in here; without one, connect
    // attempts fail fast with a missing adapter.
    let link = PeripheralLink::new(Arc::new(NoAdapterTransport));

    let mut controller = SessionController::new(
        client,
        source,
        link.clone(),
        config.tracking.poll_interval,
    );
    controller.update_credential(stored.api_key.clone());
    if let Err(e) = controller.refresh_location().await {
        log::warn!("no initial observer location: {}", e);
    }

    let state = AppState {
        config: Arc::new(config),
        controller: Arc::new(Mutex::new(controller)),
        link,
        settings: settings_store,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Session API endpoints
        .route("/api/session/start", post(session_handlers::start))
        .route("/api/session/stop", post(session_handlers::stop))
        .route("/api/session/status", get(session_handlers::status))
        .route("/api/session/error", delete(session_handlers::dismiss_error))
        .route(
            "/api/session/location/manual",
            post(session_handlers::set_manual_location),
        )
        .route(
            "/api/session/location/refresh",
            post(session_handlers::refresh_location),
        )
        // Peripheral API endpoints
        .route(
            "/api/peripheral/connect",
            post(peripheral_handlers::connect),
        )
        .route(
            "/api/peripheral/disconnect",
            post(peripheral_handlers::disconnect),
        )
        .route("/api/peripheral/state", get(peripheral_handlers::link_state))
        // Settings API endpoints
        .route("/api/settings", get(settings_handlers::get_settings))
        .route(
            "/api/settings/credential",
            put(settings_handlers::put_credential),
        )
        .route(
            "/api/settings/peripheral-mac",
            put(settings_handlers::put_mac),
        )
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}

pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod persist;
pub mod rooms;
pub mod routes;
pub mod services;
pub mod storage;
pub mod websocket;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::docs::ApiDoc;
use crate::persist::{SaveDebouncer, SnapshotRegister};
use crate::rooms::RoomRegistry;
use crate::services::bootstrap_service::BootstrapService;
use crate::storage::DocumentStore;

/// Shared state for every connection task and API handler.
///
/// Everything in here is an injected service: the registry, the debouncer
/// and the store are constructed once at startup (or per test) and shared,
/// never reached through globals.
pub struct AppState {
    pub config: Config,
    pub rooms: Arc<RoomRegistry>,
    pub saver: Arc<SaveDebouncer>,
    pub snapshots: Arc<SnapshotRegister>,
    pub store: Arc<dyn DocumentStore>,
    pub bootstrap: BootstrapService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Arc<Self> {
        let rooms = Arc::new(RoomRegistry::new(config.broadcast_capacity));
        let snapshots = Arc::new(SnapshotRegister::new());
        let saver = Arc::new(SaveDebouncer::new(
            Duration::from_millis(config.save_debounce_ms),
            store.clone(),
            rooms.clone(),
        ));
        let bootstrap = BootstrapService::new(store.clone());
        Arc::new(Self {
            config,
            rooms,
            saver,
            snapshots,
            store,
            bootstrap,
        })
    }
}

/// Assemble the full application router: collaboration socket, API routes,
/// Swagger UI, tracing and CORS.
pub fn build_app(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config);
    let api_routes = routes::api::create_api_routes(app_state.clone());

    Router::new()
        // The collaboration socket
        .route("/ws", get(websocket::handler::websocket_handler))
        .with_state(app_state)
        // Mount API routes
        .nest("/api", api_routes)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .allow_credentials(true)
        }
        None => CorsLayer::permissive(),
    }
}

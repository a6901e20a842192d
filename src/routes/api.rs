use crate::{handlers::{diagnostics, doc_presence, health_check, ready_check}, routes::auth_middleware::auth_middleware, AppState};
use axum::{middleware, routing::get, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(app_state: Arc<AppState>) -> Router {
    Router::<Arc<AppState>>::new()
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/documents/:doc_id/presence", get(doc_presence))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware)) // Applies to all routes added above
        .route("/v1/health", get(health_check))
        .route("/v1/ready", get(ready_check))
        .with_state(app_state)
}

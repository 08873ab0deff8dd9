//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{get_patient, health, predict, ready};
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/predict", post(predict))
        .route("/patients/:patient_id", get(get_patient));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        // Uploads are whole MRI scans; lift both axum's default cap and
        // the tower-http limit to the configured size.
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

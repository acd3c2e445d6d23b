use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::auth::{api as auth_api, auth_middleware, AuthState};
use crate::middleware::request_logging;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Create the API router
pub fn create_router(auth_state: AuthState) -> Router {
    let jwt_handler = auth_state.service.jwt_handler();

    // Public auth routes
    let auth_router = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .with_state(auth_state);

    // Token-protected routes
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::get_current_user))
        .route_layer(middleware::from_fn_with_state(jwt_handler, auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_router)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Recommendation API
        .route("/api/recommendations", post(handlers::recommendations))
        .route("/api/cache/invalidate", post(handlers::invalidate_cache))
        // Provider administration
        .route("/api/breakers", get(handlers::breakers))
        .route("/api/breakers/reset", post(handlers::reset_breakers))
        .route("/api/stats", get(handlers::stats))
        // Per-user persistence
        .route("/api/saved", post(handlers::save_item))
        .route("/api/saved/:user_id", get(handlers::saved_items))
        .route("/api/saved/:user_id/:item_id", delete(handlers::remove_item))
        .route("/api/feedback", post(handlers::record_feedback))
        .layer(cors)
        .with_state(state)
}

pub mod routes;
pub mod ws;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// API routes, the WebSocket endpoint, and the static dashboard as fallback.
pub fn router(state: Arc<AppState>) -> Router {
    let dashboard_dir = state.config.dashboard_dir.clone();

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/defaults", get(routes::get_defaults))
        .route("/api/payoff", post(routes::post_payoff))
        .route("/api/heatmap", post(routes::post_heatmap))
        .route("/api/counters", get(routes::get_counters))
        .route("/ws", get(ws::ws_handler))
        .fallback_service(
            tower_http::services::ServeDir::new(&dashboard_dir)
                .fallback(tower_http::services::ServeFile::new(dashboard_dir.join("index.html"))),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

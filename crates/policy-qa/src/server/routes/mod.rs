//! HTTP routes

pub mod analyze;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/analyze", post(analyze::analyze_policy))
        .route("/test", post(analyze::run_sample))
}

//! Service information and health

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// GET / - API information
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Insurance Policy Analyzer API",
        "version": env!("CARGO_PKG_VERSION"),
        "default_strategy": state.pipeline().default_strategy(),
        "endpoints": {
            "analyze": "/analyze",
            "health": "/health",
            "test": "/test"
        }
    }))
}

/// GET /health - per-capability health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let services = state.services().health().await;
    let status = if services.all_available() {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "service": "Insurance Policy Analyzer",
        "services": services,
    }))
}

//! Health endpoints

use axum::Json;
use serde_json::{json, Value};

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "agentflow",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /live
pub async fn live_check() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

/// GET /health - Liveness with version info and tool count
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.mcp.server_info().name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
        "uptime_seconds": state.started.elapsed().as_secs(),
        "tools": state.dispatcher.list_tools().len(),
    }))
}

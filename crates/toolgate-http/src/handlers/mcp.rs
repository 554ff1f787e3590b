use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::error::HttpError;
use crate::server::AppState;

/// POST /mcp - One JSON-RPC message per request
///
/// Responses are JSON-RPC objects with status 200, including protocol errors.
/// Notifications get `202 Accepted` with an empty body.
pub async fn json_rpc(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, HttpError> {
    let Json(message) = payload?;

    Ok(match state.mcp.handle_value(message).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    })
}

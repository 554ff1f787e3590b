//! Request/response tool endpoints

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::Serialize;
use toolgate_core::{CallToolResult, InvocationRequest, ToolDescriptor};
use tracing::debug;

use crate::error::HttpError;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDescriptor>,
}

/// GET /tools - List registered tools with their input schemas
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state.dispatcher.list_tools().to_vec();
    debug!(count = tools.len(), "Listing tools");
    Json(ToolListResponse { tools })
}

/// POST /tools/call - Invoke a tool
///
/// Tool-level failures are returned as `200 OK` with `isError: true`; only a
/// body that cannot be read as `{name, arguments?}` is rejected.
pub async fn call_tool(
    State(state): State<AppState>,
    payload: Result<Json<InvocationRequest>, JsonRejection>,
) -> Result<Json<CallToolResult>, HttpError> {
    let Json(request) = payload?;
    Ok(Json(state.dispatcher.dispatch(request).await))
}

//! Transport-independent JSON-RPC request handling
//!
//! [`McpHandler`] turns one inbound message into at most one response. The
//! stdio transport and the HTTP `/mcp` endpoint both drive it, so method
//! routing and error mapping are identical on every channel.

use crate::protocol::{
    DEFAULT_PROTOCOL_VERSION, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerInfo, methods,
};
use serde::Serialize;
use serde_json::{Value, json};
use toolgate_core::{Dispatcher, InvocationRequest};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct McpHandler {
    dispatcher: Dispatcher,
    server_info: ServerInfo,
}

impl McpHandler {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            server_info: ServerInfo::default(),
        }
    }

    #[must_use]
    pub fn with_server_info(mut self, server_info: ServerInfo) -> Self {
        self.server_info = server_info;
        self
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one line of text. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_value(value).await,
            Err(err) => {
                warn!(error = %err, "Discarding unparsable message");
                Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(err),
                ))
            }
        }
    }

    /// Handle an already decoded JSON message.
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.handle_request(request).await,
            Err((id, message)) => {
                warn!(%message, "Rejecting invalid request");
                Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(message),
                ))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        debug!(method = %request.method, %id, "Request received");
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => self.initialize(request.params.as_ref()),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST | methods::LIST_TOOLS => to_result(&ListToolsResult {
                tools: self.dispatcher.list_tools(),
            }),
            methods::TOOLS_CALL | methods::CALL_TOOL => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::result(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Result<Value, JsonRpcError> {
        let protocol_version = params
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        to_result(&InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: json!({"tools": {"listChanged": false}}),
            server_info: self.server_info.clone(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
        let request: InvocationRequest =
            serde_json::from_value(params).map_err(JsonRpcError::invalid_params)?;

        let result = self.dispatcher.dispatch(request).await;
        to_result(&result)
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(JsonRpcError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
    use toolgate_testing::{MockTool, dispatcher_with};

    fn handler() -> McpHandler {
        McpHandler::new(dispatcher_with([MockTool::echo("echo")]))
    }

    #[tokio::test]
    async fn test_initialize_echoes_client_protocol_version() {
        let response = handler()
            .handle_line(r#"{"jsonrpc":"2.0","id":"1","method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(response.id, json!("1"));
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "toolgate");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_list_aliases_agree() {
        let handler = handler();
        let modern = handler
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await
            .unwrap();
        let legacy = handler
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"listTools"}"#)
            .await
            .unwrap();
        assert_eq!(modern.result, legacy.result);
        assert_eq!(modern.result.unwrap()["tools"][0]["name"], "echo");
    }

    #[tokio::test]
    async fn test_call_tool() {
        let response = handler()
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0], json!({"type": "text", "text": "hi"}));
    }

    #[tokio::test]
    async fn test_tool_errors_are_results_not_rpc_errors() {
        let response = handler()
            .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"callTool","params":{"name":"unknownTool","arguments":{}}}"#)
            .await
            .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "未知工具: unknownTool");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let handler = handler();

        let parse = handler.handle_line("{not json").await.unwrap();
        assert_eq!(parse.error.unwrap().code, PARSE_ERROR);
        assert_eq!(parse.id, Value::Null);

        let invalid = handler.handle_line(r#"{"jsonrpc":"2.0","id":4}"#).await.unwrap();
        assert_eq!(invalid.error.unwrap().code, INVALID_REQUEST);

        let unknown = handler
            .handle_line(r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(unknown.error.unwrap().code, METHOD_NOT_FOUND);

        let params = handler
            .handle_line(r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"arguments":{}}}"#)
            .await
            .unwrap();
        assert_eq!(params.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_notifications_are_not_answered() {
        let response = handler()
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }
}

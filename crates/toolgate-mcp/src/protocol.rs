//! JSON-RPC 2.0 message types and the MCP-style result payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_core::ToolDescriptor;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision reported when the client does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Methods understood by the server.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    /// Legacy spelling of `tools/list`
    pub const LIST_TOOLS: &str = "listTools";
    /// Legacy spelling of `tools/call`
    pub const CALL_TOOL: &str = "callTool";
}

/// A parsed request or notification.
///
/// `id` is `None` for notifications. An explicit `"id": null` is kept as
/// `Some(Value::Null)` and answered.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Check the envelope of a decoded JSON value.
    ///
    /// On failure returns the id to answer with (null when it cannot be
    /// recovered) and a description of the problem.
    pub fn from_value(value: Value) -> Result<Self, (Value, String)> {
        let mut object = match value {
            Value::Object(object) => object,
            Value::Array(_) => {
                return Err((Value::Null, "batch requests are not supported".into()));
            }
            _ => return Err((Value::Null, "request must be a JSON object".into())),
        };

        let id = object.remove("id");
        let reply_id = match &id {
            Some(id @ (Value::Null | Value::String(_) | Value::Number(_))) => id.clone(),
            Some(_) => return Err((Value::Null, "id must be a string, number or null".into())),
            None => Value::Null,
        };

        match object.get("jsonrpc") {
            None => {}
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            Some(other) => {
                return Err((reply_id, format!("unsupported jsonrpc version {other}")));
            }
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => return Err((reply_id, "method must be a string".into())),
            None => return Err((reply_id, "missing method".into())),
        };

        Ok(Self {
            id,
            method,
            params: object.remove("params").filter(|params| !params.is_null()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {detail}"))
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_REQUEST, format!("Invalid request: {detail}"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {detail}"))
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::new(INTERNAL_ERROR, format!("Internal error: {detail}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Name and version reported in the `initialize` handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "toolgate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: Value,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResult<'a> {
    pub tools: &'a [ToolDescriptor],
}

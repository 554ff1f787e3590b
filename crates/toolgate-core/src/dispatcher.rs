//! Invocation dispatch
//!
//! [`Dispatcher::dispatch`] is the single entry point every transport uses to
//! run a tool. It never fails: lookup errors, validation errors and tool
//! faults (including panics and timeouts) are all folded into a
//! [`CallToolResult`] with `isError: true` and a single text item.

use crate::content::{EncodedContent, encode};
use crate::descriptor::ToolDescriptor;
use crate::error::{DispatchError, DispatchResult};
use crate::registry::ToolRegistry;
use crate::tool::ToolResult;
use crate::validation::validate;
use futures::FutureExt;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default upper bound on a single tool execution.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A request to run a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }
}

/// Encoded outcome of a dispatched call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<EncodedContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchError>,
}

impl CallToolResult {
    pub fn success(result: &ToolResult) -> Self {
        Self {
            content: encode(result),
            is_error: false,
            error: None,
        }
    }

    pub fn failure(error: DispatchError) -> Self {
        Self {
            content: vec![EncodedContent::Text {
                text: error.to_string(),
            }],
            is_error: true,
            error: Some(error),
        }
    }

    /// Text of the first item, if it is a text item.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(EncodedContent::as_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub execution_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

/// Routes invocations to tools in a shared, read-only registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            config: DispatcherConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.config.execution_timeout = timeout;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        self.registry.list()
    }

    /// Run `request` and encode the outcome.
    pub async fn dispatch(&self, request: InvocationRequest) -> CallToolResult {
        let started = Instant::now();
        let name = request.name.clone();

        match self.try_dispatch(request).await {
            Ok(result) => {
                info!(
                    tool = %name,
                    items = result.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                CallToolResult::success(&result)
            }
            Err(error) => {
                warn!(
                    tool = %name,
                    kind = error.kind(),
                    error = %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call failed"
                );
                CallToolResult::failure(error)
            }
        }
    }

    async fn try_dispatch(&self, request: InvocationRequest) -> DispatchResult<ToolResult> {
        let entry = self
            .registry
            .lookup(&request.name)
            .ok_or_else(|| DispatchError::tool_not_found(&request.name))?;

        let arguments = validate(entry.descriptor().input_schema(), &request.arguments)?;
        debug!(tool = %request.name, arguments = arguments.len(), "Arguments validated");

        let timeout = self.config.execution_timeout;
        let execution = AssertUnwindSafe(entry.tool().execute(arguments)).catch_unwind();

        match tokio::time::timeout(timeout, execution).await {
            Err(_) => Err(DispatchError::execution(format!(
                "timed out after {}",
                humantime::format_duration(timeout)
            ))),
            Ok(Err(panic)) => Err(DispatchError::execution(format!(
                "tool panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Ok(Ok(outcome)) => outcome.map_err(DispatchError::from),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldSchema, InputSchema};
    use crate::error::ToolFailure;
    use crate::tool::{ContentItem, Tool};
    use crate::validation::ValidatedArguments;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTool {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new(
                "count",
                "counts calls",
                InputSchema::builder()
                    .required_property("label", FieldSchema::string())
                    .build()
                    .unwrap(),
            )
        }

        async fn execute(&self, args: ValidatedArguments) -> Result<ToolResult, ToolFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let label = args.get_str("label").unwrap_or_default();
            if label == "fail" {
                return Err(ToolFailure::failed("asked to fail"));
            }
            if label == "panic" {
                panic!("asked to panic");
            }
            if label == "sleep" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(ToolResult::text(label).with(ContentItem::file(
                "x.bin",
                "application/octet-stream",
                vec![0xff],
            )))
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<CountingTool>) {
        let tool = Arc::new(CountingTool::default());
        let registry = ToolRegistry::new().try_with_tool(tool.clone()).unwrap();
        (Dispatcher::new(Arc::new(registry)), tool)
    }

    #[tokio::test]
    async fn test_success_encodes_all_items() {
        let (dispatcher, _) = dispatcher();
        let result = dispatcher
            .dispatch(InvocationRequest::new("count").with_argument("label", "hi"))
            .await;

        assert!(!result.is_error);
        assert_eq!(result.content.len(), 2);
        assert_eq!(result.first_text(), Some("hi"));
        assert_eq!(result.content[1].as_file().unwrap().content, "/w==");
    }

    #[tokio::test]
    async fn test_unknown_tool_never_reaches_tool() {
        let (dispatcher, tool) = dispatcher();
        let result = dispatcher.dispatch(InvocationRequest::new("unknownTool")).await;

        assert!(result.is_error);
        assert_eq!(result.first_text(), Some("未知工具: unknownTool"));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_argument_is_error_result() {
        let (dispatcher, tool) = dispatcher();
        let result = dispatcher.dispatch(InvocationRequest::new("count")).await;

        assert!(result.is_error);
        assert_eq!(result.error, Some(DispatchError::missing("label")));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_execution_failed() {
        let (dispatcher, _) = dispatcher();
        let result = dispatcher
            .dispatch(InvocationRequest::new("count").with_argument("label", "fail"))
            .await;

        assert!(result.is_error);
        assert_eq!(result.content.len(), 1);
        assert!(result.first_text().unwrap().contains("asked to fail"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (dispatcher, _) = dispatcher();
        let result = dispatcher
            .dispatch(InvocationRequest::new("count").with_argument("label", "panic"))
            .await;

        assert!(result.is_error);
        assert_eq!(result.error.as_ref().map(DispatchError::kind), Some("execution_failed"));
        assert!(result.first_text().unwrap().contains("asked to panic"));
    }

    #[tokio::test]
    async fn test_timeout_is_contained() {
        let (dispatcher, _) = dispatcher();
        let dispatcher = dispatcher.with_execution_timeout(Duration::from_millis(20));
        let result = dispatcher
            .dispatch(InvocationRequest::new("count").with_argument("label", "sleep"))
            .await;

        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_repeated_dispatch_is_structurally_identical() {
        let (dispatcher, tool) = dispatcher();
        let request = InvocationRequest::new("count").with_argument("label", "same");
        let first = dispatcher.dispatch(request.clone()).await;
        let second = dispatcher.dispatch(request).await;

        assert_eq!(first, second);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_request_accepts_null_or_missing_arguments() {
        let request: InvocationRequest =
            serde_json::from_value(json!({"name": "count", "arguments": null})).unwrap();
        assert!(request.arguments.is_empty());

        let request: InvocationRequest = serde_json::from_value(json!({"name": "count"})).unwrap();
        assert!(request.arguments.is_empty());

        assert!(
            serde_json::from_value::<InvocationRequest>(json!({"name": "count", "arguments": [1]}))
                .is_err()
        );
    }

    #[test]
    fn test_error_result_wire_shape() {
        let result = CallToolResult::failure(DispatchError::missing("date"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "content": [{"type": "text", "text": "错误：缺少参数 date"}],
                "isError": true,
                "error": {"kind": "missing_arguments", "field": "date"}
            })
        );
    }
}

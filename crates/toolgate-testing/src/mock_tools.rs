//! # Mock Tools for Testing
//!
//! Tool implementations with predictable behavior, for exercising the
//! dispatcher and the transport adapters without real business logic.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolgate_core::{
    ContentItem, FieldSchema, InputSchema, Tool, ToolDescriptor, ToolFailure, ToolResult,
    ValidatedArguments,
};

/// What a [`MockTool`] does when executed
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Echo the `message` argument back as text
    Echo,
    /// Return the given text
    Respond(String),
    /// Return a failure with the given message
    Fail(String),
    /// Panic with the given message
    Panic(String),
    /// Sleep, then echo
    Slow(Duration),
    /// Return a file item with the given bytes
    Binary {
        name: String,
        mime_type: String,
        payload: Vec<u8>,
    },
}

/// A configurable tool that records every call it receives
#[derive(Debug, Clone)]
pub struct MockTool {
    name: String,
    description: String,
    schema: InputSchema,
    behavior: MockBehavior,
    call_count: Arc<Mutex<usize>>,
    call_history: Arc<Mutex<Vec<Map<String, Value>>>>,
}

impl MockTool {
    /// Create a mock tool taking one optional string argument, `message`
    pub fn new(name: impl Into<String>, behavior: MockBehavior) -> Self {
        let schema = InputSchema::builder()
            .property(
                "message",
                FieldSchema::string().with_description("text to echo back"),
            )
            .build()
            .expect("static mock schema is valid");
        Self {
            name: name.into(),
            description: "mock tool".to_string(),
            schema,
            behavior,
            call_count: Arc::new(Mutex::new(0)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn echo(name: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::Echo)
    }

    pub fn responding(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::Respond(text.into()))
    }

    pub fn failing(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::Fail(error.into()))
    }

    pub fn panicking(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::Panic(message.into()))
    }

    pub fn slow(name: impl Into<String>, delay: Duration) -> Self {
        Self::new(name, MockBehavior::Slow(delay))
    }

    pub fn binary(name: impl Into<String>, file_name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self::new(
            name,
            MockBehavior::Binary {
                name: file_name.into(),
                mime_type: "application/octet-stream".to_string(),
                payload,
            },
        )
    }

    /// Replace the input schema
    pub fn with_schema(mut self, schema: InputSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Get the number of times this tool has been executed
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Get the validated `message` arguments seen so far, as JSON objects
    pub fn call_history(&self) -> Vec<Map<String, Value>> {
        self.call_history.lock().unwrap().clone()
    }

    fn record(&self, arguments: &ValidatedArguments) -> String {
        let message = arguments.get_str("message").unwrap_or_default().to_string();
        let mut entry = Map::new();
        if arguments.contains("message") {
            entry.insert("message".to_string(), Value::String(message.clone()));
        }
        *self.call_count.lock().unwrap() += 1;
        self.call_history.lock().unwrap().push(entry);
        message
    }
}

#[async_trait]
impl Tool for MockTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(&self.name, &self.description, self.schema.clone())
    }

    async fn execute(&self, arguments: ValidatedArguments) -> Result<ToolResult, ToolFailure> {
        let message = self.record(&arguments);

        match &self.behavior {
            MockBehavior::Echo => Ok(ToolResult::text(message)),
            MockBehavior::Respond(text) => Ok(ToolResult::text(text.clone())),
            MockBehavior::Fail(error) => Err(ToolFailure::failed(error.clone())),
            MockBehavior::Panic(text) => panic!("{text}"),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(ToolResult::text(message))
            }
            MockBehavior::Binary {
                name,
                mime_type,
                payload,
            } => Ok(ToolResult::new(ContentItem::file(
                name.clone(),
                mime_type.clone(),
                payload.clone(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_core::validate;

    fn arguments(message: &str) -> ValidatedArguments {
        let mut map = Map::new();
        map.insert("message".into(), Value::String(message.into()));
        validate(MockTool::echo("x").descriptor().input_schema(), &map).unwrap()
    }

    #[tokio::test]
    async fn test_echo_records_calls() {
        let tool = MockTool::echo("echo");
        let result = tool.execute(arguments("hello")).await.unwrap();

        assert_eq!(result.first(), &ContentItem::text("hello"));
        assert_eq!(tool.call_count(), 1);
        assert_eq!(tool.call_history()[0]["message"], "hello");
    }

    #[tokio::test]
    async fn test_responding_tool_ignores_message() {
        let tool = MockTool::responding("status", "ok").with_description("reports status");
        let result = tool.execute(arguments("ignored")).await.unwrap();

        assert_eq!(result.first(), &ContentItem::text("ok"));
        assert_eq!(tool.descriptor().description(), "reports status");
        assert_eq!(tool.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_tool() {
        let tool = MockTool::failing("bad", "nope");
        let err = tool.execute(arguments("x")).await.unwrap_err();
        assert_eq!(err, ToolFailure::failed("nope"));
    }

    #[tokio::test]
    async fn test_clones_share_call_tracking() {
        let tool = MockTool::echo("echo");
        let clone = tool.clone();
        clone.execute(arguments("a")).await.unwrap();
        assert_eq!(tool.call_count(), 1);
    }
}

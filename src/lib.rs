//! # Toolgate
//!
//! A small tool server: tools describe their arguments with a JSON schema,
//! and a single dispatcher validates and executes calls arriving over
//! newline-delimited JSON-RPC on stdio or over HTTP.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`dispatch`]: registry, argument validation, content encoding, dispatcher
//! - [`tools`]: the built-in tools (`downloadReport`)
//! - [`mcp`]: JSON-RPC protocol handling and the stdio session loop
//! - [`http`]: Axum endpoints, SSE push stream, configuration
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toolgate::{Dispatcher, InvocationRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new(Arc::new(toolgate::tools::default_registry()?));
//! let result = dispatcher
//!     .dispatch(InvocationRequest::new("downloadReport").with_argument("date", "2025-12-04"))
//!     .await;
//! assert!(!result.is_error);
//! # Ok(())
//! # }
//! ```

pub use toolgate_core as dispatch;
pub use toolgate_http as http;
pub use toolgate_mcp as mcp;
pub use toolgate_tools as tools;

pub use toolgate_core::{
    CallToolResult, ContentItem, DispatchError, Dispatcher, InputSchema, InvocationRequest, Tool,
    ToolDescriptor, ToolFailure, ToolRegistry, ToolResult, ValidatedArguments,
};
pub use toolgate_http::{HttpServer, ServerConfig, ServerConfigBuilder};
pub use toolgate_mcp::{McpHandler, McpServer};

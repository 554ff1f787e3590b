//! # Toolgate MCP - JSON-RPC tool transport
//!
//! Exposes a [`toolgate_core::Dispatcher`] over newline-delimited JSON-RPC 2.0,
//! the framing used by MCP clients that launch a server as a child process.
//!
//! ## Features
//!
//! - **Handshake**: `initialize` and `ping`
//! - **Tools**: `tools/list` and `tools/call`, plus the `listTools` /
//!   `callTool` aliases
//! - **Notifications**: accepted and never answered
//! - **Concurrency**: sequential by default, bounded overlap on request
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toolgate_core::{Dispatcher, ToolRegistry};
//! use toolgate_mcp::McpServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::new()));
//!     let server = McpServer::new(dispatcher);
//!     server.serve_stdio(std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handler;
pub mod protocol;
pub mod server;

pub use error::{McpError, McpResult};
pub use handler::McpHandler;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo};
pub use server::{DEFAULT_MAX_LINE_BYTES, McpServer, SessionEnd, StdioConfig};

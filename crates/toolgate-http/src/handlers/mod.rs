//! Route handlers

pub mod health;
pub mod mcp;
pub mod push;
pub mod tools;

pub use health::health_check;
pub use mcp::json_rpc;
pub use push::{Acknowledgement, PushEvent, event_stream, receive_message};
pub use tools::{ToolListResponse, call_tool, list_tools};

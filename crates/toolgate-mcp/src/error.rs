//! Error types for the JSON-RPC transport

use thiserror::Error;

/// Result type for transport operations
pub type McpResult<T> = Result<T, McpError>;

/// Errors that end a transport session.
///
/// Protocol-level problems (bad JSON, unknown methods) never surface here;
/// they are answered in-band as JSON-RPC error objects.
#[derive(Debug, Error)]
pub enum McpError {
    /// Reading from or writing to the channel failed
    #[error("I/O error on transport: {0}")]
    Io(#[from] std::io::Error),

    /// A response could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A background task of the transport failed
    #[error("Transport task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for McpError {
    fn from(err: tokio::task::JoinError) -> Self {
        McpError::Task(err.to_string())
    }
}

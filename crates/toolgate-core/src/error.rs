//! Error types for the dispatch core
//!
//! [`DispatchError`] is the taxonomy every failed invocation is reduced to.
//! Its `Display` output is the user-facing text placed in the error result's
//! text item, so it is written for the remote caller rather than for logs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Reasons an invocation can fail before, during or after tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchError {
    /// No tool is registered under the requested name
    #[error("未知工具: {name}")]
    ToolNotFound { name: String },

    /// A required argument was absent, null or empty
    #[error("错误：缺少参数 {field}")]
    MissingArguments { field: String },

    /// An argument was present but had the wrong type or format
    #[error("错误：参数 {field} {reason}")]
    ValidationFailed { field: String, reason: String },

    /// The tool itself failed, panicked or timed out
    #[error("执行工具失败: {cause}")]
    ExecutionFailed { cause: String },
}

impl DispatchError {
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingArguments {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn execution(cause: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            cause: cause.into(),
        }
    }

    /// Stable snake_case identifier, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::MissingArguments { .. } => "missing_arguments",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::ExecutionFailed { .. } => "execution_failed",
        }
    }

    /// Argument name the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingArguments { field } | Self::ValidationFailed { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Failure reported by a tool implementation.
///
/// Converted into [`DispatchError`] at the executor boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolFailure {
    /// The arguments passed schema validation but the tool rejected them
    #[error("argument '{field}' rejected: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// Any other failure while producing output
    #[error("{0}")]
    Failed(String),
}

impl ToolFailure {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<ToolFailure> for DispatchError {
    fn from(failure: ToolFailure) -> Self {
        match failure {
            ToolFailure::InvalidArgument { field, reason } => {
                DispatchError::ValidationFailed { field, reason }
            }
            ToolFailure::Failed(cause) => DispatchError::ExecutionFailed { cause },
        }
    }
}

/// Errors raised while building an input schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required field '{0}' is not a declared property")]
    UndeclaredRequired(String),

    #[error("property '{0}' is declared more than once")]
    DuplicateProperty(String),

    #[error("invalid pattern for property '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while building a tool registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("tool name must not be empty")]
    EmptyName,
}

/// Errors raised when decoding an encoded content item
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("unsupported file encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

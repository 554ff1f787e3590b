//! # Toolgate Core
//!
//! Transport-independent pieces of the Toolgate tool server:
//!
//! - **Registry**: an ordered, name-unique set of tools built once at startup
//! - **Validation**: two-pass checking of JSON arguments against a tool's schema
//! - **Content encoding**: text and base64 file items in a wire-neutral form
//! - **Dispatcher**: the single call path every transport adapter goes through
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolgate_core::{Dispatcher, InvocationRequest, ToolRegistry};
//!
//! let registry = ToolRegistry::new().try_with_tool(Arc::new(MyTool))?;
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! let result = dispatcher
//!     .dispatch(InvocationRequest::new("myTool").with_argument("date", "2025-12-04"))
//!     .await;
//! assert!(!result.is_error);
//! ```

pub mod content;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod tool;
pub mod validation;

pub use content::{EncodedContent, EncodedFile, decode_item, encode, encode_item};
pub use descriptor::{FieldSchema, FieldType, InputSchema, InputSchemaBuilder, ToolDescriptor};
pub use dispatcher::{
    CallToolResult, DEFAULT_EXECUTION_TIMEOUT, Dispatcher, DispatcherConfig, InvocationRequest,
};
pub use error::{
    ContentError, DispatchError, DispatchResult, RegistryError, SchemaError, ToolFailure,
};
pub use registry::{RegisteredTool, ToolRegistry};
pub use tool::{ContentItem, Tool, ToolResult};
pub use validation::{ArgumentValue, ValidatedArguments, validate};

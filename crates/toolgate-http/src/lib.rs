//! # Toolgate HTTP
//!
//! Axum front end for a [`toolgate_core::Dispatcher`].
//!
//! ## Endpoints
//!
//! | Method | Path          | Purpose                                         |
//! |--------|---------------|-------------------------------------------------|
//! | GET    | `/health`     | Liveness, version and tool count                |
//! | GET    | `/tools`      | Tool descriptors                                |
//! | POST   | `/tools/call` | Invoke a tool, `{name, arguments}`              |
//! | POST   | `/mcp`        | One JSON-RPC message, same methods as stdio     |
//! | GET    | `/sse`        | Event stream: `connected`, then heartbeats      |
//! | POST   | `/messages`   | Side-channel submissions, acknowledged only     |

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod shutdown;

pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
pub use error::{ErrorCode, ErrorResponse, HttpError, HttpResult};
pub use handlers::{Acknowledgement, PushEvent};
pub use server::{AppState, HttpServer};
pub use shutdown::shutdown_signal;

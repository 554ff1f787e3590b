//! HTTP server: shared state, router assembly and serving

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::watch;
use toolgate_core::Dispatcher;
use toolgate_mcp::{McpHandler, ServerInfo};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{HttpError, HttpResult};
use crate::handlers::{
    call_tool, event_stream, health_check, json_rpc, list_tools, receive_message,
};

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub mcp: Arc<McpHandler>,
    pub heartbeat_interval: Duration,
    pub started: Instant,
    /// Flips to `true` when the server begins shutting down
    pub shutdown: watch::Receiver<bool>,
}

/// HTTP front end over a [`Dispatcher`]
#[derive(Debug, Clone)]
pub struct HttpServer {
    state: AppState,
    config: ServerConfig,
    shutdown: Arc<watch::Sender<bool>>,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        let server_info = ServerInfo {
            name: config.server_name.clone(),
            ..ServerInfo::default()
        };
        let mcp = McpHandler::new(dispatcher.clone()).with_server_info(server_info);
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self {
            state: AppState {
                dispatcher,
                mcp: Arc::new(mcp),
                heartbeat_interval: config.heartbeat_interval,
                started: Instant::now(),
                shutdown: shutdown_rx,
            },
            config,
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Create the Axum router with all endpoints and middleware
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_check))
            .route("/tools", get(list_tools))
            .route("/tools/call", post(call_tool))
            .route("/mcp", post(json_rpc))
            .route("/sse", get(event_stream))
            .route("/messages", post(receive_message))
            .with_state(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    ///
    /// Event streams are closed when shutdown begins so that graceful
    /// draining of the remaining connections can complete.
    pub async fn serve<S>(self, shutdown: S) -> HttpResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HttpError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_listener<S>(self, listener: TcpListener, shutdown: S) -> HttpResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr().map_err(HttpError::Serve)?;
        info!(
            address = %local_addr,
            tools = self.state.dispatcher.list_tools().len(),
            heartbeat = %humantime::format_duration(self.config.heartbeat_interval),
            "HTTP server starting"
        );

        let stop = Arc::clone(&self.shutdown);
        let shutdown = async move {
            shutdown.await;
            stop.send_replace(true);
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(HttpError::Serve)?;

        info!("HTTP server stopped");
        Ok(())
    }
}

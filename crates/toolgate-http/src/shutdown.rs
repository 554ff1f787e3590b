//! Process signal handling
//!
//! Both transports stop on SIGINT or SIGTERM. The HTTP server passes
//! [`shutdown_signal`] to axum's graceful shutdown; the stdio session races it
//! against the next input line.

use tokio::signal;
use tracing::{error, info};

/// Signals that end a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    Interrupt,
    Terminate,
}

impl StopSignal {
    fn name(self) -> &'static str {
        match self {
            StopSignal::Interrupt => "SIGINT",
            StopSignal::Terminate => "SIGTERM",
        }
    }
}

/// Resolves once SIGINT or SIGTERM arrives.
///
/// A handler that cannot be installed is logged and never fires.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use toolgate_core::Dispatcher;
/// use toolgate_http::shutdown_signal;
/// use toolgate_mcp::McpServer;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = toolgate_tools::default_registry()?;
/// let server = McpServer::new(Dispatcher::new(Arc::new(registry)));
/// let end = server.serve_stdio(shutdown_signal()).await?;
/// println!("session ended: {end:?}");
/// # Ok(())
/// # }
/// ```
pub async fn shutdown_signal() {
    let received = tokio::select! {
        _ = interrupt() => StopSignal::Interrupt,
        _ = terminate() => StopSignal::Terminate,
    };
    info!(signal = received.name(), "Shutdown requested");
}

async fn interrupt() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "Cannot listen for SIGINT");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            error!(error = %err, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use toolgate_core::{Dispatcher, ToolRegistry};
use toolgate_http::{ConfigError, HttpError, HttpServer, ServerConfig, ServerConfigBuilder};
use toolgate_mcp::{McpError, McpHandler, McpServer, ServerInfo, SessionEnd, StdioConfig};
use toolgate_tools::ToolsetError;

#[derive(Parser, Debug)]
#[command(name = "toolgate", version)]
#[command(about = "Toolgate - schema-described tools over JSON-RPC stdio, HTTP and SSE")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve newline-delimited JSON-RPC on stdin/stdout
    Stdio {
        /// Maximum number of requests executed concurrently (1 = strictly sequential)
        #[arg(long)]
        max_in_flight: Option<usize>,
    },
    /// Serve the HTTP and SSE endpoints
    Http {
        /// Listen address, e.g. 127.0.0.1:8080
        #[arg(long)]
        bind: Option<String>,
        /// Interval between SSE heartbeats, e.g. 30s
        #[arg(long, value_parser = humantime::parse_duration)]
        heartbeat_interval: Option<Duration>,
    },
    /// Print the registered tool descriptors as JSON
    ListTools,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Toolset(#[from] ToolsetError),

    #[error(transparent)]
    Stdio(#[from] McpError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Failed to encode tool list: {0}")]
    Encode(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries protocol traffic in stdio mode.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Stdio { max_in_flight } => run_stdio(max_in_flight).await,
        Commands::Http {
            bind,
            heartbeat_interval,
        } => run_http(bind, heartbeat_interval).await,
        Commands::ListTools => list_tools(),
    };

    if let Err(e) = outcome {
        tracing::error!(error = %e, "toolgate exited with an error");
        std::process::exit(1);
    }
}

fn build_dispatcher(config: &ServerConfig) -> Result<Dispatcher, CliError> {
    let registry: ToolRegistry = toolgate_tools::default_registry()?;
    Ok(Dispatcher::new(Arc::new(registry)).with_execution_timeout(config.tool_timeout))
}

async fn run_stdio(max_in_flight: Option<usize>) -> Result<(), CliError> {
    let mut builder = ServerConfigBuilder::from_env()?;
    if let Some(max_in_flight) = max_in_flight {
        builder = builder.max_in_flight(max_in_flight);
    }
    let config = builder.build()?;
    let dispatcher = build_dispatcher(&config)?;

    let handler = McpHandler::new(dispatcher).with_server_info(ServerInfo {
        name: config.server_name.clone(),
        ..ServerInfo::default()
    });
    let server = McpServer::from_handler(handler).with_config(StdioConfig {
        max_in_flight: config.max_in_flight,
        max_line_bytes: config.max_body_size,
    });

    let end = server.serve_stdio(toolgate_http::shutdown_signal()).await?;
    match end {
        SessionEnd::Eof => tracing::info!("Input closed, stdio session finished"),
        SessionEnd::Shutdown => tracing::info!("Stdio session stopped by signal"),
        SessionEnd::OutputClosed => tracing::warn!("Output closed, stdio session abandoned"),
    }
    Ok(())
}

async fn run_http(
    bind: Option<String>,
    heartbeat_interval: Option<Duration>,
) -> Result<(), CliError> {
    let mut builder = ServerConfigBuilder::from_env()?;
    if let Some(bind) = bind {
        builder = builder.bind(bind);
    }
    if let Some(interval) = heartbeat_interval {
        builder = builder.heartbeat_interval(interval);
    }
    let config = builder.build()?;
    let dispatcher = build_dispatcher(&config)?;

    HttpServer::new(dispatcher, config)
        .serve(toolgate_http::shutdown_signal())
        .await?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

fn list_tools() -> Result<(), CliError> {
    let registry = toolgate_tools::default_registry()?;
    println!("{}", serde_json::to_string_pretty(registry.list())?);
    Ok(())
}

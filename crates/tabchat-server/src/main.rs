//! Tabchat server - HTTP/WebSocket server for chatting with tabular data.

use anyhow::Result;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tabchat_server::{config, logging, routes, state};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Tabchat server - chat with an uploaded dataset through a completion endpoint.
#[derive(Parser, Debug)]
#[command(name = "tabchat-server")]
#[command(about = "HTTP/WebSocket server for chatting with tabular data")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (DEBUG level)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "completion=debug").
    /// Can be specified multiple times. Targets are prefixed with "tabchat::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(
        target: "tabchat::startup",
        "Loaded configuration (port: {}, endpoint: {})",
        config.port,
        config.endpoint_url
    );
    if config.enable_code_execution {
        tracing::warn!(
            target: "tabchat::startup",
            "Code execution is ENABLED; model-generated code will run via {}",
            config.code_command.display()
        );
    }

    let host = config.host.clone();
    let port = config.port;
    let state = Arc::new(AppState::new(config));
    tracing::info!(target: "tabchat::startup", "Initialized application state");

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!(target: "tabchat::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Session management
        .route("/sessions", get(routes::sessions::list))
        .route("/sessions", post(routes::sessions::create))
        .route("/sessions/{id}", get(routes::sessions::get))
        .route("/sessions/{id}", delete(routes::sessions::delete))
        .route("/sessions/{id}/reset", post(routes::sessions::reset))
        .route("/sessions/{id}/credential", put(routes::sessions::set_credential))
        // Dataset upload
        .route("/sessions/{id}/dataset", post(routes::upload::upload))
        .route("/sessions/{id}/dataset", get(routes::upload::get_dataset))
        // Conversation
        .route("/sessions/{id}/messages", post(routes::chat::post_message))
        // Charts
        .route("/sessions/{id}/charts", post(routes::charts::create_chart))
        .route("/health", get(routes::health));

    let ws_routes = Router::new().route("/sessions/{id}", get(routes::ws::upgrade));

    Router::new()
        .nest("/api", api_routes)
        .nest("/ws", ws_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

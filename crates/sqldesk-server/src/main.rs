//! SQLDesk HTTP Server
//!
//! Runs SQL queries and introspection calls against user-supplied databases
//! and keeps a per-query history and archive.

use anyhow::Result;
use sqldesk_server::api;
use sqldesk_server::config::{LogFormat, ServerConfig};
use sqldesk_server::state;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first: it selects the log format
    let config = ServerConfig::load()?;

    init_tracing(&config)?;
    info!("Loaded configuration: {:?}", config);

    let state = state::init_state(&config).await?;
    info!("Service state initialized");

    let app = api::create_router(state);

    let addr = config.bind_address();
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Query API: POST http://{}/v1/query", addr);
    info!("  History: GET http://{}/v1/history", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "sqldesk_server={level},sqldesk_runtime={level},tower_http=debug",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

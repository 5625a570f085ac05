use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use nlquery::api;
use nlquery::config::Config;
use nlquery::services::{create_adapter, NlQueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Open the data source
    let source_type = config.source_type()?;
    let adapter = create_adapter(source_type, &config.source.path).map_err(|e| {
        error!("Failed to open {} source {}: {}", source_type.as_str(), config.source.path, e);
        e
    })?;
    info!("Serving {} source {}", source_type.as_str(), config.source.path);

    let service = Arc::new(NlQueryService::new(adapter, config.source.table.clone()));

    // Create router with state
    let app: Router = api::routes::create_router_with_state(service, config.clone());

    // Start server
    let addr: SocketAddr = config
        .server_address()
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server_address()))?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

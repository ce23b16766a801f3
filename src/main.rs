use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lipsync_gateway::app_state::AppState;
use lipsync_gateway::config::AppConfig;
use lipsync_gateway::routes;
use lipsync_gateway::services::providers;
use lipsync_gateway::services::storage::{BlobStore, S3BlobStore};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing lipsync-gateway");

    let prometheus_handle =
        routes::metrics::install_recorder().expect("Failed to install Prometheus metrics recorder");

    tracing::info!("Initializing object storage client");
    let storage = S3BlobStore::from_config(&config).expect("Failed to initialize object storage");

    let provider =
        providers::from_config(&config).expect("Failed to initialize generation provider");

    tracing::info!(
        storage_configured = storage.is_configured(),
        provider = provider.id(),
        provider_configured = provider.is_configured(),
        mode = config.response_mode.as_str(),
        poll_interval_secs = config.poll_interval_secs,
        poll_max_attempts = config.poll_max_attempts,
        "Services configured"
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, Arc::new(storage), provider);
    let app = routes::metrics::with_scrape_route(routes::router(state), prometheus_handle);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

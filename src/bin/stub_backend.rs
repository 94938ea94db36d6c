use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use clippyio_client::config::StubConfig;
use clippyio_client::stub::{self, routes, StubState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = StubConfig::from_env()?;

    tracing::info!(
        polls_until_done = config.polls_until_done,
        public_base = %config.public_base,
        "Initializing ClippyIO stub backend"
    );

    let prometheus_handle = Arc::new(PrometheusBuilder::new().install_recorder()?);

    let state = StubState::new(config.polls_until_done, &config.public_base);
    let app = stub::router(state).route(
        "/metrics",
        get(routes::prometheus_metrics).with_state(prometheus_handle),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Stub backend listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

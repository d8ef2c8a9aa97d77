use std::sync::Arc;

use tracing::info;

use medirag_gateway::api;
use medirag_gateway::backend::{BackendClient, HttpTransport};
use medirag_gateway::config::Config;
use medirag_gateway::metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!("Starting Medical RAG gateway");

    let metrics = Metrics::new()?;
    let transport = HttpTransport::new(&config.medical_rag_url)?;
    info!("Forwarding to medical RAG service at {}", transport.base_url());

    let backend = BackendClient::new(Arc::new(transport), config.timeouts, metrics.clone());
    let routes = api::app(backend, metrics);

    // Start server
    let addr = ([0, 0, 0, 0], config.port);
    let (bound, server) = warp::serve(routes).try_bind_with_graceful_shutdown(addr, async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
    })?;
    info!("Server listening on {}", bound);

    server.await;

    Ok(())
}

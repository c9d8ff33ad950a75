//! Docgate server binary

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docgate::api::{create_router, AppState};
use docgate::backend::{create_backend, BackendConfig};
use docgate::config::{AppConfig, LogFormat};
use docgate::gateway::DocumentGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config)?;

    let gateway_config = config
        .gateway_runtime()
        .context("invalid gateway configuration")?;
    let backend_config = config
        .backend_runtime()
        .context("invalid backend configuration")?;

    match &backend_config {
        BackendConfig::Elasticsearch(es) => {
            tracing::info!(url = %es.url, index = %gateway_config.index, "Using Elasticsearch backend")
        }
        BackendConfig::Memory { index, .. } => {
            tracing::info!(%index, "Using in-memory backend")
        }
    }

    let backend = create_backend(backend_config)
        .await
        .context("failed to initialise search backend")?;

    let gateway = Arc::new(DocumentGateway::new(
        backend,
        gateway_config,
        tokio::runtime::Handle::current(),
    ));

    let router = create_router(AppState::new(gateway));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "Listening for HTTP traffic");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("docgate=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    Ok(())
}

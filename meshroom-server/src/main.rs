use anyhow::{Context, Result};
use meshroom_server::{AppState, ServerConfig, build_router};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    info!(
        ice_servers = config.ice_servers.len(),
        cors_origin = %config.cors_origin,
        "Initializing signaling relay..."
    );

    let state = Arc::new(AppState::new(&config));
    let app = build_router(state, &config.cors_origin)?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Signaling relay listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
